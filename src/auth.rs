// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Salted password hashes and signed remember-me cookies.
//!
//! A cookie reads `username|token|signature`. The signature is an
//! HMAC-SHA256 over `username|token` keyed by the server secret; the
//! database keeps only a SHA-256 of the token.

use crate::error::AuthError;
use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use rusqlite::{Connection, OptionalExtension, params};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const SALT_LEN: usize = 16;
const TOKEN_LEN: usize = 32;
const MAX_USERNAME_CHARS: usize = 32;
const SECRET_KEY: &str = "session_secret";

pub fn validate_username(name: &str) -> Result<(), AuthError> {
    let n = name.chars().count();
    if n == 0 || n > MAX_USERNAME_CHARS || name.contains('|') || name.chars().any(char::is_whitespace)
    {
        return Err(AuthError::InvalidUsername(name.to_string()));
    }
    Ok(())
}

fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// PBKDF2-HMAC-SHA256 with a 32-byte output.
pub fn hash_password(password: &str, salt: &[u8], iterations: u32) -> [u8; 32] {
    let mut out = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    out
}

fn token_digest(raw_token: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(raw_token.as_bytes()))
}

pub fn sign(secret: &[u8], payload: &str) -> Result<String> {
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|e| anyhow!("cookie key: {}", e))?;
    mac.update(payload.as_bytes());
    Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

fn verify_signature(secret: &[u8], payload: &str, sig: &str) -> Result<bool> {
    let Ok(expected) = URL_SAFE_NO_PAD.decode(sig) else {
        return Ok(false);
    };
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|e| anyhow!("cookie key: {}", e))?;
    mac.update(payload.as_bytes());
    Ok(mac.verify_slice(&expected).is_ok())
}

/// Secret from config, else the one stored in `settings`, else a fresh one
/// persisted for later runs.
pub fn session_secret(conn: &Connection, configured: Option<&str>) -> Result<Vec<u8>> {
    if let Some(s) = configured {
        return Ok(s.as_bytes().to_vec());
    }
    let stored: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![SECRET_KEY],
            |r| r.get(0),
        )
        .optional()?;
    let encoded = match stored {
        Some(s) => s,
        None => {
            let fresh = URL_SAFE_NO_PAD.encode(random_bytes::<32>());
            conn.execute(
                "INSERT INTO settings(key, value) VALUES(?1, ?2)
                 ON CONFLICT(key) DO NOTHING",
                params![SECRET_KEY, fresh],
            )?;
            conn.query_row(
                "SELECT value FROM settings WHERE key=?1",
                params![SECRET_KEY],
                |r| r.get(0),
            )?
        }
    };
    URL_SAFE_NO_PAD
        .decode(encoded.as_bytes())
        .context("Stored session secret is corrupt")
}

pub fn register(conn: &Connection, username: &str, password: &str, iterations: u32) -> Result<()> {
    validate_username(username)?;
    if password.is_empty() {
        return Err(AuthError::EmptyPassword.into());
    }
    let exists: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM users WHERE username=?1",
            params![username],
            |r| r.get(0),
        )
        .optional()?;
    if exists.is_some() {
        return Err(AuthError::UserExists(username.to_string()).into());
    }
    let salt = random_bytes::<SALT_LEN>();
    let hash = hash_password(password, &salt, iterations);
    conn.execute(
        "INSERT INTO users(username, password_salt, password_hash, password_iterations)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            username,
            URL_SAFE_NO_PAD.encode(salt),
            URL_SAFE_NO_PAD.encode(hash),
            iterations
        ],
    )?;
    log::info!("registered user '{}'", username);
    Ok(())
}

pub fn verify_password(conn: &Connection, username: &str, password: &str) -> Result<()> {
    let row: Option<(Option<String>, Option<String>, Option<u32>)> = conn
        .query_row(
            "SELECT password_salt, password_hash, password_iterations FROM users WHERE username=?1",
            params![username],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()?;
    let (salt, stored, iterations) = match row {
        Some((Some(s), Some(h), Some(i))) => (s, h, i),
        // Password-less rows (the local ledger) cannot be logged into.
        _ => return Err(AuthError::UnknownUser(username.to_string()).into()),
    };
    let salt = URL_SAFE_NO_PAD
        .decode(salt.as_bytes())
        .with_context(|| format!("Corrupt password salt for '{}'", username))?;
    let stored = URL_SAFE_NO_PAD
        .decode(stored.as_bytes())
        .with_context(|| format!("Corrupt password hash for '{}'", username))?;
    let computed = hash_password(password, &salt, iterations);
    if bool::from(computed.as_slice().ct_eq(stored.as_slice())) {
        Ok(())
    } else {
        Err(AuthError::WrongPassword(username.to_string()).into())
    }
}

/// Issue a fresh token for `username`, replacing any previous session.
pub fn issue_session(
    conn: &Connection,
    secret: &[u8],
    username: &str,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<String> {
    if ttl <= Duration::zero() {
        return Err(anyhow!("Session lifetime must be positive, got {}", ttl));
    }
    let expires = now
        .checked_add_signed(ttl)
        .ok_or_else(|| anyhow!("Session lifetime {} is out of range", ttl))?;
    let raw = URL_SAFE_NO_PAD.encode(random_bytes::<TOKEN_LEN>());
    let updated = conn.execute(
        "UPDATE users SET session_token_hash=?1, session_expires=?2 WHERE username=?3",
        params![token_digest(&raw), expires.to_rfc3339(), username],
    )?;
    if updated == 0 {
        return Err(AuthError::UnknownUser(username.to_string()).into());
    }
    let payload = format!("{}|{}", username, raw);
    let sig = sign(secret, &payload)?;
    log::info!("issued session for '{}' until {}", username, expires);
    Ok(format!("{}|{}", payload, sig))
}

/// Check signature, stored token hash and expiry; returns the username.
pub fn verify_cookie(
    conn: &Connection,
    secret: &[u8],
    cookie: &str,
    now: DateTime<Utc>,
) -> Result<String> {
    let parts: Vec<&str> = cookie.trim().split('|').collect();
    let &[username, raw, sig] = parts.as_slice() else {
        return Err(AuthError::InvalidCookie.into());
    };
    if !verify_signature(secret, &format!("{}|{}", username, raw), sig)? {
        log::warn!("rejected cookie with bad signature for '{}'", username);
        return Err(AuthError::InvalidCookie.into());
    }
    let row: Option<(Option<String>, Option<String>)> = conn
        .query_row(
            "SELECT session_token_hash, session_expires FROM users WHERE username=?1",
            params![username],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;
    let Some((stored, expires)) = row else {
        return Err(AuthError::UnknownUser(username.to_string()).into());
    };
    let Some(stored) = stored else {
        log::warn!("rejected cookie for '{}' with no active session", username);
        return Err(AuthError::InvalidCookie.into());
    };
    if !bool::from(stored.as_bytes().ct_eq(token_digest(raw).as_bytes())) {
        log::warn!("rejected stale cookie for '{}'", username);
        return Err(AuthError::InvalidCookie.into());
    }
    let expires = expires
        .as_deref()
        .and_then(|e| DateTime::parse_from_rfc3339(e).ok())
        .map(|e| e.with_timezone(&Utc));
    match expires {
        Some(e) if e > now => Ok(username.to_string()),
        _ => {
            log::warn!("rejected expired session for '{}'", username);
            Err(AuthError::SessionExpired.into())
        }
    }
}

pub fn revoke_session(conn: &Connection, username: &str) -> Result<()> {
    conn.execute(
        "UPDATE users SET session_token_hash=NULL, session_expires=NULL WHERE username=?1",
        params![username],
    )?;
    log::info!("revoked session for '{}'", username);
    Ok(())
}
