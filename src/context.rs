// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::auth;
use crate::config::AppConfig;
use crate::db::LOCAL_USER;
use crate::models::UserConfig;
use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use std::fs;

/// Whose ledger a command operates on. Every handler receives one
/// explicitly; nothing is cached between invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    pub username: String,
}

impl UserContext {
    pub fn new(username: impl Into<String>) -> Self {
        UserContext {
            username: username.into(),
        }
    }

    pub fn local() -> Self {
        UserContext::new(LOCAL_USER)
    }

    pub fn is_local(&self) -> bool {
        self.username == LOCAL_USER
    }

    pub fn load_config(&self, conn: &Connection) -> Result<UserConfig> {
        let raw: String = conn
            .query_row(
                "SELECT config FROM users WHERE username=?1",
                params![self.username],
                |r| r.get(0),
            )
            .with_context(|| format!("User '{}' not found", self.username))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid stored config for '{}'", self.username))
    }

    pub fn save_config(&self, conn: &Connection, cfg: &UserConfig) -> Result<()> {
        let raw = serde_json::to_string(cfg)?;
        conn.execute(
            "UPDATE users SET config=?1 WHERE username=?2",
            params![raw, self.username],
        )?;
        Ok(())
    }
}

/// The session file's user when one is present and valid, else the local
/// ledger. A present but rejected cookie is an error, never a silent
/// fallback.
pub fn resolve(conn: &Connection, cfg: &AppConfig) -> Result<UserContext> {
    let path = cfg.session_path();
    if !path.exists() {
        return Ok(UserContext::local());
    }
    let cookie = fs::read_to_string(&path)
        .with_context(|| format!("Read session file {}", path.display()))?;
    let secret = auth::session_secret(conn, cfg.secret.as_deref())?;
    let username = auth::verify_cookie(conn, &secret, &cookie, chrono::Utc::now())?;
    Ok(UserContext::new(username))
}
