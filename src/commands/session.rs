// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::auth;
use crate::config::AppConfig;
use crate::context::{self, UserContext};
use anyhow::{Context, Result, anyhow};
use chrono::{Duration, Utc};
use rusqlite::Connection;
use std::fs;

const SHORT_SESSION_HOURS: i64 = 12;

pub fn handle(conn: &Connection, cfg: &AppConfig, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("register", sub)) => {
            let username = sub.get_one::<String>("username").unwrap().trim();
            let password = sub.get_one::<String>("password").unwrap();
            auth::register(conn, username, password, cfg.pbkdf2_iterations)?;
            println!("Registered '{}'; log in with `tallybook auth login {}`", username, username);
        }
        Some(("login", sub)) => {
            let username = sub.get_one::<String>("username").unwrap().trim();
            let password = sub.get_one::<String>("password").unwrap();
            let remember = sub.get_flag("remember");
            login(conn, cfg, username, password, remember)?;
            println!("Logged in as '{}'", username);
        }
        Some(("logout", _)) => match logout(conn, cfg)? {
            Some(user) => println!("Logged out '{}'", user),
            None => println!("No active session"),
        },
        Some(("whoami", _)) => {
            let ctx = context::resolve(conn, cfg)?;
            let profile = ctx.load_config(conn)?;
            let display = profile.nickname.as_deref().unwrap_or(&ctx.username);
            match profile.avatar.as_deref() {
                Some(a) => println!("{} {} ({})", a, display, ctx.username),
                None => println!("{} ({})", display, ctx.username),
            }
        }
        _ => {}
    }
    Ok(())
}

/// Verify the password and write a signed cookie to the session file.
pub fn login(
    conn: &Connection,
    cfg: &AppConfig,
    username: &str,
    password: &str,
    remember: bool,
) -> Result<String> {
    auth::verify_password(conn, username, password)?;
    let secret = auth::session_secret(conn, cfg.secret.as_deref())?;
    let ttl = if remember {
        Duration::try_days(cfg.session_days)
            .ok_or_else(|| anyhow!("Session length of {} days is out of range", cfg.session_days))?
    } else {
        Duration::hours(SHORT_SESSION_HOURS)
    };
    let cookie = auth::issue_session(conn, &secret, username, ttl, Utc::now())?;
    fs::create_dir_all(&cfg.data_dir)
        .with_context(|| format!("Failed to create data dir {}", cfg.data_dir.display()))?;
    let path = cfg.session_path();
    fs::write(&path, &cookie).with_context(|| format!("Write session file {}", path.display()))?;
    Ok(cookie)
}

/// Revoke the stored token and drop the session file. A rejected cookie
/// is still removed so the local ledger becomes reachable again.
pub fn logout(conn: &Connection, cfg: &AppConfig) -> Result<Option<String>> {
    let path = cfg.session_path();
    if !path.exists() {
        return Ok(None);
    }
    let user = match context::resolve(conn, cfg) {
        Ok(UserContext { username }) => {
            auth::revoke_session(conn, &username)?;
            Some(username)
        }
        Err(e) => {
            log::warn!("discarding unusable session file: {:#}", e);
            None
        }
    };
    fs::remove_file(&path).with_context(|| format!("Remove session file {}", path.display()))?;
    Ok(user)
}
