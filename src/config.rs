// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Tallybook", "tallybook"));

pub const DEFAULT_SESSION_DAYS: i64 = 30;
pub const MAX_SESSION_DAYS: i64 = 36_500;
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    /// Cookie-signing secret; generated and stored in the database when unset.
    pub secret: Option<String>,
    pub session_days: i64,
    pub pbkdf2_iterations: u32,
}

impl AppConfig {
    /// Resolve from the global CLI flags, falling back to the environment and
    /// then to platform defaults.
    pub fn from_matches(m: &clap::ArgMatches) -> Result<Self> {
        let data_dir = match m.get_one::<String>("home") {
            Some(h) => PathBuf::from(h.trim()),
            None => default_data_dir()?,
        };
        let secret = std::env::var("TALLYBOOK_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let session_days =
            check_session_days(env_number("TALLYBOOK_SESSION_DAYS", DEFAULT_SESSION_DAYS)?)?;
        let pbkdf2_iterations = env_number("TALLYBOOK_PBKDF2_ITERATIONS", DEFAULT_PBKDF2_ITERATIONS)?;
        Ok(AppConfig {
            data_dir,
            secret,
            session_days,
            pbkdf2_iterations: pbkdf2_iterations.max(1),
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("tallybook.sqlite")
    }

    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.cookie")
    }
}

pub fn check_session_days(days: i64) -> Result<i64> {
    if !(1..=MAX_SESSION_DAYS).contains(&days) {
        return Err(anyhow!(
            "TALLYBOOK_SESSION_DAYS must be between 1 and {}, got {}",
            MAX_SESSION_DAYS,
            days
        ));
    }
    Ok(days)
}

fn env_number<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid {} '{}'", key, v)),
        _ => Ok(default),
    }
}

pub fn default_data_dir() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    Ok(proj.data_dir().to_path_buf())
}
