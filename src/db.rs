// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::AppConfig;
use anyhow::{Context, Result};
use rusqlite::Connection;
use std::fs;

/// Owner of the single-user ledger.
pub const LOCAL_USER: &str = "local";

pub fn open_or_init(cfg: &AppConfig) -> Result<Connection> {
    fs::create_dir_all(&cfg.data_dir)
        .with_context(|| format!("Failed to create data dir {}", cfg.data_dir.display()))?;
    let path = cfg.db_path();
    let conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS users(
        username TEXT PRIMARY KEY,
        password_salt TEXT,
        password_hash TEXT,
        password_iterations INTEGER,
        session_token_hash TEXT,
        session_expires TEXT,
        config TEXT NOT NULL DEFAULT '{}',
        next_record_id INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS records(
        username TEXT NOT NULL,
        id INTEGER NOT NULL,
        date TEXT NOT NULL,
        book TEXT NOT NULL,
        category TEXT NOT NULL,
        item TEXT NOT NULL DEFAULT '',
        amount TEXT NOT NULL,
        type TEXT NOT NULL CHECK(type IN ('income','expense')),
        PRIMARY KEY(username, id),
        FOREIGN KEY(username) REFERENCES users(username) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_records_date ON records(username, date);

    CREATE TABLE IF NOT EXISTS budgets(
        username TEXT NOT NULL,
        month TEXT NOT NULL,
        category TEXT NOT NULL,
        type TEXT NOT NULL CHECK(type IN ('income','expense')),
        amount TEXT NOT NULL,
        PRIMARY KEY(username, month, category, type),
        FOREIGN KEY(username) REFERENCES users(username) ON DELETE CASCADE
    );

    INSERT OR IGNORE INTO users(username) VALUES ('local');
    "#,
    )?;
    Ok(())
}
