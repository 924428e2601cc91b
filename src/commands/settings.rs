// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::context::UserContext;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};
use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;
use rust_decimal::Decimal;

pub fn handle(conn: &Connection, ctx: &UserContext, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", sub)) => {
            let cfg = ctx.load_config(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &cfg)? {
                println!(
                    "{}",
                    pretty_table(
                        &["User", "Nickname", "Avatar", "Starting balance"],
                        vec![vec![
                            ctx.username.clone(),
                            cfg.nickname.clone().unwrap_or_default(),
                            cfg.avatar.clone().unwrap_or_default(),
                            fmt_money(&cfg.init_balance),
                        ]],
                    )
                );
            }
        }
        Some(("balance", sub)) => {
            let raw = sub.get_one::<String>("amount").unwrap();
            let amount = set_init_balance(conn, ctx, raw)?;
            println!("Starting balance set to {}", fmt_money(&amount));
        }
        Some(("profile", sub)) => {
            let nickname = sub.get_one::<String>("nickname").map(String::as_str);
            let avatar = sub.get_one::<String>("avatar").map(String::as_str);
            set_profile(conn, ctx, nickname, avatar)?;
            println!("Profile updated for '{}'", ctx.username);
        }
        Some(("export", sub)) => {
            let out = sub.get_one::<String>("out").unwrap().trim();
            let cfg = ctx.load_config(conn)?;
            std::fs::write(out, serde_json::to_string_pretty(&cfg)?)
                .with_context(|| format!("Write {}", out))?;
            println!("Exported config to {}", out);
        }
        _ => {}
    }
    Ok(())
}

/// Starting balance may carry either sign.
pub fn set_init_balance(conn: &Connection, ctx: &UserContext, raw: &str) -> Result<Decimal> {
    let amount = raw
        .trim()
        .replace(',', "")
        .parse::<Decimal>()
        .with_context(|| format!("Invalid balance '{}'", raw))?;
    let mut cfg = ctx.load_config(conn)?;
    cfg.init_balance = amount;
    ctx.save_config(conn, &cfg)?;
    log::info!("starting balance for '{}' = {}", ctx.username, amount);
    Ok(amount)
}

/// Blank values clear the field; `None` leaves it unchanged.
pub fn set_profile(
    conn: &Connection,
    ctx: &UserContext,
    nickname: Option<&str>,
    avatar: Option<&str>,
) -> Result<()> {
    let mut cfg = ctx.load_config(conn)?;
    if let Some(n) = nickname {
        let n = n.trim();
        cfg.nickname = (!n.is_empty()).then(|| n.to_string());
    }
    if let Some(a) = avatar {
        let a = a.trim();
        if a.chars().count() > 8 {
            return Err(anyhow!("Avatar must be a single glyph, got '{}'", a));
        }
        cfg.avatar = (!a.is_empty()).then(|| a.to_string());
    }
    ctx.save_config(conn, &cfg)?;
    Ok(())
}
