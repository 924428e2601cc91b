// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use tallybook::{cli, commands, config::AppConfig, context, db};

fn run() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let cfg = AppConfig::from_matches(&matches)?;
    let mut conn = db::open_or_init(&cfg)?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", cfg.db_path().display());
        }
        Some(("auth", sub)) => commands::session::handle(&conn, &cfg, sub)?,
        Some(("category", sub)) => commands::categories::handle(sub)?,
        Some((name, sub)) => {
            let ctx = context::resolve(&conn, &cfg)?;
            log::debug!("running '{}' for '{}'", name, ctx.username);
            match name {
                "config" => commands::settings::handle(&conn, &ctx, sub)?,
                "tx" => commands::records::handle(&mut conn, &ctx, sub)?,
                "import" => commands::importer::handle(&mut conn, &ctx, sub)?,
                "export" => commands::exporter::handle(&conn, &ctx, sub)?,
                "report" => commands::reports::handle(&conn, &ctx, sub)?,
                "budget" => commands::budgets::handle(&conn, &ctx, sub)?,
                "doctor" => commands::doctor::handle(&conn, &ctx)?,
                _ => {}
            }
        }
        None => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    if let Err(e) = run() {
        log::error!("{:?}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
