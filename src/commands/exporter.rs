// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::records::load_entries;
use crate::context::UserContext;
use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Spreadsheet tools only detect UTF-8 when the file starts with a BOM.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub const RECORD_HEADERS: [&str; 7] = ["id", "date", "book", "category", "item", "amount", "type"];

pub fn handle(conn: &Connection, ctx: &UserContext, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("records", sub)) => export_records(conn, ctx, sub),
        Some(("template", sub)) => {
            let out = sub.get_one::<String>("out").unwrap().trim();
            write_template(Path::new(out))?;
            println!("Wrote import template to {}", out);
            Ok(())
        }
        _ => Ok(()),
    }
}

fn bom_writer(path: &Path) -> Result<csv::Writer<File>> {
    let mut f = File::create(path).with_context(|| format!("Create {}", path.display()))?;
    f.write_all(UTF8_BOM)?;
    Ok(csv::Writer::from_writer(f))
}

pub fn write_records_csv(conn: &Connection, ctx: &UserContext, path: &Path) -> Result<usize> {
    let entries = load_entries(conn, ctx)?;
    let mut wtr = bom_writer(path)?;
    wtr.write_record(RECORD_HEADERS)?;
    for e in &entries {
        wtr.write_record([
            e.id.to_string(),
            e.date.to_string(),
            e.book.to_string(),
            e.category.to_string(),
            e.item.clone(),
            e.amount.to_string(),
            e.kind.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(entries.len())
}

/// Header-only CSV the file importer maps without flags.
pub fn write_template(path: &Path) -> Result<()> {
    let mut wtr = bom_writer(path)?;
    wtr.write_record(&RECORD_HEADERS[1..])?;
    wtr.flush()?;
    Ok(())
}

fn export_records(conn: &Connection, ctx: &UserContext, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap().trim();

    let n = match fmt.as_str() {
        "csv" => write_records_csv(conn, ctx, Path::new(out))?,
        "json" => {
            let entries = load_entries(conn, ctx)?;
            std::fs::write(out, serde_json::to_string_pretty(&entries)?)
                .with_context(|| format!("Write {}", out))?;
            entries.len()
        }
        _ => return Err(anyhow!("Unknown format: {} (use csv|json)", fmt)),
    };
    log::info!("exported {} record(s) for '{}' to {}", n, ctx.username, out);
    println!("Exported {} record(s) to {}", n, out);
    Ok(())
}
