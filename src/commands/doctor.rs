// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::context::UserContext;
use crate::models::EntryType;
use crate::utils::{parse_date, pretty_table};
use anyhow::Result;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

/// Integrity findings for the user's stored rows as `[issue, detail]`.
pub fn check(conn: &Connection, ctx: &UserContext) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();

    let mut stmt =
        conn.prepare("SELECT id, date, amount, type FROM records WHERE username=?1 ORDER BY id")?;
    let mut cur = stmt.query(params![ctx.username])?;
    let mut max_id = 0i64;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let date: String = r.get(1)?;
        let amount: String = r.get(2)?;
        let kind: String = r.get(3)?;
        max_id = max_id.max(id);
        if parse_date(&date).is_err() {
            rows.push(vec!["bad_date".into(), format!("#{} '{}'", id, date)]);
        }
        match amount.parse::<Decimal>() {
            Ok(a) if a.is_sign_negative() && !a.is_zero() => {
                rows.push(vec!["negative_amount".into(), format!("#{} {}", id, a)])
            }
            Ok(_) => {}
            Err(_) => rows.push(vec!["bad_amount".into(), format!("#{} '{}'", id, amount)]),
        }
        if EntryType::from_db(&kind).is_none() {
            rows.push(vec!["unknown_type".into(), format!("#{} '{}'", id, kind)]);
        }
    }

    let next: i64 = conn.query_row(
        "SELECT next_record_id FROM users WHERE username=?1",
        params![ctx.username],
        |r| r.get(0),
    )?;
    if next <= max_id {
        rows.push(vec![
            "id_sequence_behind".into(),
            format!("next id {} <= max id {}", next, max_id),
        ]);
    }
    Ok(rows)
}

pub fn handle(conn: &Connection, ctx: &UserContext) -> Result<()> {
    let rows = check(conn, ctx)?;
    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
