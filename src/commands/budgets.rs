// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::records::load_entries;
use crate::context::UserContext;
use crate::models::{BudgetEntry, Category, EntryType};
use crate::normalize::parse_amount;
use crate::utils::{
    add_money, maybe_print_json, parse_entry_type, parse_month, pretty_table, sub_money,
};
use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub fn handle(conn: &Connection, ctx: &UserContext, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(conn, ctx, sub)?,
        Some(("list", sub)) => list(conn, ctx, sub)?,
        Some(("compare", sub)) => compare_cmd(conn, ctx, sub)?,
        _ => {}
    }
    Ok(())
}

/// One row per (month, category, type); saving again replaces the amount.
pub fn upsert_budget(conn: &Connection, ctx: &UserContext, b: &BudgetEntry) -> Result<()> {
    conn.execute(
        "INSERT INTO budgets(username, month, category, type, amount) VALUES (?1,?2,?3,?4,?5)
         ON CONFLICT(username, month, category, type) DO UPDATE SET amount=excluded.amount",
        params![
            ctx.username,
            b.month,
            b.category.label(),
            b.kind.as_str(),
            b.amount.to_string()
        ],
    )?;
    log::info!(
        "budget {} / {} / {} = {} for '{}'",
        b.month,
        b.category,
        b.kind,
        b.amount,
        ctx.username
    );
    Ok(())
}

fn set(conn: &Connection, ctx: &UserContext, sub: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(sub.get_one::<String>("month").unwrap())?;
    let category = Category::parse(sub.get_one::<String>("category").unwrap());
    let kind = parse_entry_type(sub.get_one::<String>("type").unwrap())?;
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap());
    let b = BudgetEntry {
        month,
        category,
        kind,
        amount,
    };
    upsert_budget(conn, ctx, &b)?;
    println!(
        "Budget set for {} / {} / {} = {:.2}",
        b.month, b.category, b.kind, b.amount
    );
    Ok(())
}

pub fn list_budgets(
    conn: &Connection,
    ctx: &UserContext,
    months: &[String],
) -> Result<Vec<BudgetEntry>> {
    let mut stmt = conn.prepare(
        "SELECT month, category, type, amount FROM budgets WHERE username=?1
         ORDER BY month DESC, type, category",
    )?;
    let mut rows = stmt.query(params![ctx.username])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let month: String = r.get(0)?;
        if !months.is_empty() && !months.contains(&month) {
            continue;
        }
        let category: String = r.get(1)?;
        let kind: String = r.get(2)?;
        let amount: String = r.get(3)?;
        out.push(BudgetEntry {
            kind: EntryType::from_db(&kind)
                .ok_or_else(|| anyhow!("Invalid budget type '{}' for {}", kind, month))?,
            amount: amount
                .parse::<Decimal>()
                .with_context(|| format!("Invalid budget amount '{}' for {}", amount, month))?,
            category: Category::parse(&category),
            month,
        });
    }
    Ok(out)
}

fn months_arg(sub: &clap::ArgMatches) -> Result<Vec<String>> {
    sub.get_many::<String>("month")
        .map(|v| v.map(|m| parse_month(m)).collect::<Result<Vec<_>>>())
        .transpose()
        .map(Option::unwrap_or_default)
}

fn list(conn: &Connection, ctx: &UserContext, sub: &clap::ArgMatches) -> Result<()> {
    let months = months_arg(sub)?;
    let data = list_budgets(conn, ctx, &months)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|b| {
                vec![
                    b.month.clone(),
                    b.category.to_string(),
                    b.kind.to_string(),
                    format!("{:.2}", b.amount),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Month", "Category", "Type", "Budget"], rows)
        );
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetComparison {
    pub month: String,
    pub category: Category,
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub actual: Decimal,
    pub budget: Decimal,
    pub diff: Decimal,
}

/// Actual sums per (month, category, type) in the chosen months, each
/// joined to its budget (zero when none was set). Budgets with no matching
/// records are not listed.
pub fn compare(
    conn: &Connection,
    ctx: &UserContext,
    months: &[String],
) -> Result<Vec<BudgetComparison>> {
    let mut actual: BTreeMap<(String, String, EntryType), (Category, Decimal)> = BTreeMap::new();
    for e in load_entries(conn, ctx)? {
        let month = e.month();
        if !months.contains(&month) {
            continue;
        }
        let key = (month, e.category.label().to_string(), e.kind);
        let slot = actual
            .entry(key)
            .or_insert_with(|| (e.category.clone(), Decimal::ZERO));
        slot.1 = add_money(slot.1, e.amount)?;
    }
    let budgets: BTreeMap<(String, String, EntryType), Decimal> = list_budgets(conn, ctx, months)?
        .into_iter()
        .map(|b| ((b.month, b.category.label().to_string(), b.kind), b.amount))
        .collect();

    let mut out: Vec<BudgetComparison> = actual
        .into_iter()
        .map(|(key, (category, actual))| {
            let budget = budgets.get(&key).copied().unwrap_or(Decimal::ZERO);
            Ok(BudgetComparison {
                diff: sub_money(actual, budget)?.round_dp(2),
                month: key.0,
                category,
                kind: key.2,
                actual,
                budget,
            })
        })
        .collect::<Result<_>>()?;
    out.sort_by(|a, b| {
        a.month
            .cmp(&b.month)
            .then(a.kind.as_str().cmp(b.kind.as_str()))
            .then(b.actual.cmp(&a.actual))
    });
    Ok(out)
}

/// Latest month that has records, if any.
pub fn latest_month(conn: &Connection, ctx: &UserContext) -> Result<Option<String>> {
    let months: BTreeSet<String> = load_entries(conn, ctx)?.iter().map(|e| e.month()).collect();
    Ok(months.into_iter().next_back())
}

fn compare_cmd(conn: &Connection, ctx: &UserContext, sub: &clap::ArgMatches) -> Result<()> {
    let mut months = months_arg(sub)?;
    if months.is_empty() {
        match latest_month(conn, ctx)? {
            Some(m) => months.push(m),
            None => {
                println!("No records yet");
                return Ok(());
            }
        }
    }
    let data = compare(conn, ctx, &months)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|c| {
                vec![
                    c.month.clone(),
                    c.category.to_string(),
                    c.kind.to_string(),
                    format!("{:.2}", c.actual),
                    format!("{:.2}", c.budget),
                    format!("{:.2}", c.diff),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Month", "Category", "Type", "Actual", "Budget", "Diff (actual-budget)"],
                rows
            )
        );
    }
    Ok(())
}
