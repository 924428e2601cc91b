// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::records::load_entries;
use crate::context::UserContext;
use crate::models::{EntryType, LedgerEntry};
use crate::utils::{
    add_money, fmt_money, maybe_print_json, parse_date, parse_entry_type, parse_month,
    pretty_table, sub_money,
};
use anyhow::{Result, anyhow};
use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

pub fn handle(conn: &Connection, ctx: &UserContext, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("dashboard", sub)) => dashboard_cmd(conn, ctx, sub)?,
        Some(("summary", sub)) => summary_cmd(conn, ctx, sub)?,
        Some(("trend", sub)) => trend_cmd(conn, ctx, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    pub income: Decimal,
    pub expense: Decimal,
}

impl Totals {
    pub fn of<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> Result<Self> {
        let mut t = Totals {
            income: Decimal::ZERO,
            expense: Decimal::ZERO,
        };
        for e in entries {
            match e.kind {
                EntryType::Income => t.income = add_money(t.income, e.amount)?,
                EntryType::Expense => t.expense = add_money(t.expense, e.amount)?,
            }
        }
        Ok(t)
    }

    pub fn net(&self) -> Result<Decimal> {
        sub_money(self.income, self.expense)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub init_balance: Decimal,
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
}

pub fn dashboard(conn: &Connection, ctx: &UserContext) -> Result<Dashboard> {
    let cfg = ctx.load_config(conn)?;
    let entries = load_entries(conn, ctx)?;
    let t = Totals::of(&entries)?;
    Ok(Dashboard {
        init_balance: cfg.init_balance,
        balance: add_money(cfg.init_balance, t.net()?)?,
        income: t.income,
        expense: t.expense,
    })
}

fn dashboard_cmd(conn: &Connection, ctx: &UserContext, sub: &clap::ArgMatches) -> Result<()> {
    let d = dashboard(conn, ctx)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &d)? {
        println!(
            "{}",
            pretty_table(
                &["Balance", "Total income", "Total expense"],
                vec![vec![
                    fmt_money(&d.balance),
                    fmt_money(&d.income),
                    fmt_money(&d.expense),
                ]],
            )
        );
    }
    Ok(())
}

/// Slice of the ledger a statistic covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Period {
    All,
    Years(Vec<i32>),
    Months(Vec<String>),
    Range(NaiveDate, NaiveDate),
}

impl Period {
    pub fn contains(&self, d: NaiveDate) -> bool {
        match self {
            Period::All => true,
            Period::Years(ys) => ys.contains(&d.year()),
            Period::Months(ms) => ms.contains(&d.format("%Y-%m").to_string()),
            Period::Range(from, to) => *from <= d && d <= *to,
        }
    }

    pub fn from_matches(sub: &clap::ArgMatches) -> Result<Self> {
        if let Some(ys) = sub.get_many::<i32>("year") {
            return Ok(Period::Years(ys.copied().collect()));
        }
        if let Some(ms) = sub.get_many::<String>("month") {
            return Ok(Period::Months(
                ms.map(|m| parse_month(m)).collect::<Result<Vec<_>>>()?,
            ));
        }
        match (sub.get_one::<String>("from"), sub.get_one::<String>("to")) {
            (None, None) => Ok(Period::All),
            (from, to) => {
                let from = from.map(|f| parse_date(f)).transpose()?.unwrap_or(NaiveDate::MIN);
                let to = to.map(|t| parse_date(t)).transpose()?.unwrap_or(NaiveDate::MAX);
                if from > to {
                    return Err(anyhow!("--from {} is after --to {}", from, to));
                }
                Ok(Period::Range(from, to))
            }
        }
    }
}

fn kinds_arg(sub: &clap::ArgMatches) -> Result<Vec<EntryType>> {
    sub.get_many::<String>("type")
        .map(|v| v.map(|s| parse_entry_type(s)).collect::<Result<Vec<_>>>())
        .transpose()
        .map(Option::unwrap_or_default)
}

pub fn select(
    conn: &Connection,
    ctx: &UserContext,
    period: &Period,
    kinds: &[EntryType],
) -> Result<Vec<LedgerEntry>> {
    Ok(load_entries(conn, ctx)?
        .into_iter()
        .filter(|e| period.contains(e.date))
        .filter(|e| kinds.is_empty() || kinds.contains(&e.kind))
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub records: usize,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

pub fn summary(entries: &[LedgerEntry]) -> Result<Summary> {
    let t = Totals::of(entries)?;
    Ok(Summary {
        records: entries.len(),
        net: t.net()?,
        income: t.income,
        expense: t.expense,
    })
}

fn summary_cmd(conn: &Connection, ctx: &UserContext, sub: &clap::ArgMatches) -> Result<()> {
    let period = Period::from_matches(sub)?;
    let entries = select(conn, ctx, &period, &kinds_arg(sub)?)?;
    if entries.is_empty() {
        println!("No records in the selected period");
        return Ok(());
    }
    let s = summary(&entries)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
        println!(
            "{}",
            pretty_table(
                &["Records", "Income", "Expense", "Net (income-expense)"],
                vec![vec![
                    s.records.to_string(),
                    fmt_money(&s.income),
                    fmt_money(&s.expense),
                    fmt_money(&s.net),
                ]],
            )
        );
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendRow {
    pub month: String,
    pub income: Decimal,
    pub expense: Decimal,
}

/// Month × type pivot, months ascending, zero-filled.
pub fn monthly_trend(entries: &[LedgerEntry]) -> Result<Vec<TrendRow>> {
    let mut map: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
    for e in entries {
        let slot = map
            .entry(e.month())
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        match e.kind {
            EntryType::Income => slot.0 = add_money(slot.0, e.amount)?,
            EntryType::Expense => slot.1 = add_money(slot.1, e.amount)?,
        }
    }
    Ok(map
        .into_iter()
        .map(|(month, (income, expense))| TrendRow {
            month,
            income,
            expense,
        })
        .collect())
}

fn trend_cmd(conn: &Connection, ctx: &UserContext, sub: &clap::ArgMatches) -> Result<()> {
    let period = Period::from_matches(sub)?;
    let entries = select(conn, ctx, &period, &kinds_arg(sub)?)?;
    let data = monthly_trend(&entries)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|r| {
                vec![
                    r.month.clone(),
                    format!("{:.2}", r.income),
                    format!("{:.2}", r.expense),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Month", "Income", "Expense"], rows));
    }
    Ok(())
}
