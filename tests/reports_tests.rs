// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use tallybook::commands::budgets::compare;
use tallybook::commands::records::{add_entry, load_entries};
use tallybook::commands::reports::{Period, dashboard, monthly_trend, select, summary};
use tallybook::commands::settings::{set_init_balance, set_profile};
use tallybook::commands::{doctor, reports, settings};
use tallybook::context::UserContext;
use tallybook::models::{Book, Category, EntryType, NewEntry};
use tallybook::normalize::parse_amount;
use tallybook::{cli, db};

fn ymd(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn seeded() -> (Connection, UserContext) {
    let conn = db::open_in_memory().unwrap();
    let ctx = UserContext::local();
    for (date, cat, amount, kind) in [
        ("2024-12-20", Category::Salary, 3000, EntryType::Income),
        ("2025-01-01", Category::Rent, 500, EntryType::Expense),
        ("2025-01-15", Category::Salary, 3000, EntryType::Income),
        ("2025-02-03", Category::Shopping, 120, EntryType::Expense),
    ] {
        add_entry(
            &conn,
            &ctx,
            NewEntry {
                date: ymd(date),
                book: Book::MainLiving,
                category: cat,
                item: String::new(),
                amount: Decimal::new(amount, 0),
                kind,
            },
        )
        .unwrap();
    }
    (conn, ctx)
}

#[test]
fn dashboard_adds_starting_balance() {
    let (conn, ctx) = seeded();
    set_init_balance(&conn, &ctx, "-1,000.50").unwrap();
    let d = dashboard(&conn, &ctx).unwrap();
    assert_eq!(d.init_balance, Decimal::new(-100050, 2));
    assert_eq!(d.income, Decimal::new(6000, 0));
    assert_eq!(d.expense, Decimal::new(620, 0));
    assert_eq!(d.balance, Decimal::new(437950, 2));
}

#[test]
fn dashboard_of_empty_ledger_is_zero() {
    let conn = db::open_in_memory().unwrap();
    let d = dashboard(&conn, &UserContext::local()).unwrap();
    assert_eq!(d.balance, Decimal::ZERO);
    assert_eq!(d.income, Decimal::ZERO);
}

#[test]
fn summary_over_periods() {
    let (conn, ctx) = seeded();

    let all = select(&conn, &ctx, &Period::All, &[]).unwrap();
    assert_eq!(summary(&all).unwrap().records, 4);

    let y2025 = select(&conn, &ctx, &Period::Years(vec![2025]), &[]).unwrap();
    let s = summary(&y2025).unwrap();
    assert_eq!(s.records, 3);
    assert_eq!(s.net, Decimal::new(2380, 0));

    let jan = select(&conn, &ctx, &Period::Months(vec!["2025-01".into()]), &[EntryType::Expense])
        .unwrap();
    let s = summary(&jan).unwrap();
    assert_eq!(s.expense, Decimal::new(500, 0));
    assert_eq!(s.income, Decimal::ZERO);

    let range = Period::Range(ymd("2024-12-31"), ymd("2025-01-15"));
    assert_eq!(select(&conn, &ctx, &range, &[]).unwrap().len(), 2);
}

#[test]
fn period_from_cli_flags() {
    let m = cli::build_cli().get_matches_from([
        "tallybook", "report", "summary", "--from", "2025-01-01",
    ]);
    let sub = m
        .subcommand_matches("report")
        .and_then(|r| r.subcommand_matches("summary"))
        .unwrap();
    let p = Period::from_matches(sub).unwrap();
    assert!(p.contains(ymd("2030-01-01")));
    assert!(!p.contains(ymd("2024-12-31")));

    let m = cli::build_cli().get_matches_from([
        "tallybook", "report", "summary", "--from", "2025-02-01", "--to", "2025-01-01",
    ]);
    let sub = m
        .subcommand_matches("report")
        .and_then(|r| r.subcommand_matches("summary"))
        .unwrap();
    assert!(Period::from_matches(sub).is_err());
}

#[test]
fn trend_is_monthly_and_ascending() {
    let (conn, ctx) = seeded();
    let rows = monthly_trend(&load_entries(&conn, &ctx).unwrap()).unwrap();
    let months: Vec<&str> = rows.iter().map(|r| r.month.as_str()).collect();
    assert_eq!(months, ["2024-12", "2025-01", "2025-02"]);
    assert_eq!(rows[1].income, Decimal::new(3000, 0));
    assert_eq!(rows[1].expense, Decimal::new(500, 0));
    assert_eq!(rows[2].income, Decimal::ZERO);

    let m = cli::build_cli().get_matches_from(["tallybook", "report", "trend", "--jsonl"]);
    reports::handle(&conn, &ctx, m.subcommand_matches("report").unwrap()).unwrap();
}

#[test]
fn profile_updates_and_clears() {
    let conn = db::open_in_memory().unwrap();
    let ctx = UserContext::local();
    set_profile(&conn, &ctx, Some(" Kim "), Some("🐱")).unwrap();
    let cfg = ctx.load_config(&conn).unwrap();
    assert_eq!(cfg.nickname.as_deref(), Some("Kim"));
    assert_eq!(cfg.avatar.as_deref(), Some("🐱"));

    set_profile(&conn, &ctx, None, Some("")).unwrap();
    let cfg = ctx.load_config(&conn).unwrap();
    assert_eq!(cfg.nickname.as_deref(), Some("Kim"));
    assert_eq!(cfg.avatar, None);

    assert!(set_profile(&conn, &ctx, None, Some("way too long")).is_err());
    assert!(set_init_balance(&conn, &ctx, "lots").is_err());
}

#[test]
fn doctor_is_quiet_on_clean_ledger_and_flags_bad_rows() {
    let (conn, ctx) = seeded();
    assert!(doctor::check(&conn, &ctx).unwrap().is_empty());

    conn.execute(
        "UPDATE records SET date='2025-02-30', amount='-3' WHERE username='local' AND id=1",
        [],
    )
    .unwrap();
    conn.execute(
        "UPDATE users SET next_record_id=2 WHERE username='local'",
        [],
    )
    .unwrap();
    let issues: Vec<String> = doctor::check(&conn, &ctx)
        .unwrap()
        .into_iter()
        .map(|r| r[0].clone())
        .collect();
    assert_eq!(
        issues,
        ["bad_date", "negative_amount", "id_sequence_behind"]
    );
}

#[test]
fn totals_too_large_to_represent_are_errors() {
    let conn = db::open_in_memory().unwrap();
    let ctx = UserContext::local();
    let huge = parse_amount("70000000000000000000000000000");
    assert!(huge > Decimal::ZERO);
    for kind in [EntryType::Income, EntryType::Income, EntryType::Expense, EntryType::Expense] {
        add_entry(
            &conn,
            &ctx,
            NewEntry {
                date: ymd("2025-12-01"),
                book: Book::MainLiving,
                category: Category::Other,
                item: String::new(),
                amount: huge,
                kind,
            },
        )
        .unwrap();
    }

    assert!(dashboard(&conn, &ctx).is_err());
    let all = load_entries(&conn, &ctx).unwrap();
    assert!(summary(&all).is_err());
    assert!(monthly_trend(&all).is_err());
    assert!(compare(&conn, &ctx, &["2025-12".to_string()]).is_err());

    let m = cli::build_cli().get_matches_from(["tallybook", "report", "dashboard"]);
    assert!(reports::handle(&conn, &ctx, m.subcommand_matches("report").unwrap()).is_err());
}

#[test]
fn jsonl_flag_is_honoured_by_single_object_views() {
    let (conn, ctx) = seeded();
    for args in [
        ["tallybook", "report", "dashboard", "--jsonl"],
        ["tallybook", "report", "summary", "--jsonl"],
    ] {
        let m = cli::build_cli().get_matches_from(args);
        let sub = m.subcommand_matches("report").unwrap();
        let (_, leaf) = sub.subcommand().unwrap();
        assert!(leaf.get_flag("jsonl"));
        reports::handle(&conn, &ctx, sub).unwrap();
    }
    let m = cli::build_cli().get_matches_from(["tallybook", "config", "show", "--jsonl"]);
    settings::handle(&conn, &ctx, m.subcommand_matches("config").unwrap()).unwrap();
}
