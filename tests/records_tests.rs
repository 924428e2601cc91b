// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use tallybook::commands::records::{
    self, EntryPatch, RecordFilter, add_entry, delete_entries, next_id, query_rows, set_column,
    update_entry,
};
use tallybook::context::UserContext;
use tallybook::error::LedgerError;
use tallybook::models::{Book, Category, EntryType, NewEntry};
use tallybook::{cli, db};

fn entry(date: &str, cat: Category, amount: i64, kind: EntryType) -> NewEntry {
    NewEntry {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        book: Book::MainLiving,
        category: cat,
        item: String::new(),
        amount: Decimal::new(amount, 0),
        kind,
    }
}

fn setup() -> (Connection, UserContext) {
    let conn = db::open_in_memory().unwrap();
    let ctx = UserContext::local();
    for d in ["2025-01-01", "2025-01-02", "2025-01-03"] {
        add_entry(&conn, &ctx, entry(d, Category::Rent, 10, EntryType::Expense)).unwrap();
    }
    (conn, ctx)
}

fn run(conn: &mut Connection, ctx: &UserContext, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["tallybook", "tx"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("tx", tx_m)) => records::handle(conn, ctx, tx_m),
        _ => panic!("no tx subcommand"),
    }
}

#[test]
fn ids_are_sequential_and_never_reused() {
    let (conn, ctx) = setup();
    assert_eq!(next_id(&conn, &ctx).unwrap(), 4);
    assert_eq!(delete_entries(&conn, &ctx, &[3]).unwrap(), 1);
    assert_eq!(next_id(&conn, &ctx).unwrap(), 4);
    let id = add_entry(
        &conn,
        &ctx,
        entry("2025-01-04", Category::Bill, 5, EntryType::Expense),
    )
    .unwrap();
    assert_eq!(id, 4);
}

#[test]
fn ids_are_scoped_per_user() {
    let (conn, _) = setup();
    conn.execute("INSERT INTO users(username) VALUES ('bob')", [])
        .unwrap();
    let bob = UserContext::new("bob");
    assert_eq!(next_id(&conn, &bob).unwrap(), 1);
    let rows = query_rows(&conn, &bob, &RecordFilter::default()).unwrap();
    assert!(rows.is_empty());
}

#[test]
fn list_sorts_newest_first_and_respects_limit() {
    let (mut conn, ctx) = setup();
    let rows = query_rows(
        &conn,
        &ctx,
        &RecordFilter {
            limit: Some(2),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date.to_string(), "2025-01-03");
    assert_eq!(rows[1].id, 2);

    run(&mut conn, &ctx, &["list", "--limit", "1", "--json"]).unwrap();
}

#[test]
fn list_filters_by_type_book_and_keyword() {
    let (conn, ctx) = setup();
    let mut salary = entry("2025-01-05", Category::Salary, 3000, EntryType::Income);
    salary.book = Book::Investment;
    salary.item = "January pay".into();
    add_entry(&conn, &ctx, salary).unwrap();

    let income = query_rows(
        &conn,
        &ctx,
        &RecordFilter {
            kinds: vec![EntryType::Income],
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(income.len(), 1);
    assert_eq!(income[0].category, Category::Salary);

    let by_book = query_rows(
        &conn,
        &ctx,
        &RecordFilter {
            books: vec![Book::Investment],
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(by_book.len(), 1);

    let by_kw = query_rows(
        &conn,
        &ctx,
        &RecordFilter {
            keyword: Some("pay".into()),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(by_kw.len(), 1);
}

#[test]
fn add_via_cli_uses_custom_category_for_other() {
    let (mut conn, ctx) = setup();
    run(
        &mut conn,
        &ctx,
        &[
            "add", "--date", "2025-02-01", "--type", "支出", "--category", "其他", "--custom",
            "Gym", "--amount", "¥1,200", "--book", "car",
        ],
    )
    .unwrap();
    let e = records::get_entry(&conn, &ctx, 4).unwrap();
    assert_eq!(e.category, Category::Custom("Gym".into()));
    assert_eq!(e.book, Book::Car);
    assert_eq!(e.amount, Decimal::new(1200, 0));
    assert_eq!(e.kind, EntryType::Expense);
}

#[test]
fn add_rejects_negative_amount() {
    let (mut conn, ctx) = setup();
    let err = run(&mut conn, &ctx, &["add", "--amount", "-5"]).unwrap_err();
    assert_eq!(
        err.downcast_ref::<LedgerError>(),
        Some(&LedgerError::NegativeAmount("-5".into()))
    );
    assert_eq!(next_id(&conn, &ctx).unwrap(), 4);
}

#[test]
fn edit_updates_only_given_fields() {
    let (conn, ctx) = setup();
    let e = update_entry(
        &conn,
        &ctx,
        2,
        EntryPatch {
            item: Some("February rent".into()),
            amount: Some(Decimal::new(25, 0)),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(e.item, "February rent");
    assert_eq!(e.amount, Decimal::new(25, 0));
    assert_eq!(e.category, Category::Rent);

    let err = update_entry(&conn, &ctx, 99, EntryPatch::default()).unwrap_err();
    assert_eq!(
        err.downcast_ref::<LedgerError>(),
        Some(&LedgerError::EntryNotFound(99))
    );
}

#[test]
fn bulk_column_overwrite() {
    let (conn, ctx) = setup();
    let n = set_column(&conn, &ctx, &[1, 2, 42], "book", "理财账本").unwrap();
    assert_eq!(n, 2);
    let rows = query_rows(
        &conn,
        &ctx,
        &RecordFilter {
            books: vec![Book::Investment],
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(rows.len(), 2);

    let n = set_column(&conn, &ctx, &[3], "type", "收入").unwrap();
    assert_eq!(n, 1);
    assert_eq!(
        records::get_entry(&conn, &ctx, 3).unwrap().kind,
        EntryType::Income
    );

    let err = set_column(&conn, &ctx, &[1], "payee", "x").unwrap_err();
    assert_eq!(
        err.downcast_ref::<LedgerError>(),
        Some(&LedgerError::UnknownColumn("payee".into()))
    );
}

#[test]
fn rm_deletes_listed_ids_only() {
    let (mut conn, ctx) = setup();
    run(&mut conn, &ctx, &["rm", "1", "3"]).unwrap();
    let rows = query_rows(&conn, &ctx, &RecordFilter::default()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, 2);
}

#[test]
fn clear_requires_confirmation() {
    let (mut conn, ctx) = setup();
    run(&mut conn, &ctx, &["clear"]).unwrap();
    assert_eq!(query_rows(&conn, &ctx, &RecordFilter::default()).unwrap().len(), 3);
    run(&mut conn, &ctx, &["clear", "--yes"]).unwrap();
    assert!(query_rows(&conn, &ctx, &RecordFilter::default()).unwrap().is_empty());
    assert_eq!(next_id(&conn, &ctx).unwrap(), 4);
}
