// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use std::io::Write;
use tallybook::commands::importer::{self, ColumnMapping, Sheet, import_memo_text, map_rows};
use tallybook::commands::records::{RecordFilter, load_entries, next_id, query_rows};
use tallybook::context::UserContext;
use tallybook::error::LedgerError;
use tallybook::models::{Book, Category, EntryType};
use tallybook::{cli, db};
use tempfile::NamedTempFile;

fn csv_file(contents: &str) -> NamedTempFile {
    let mut f = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    f.flush().unwrap();
    f
}

fn import(conn: &mut rusqlite::Connection, ctx: &UserContext, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["tallybook", "import"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    let Some(("import", sub)) = matches.subcommand() else {
        panic!("no import subcommand");
    };
    importer::handle(conn, ctx, sub)
}

#[test]
fn template_headers_with_bom_are_picked_up() {
    let mut conn = db::open_in_memory().unwrap();
    let ctx = UserContext::local();
    let file = csv_file(
        "\u{feff}date,book,category,item,amount,type\n\
         2025-12-01,生活主账,Rent,December,500,expense\n\
         2025/12/02,car,Petrol,fill up,\"1,200.50\",支出\n\
         2025-12-03 08:30:00,,工资,,3000,收入\n",
    );
    // Surrounding whitespace on the path is ignored.
    let padded = format!("  {}  ", file.path().display());
    import(&mut conn, &ctx, &["file", "--path", &padded]).unwrap();

    let rows = load_entries(&conn, &ctx).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].category, Category::Rent);
    assert_eq!(rows[1].book, Book::Car);
    assert_eq!(rows[1].amount, Decimal::new(120050, 2));
    assert_eq!(rows[1].kind, EntryType::Expense);
    assert_eq!(rows[2].book, Book::MainLiving);
    assert_eq!(rows[2].category, Category::Salary);
    assert_eq!(rows[2].kind, EntryType::Income);
    assert_eq!(rows[2].date.to_string(), "2025-12-03");
}

#[test]
fn explicit_column_flags_override_defaults() {
    let mut conn = db::open_in_memory().unwrap();
    let ctx = UserContext::local();
    let file = csv_file(
        "交易时间,交易金额,说明\n\
         2025-01-02,-35,lunch\n\
         2025-01-03,1000,bonus\n",
    );
    let path = file.path().display().to_string();
    import(
        &mut conn,
        &ctx,
        &[
            "file",
            "--path",
            &path,
            "--date-col",
            "交易时间",
            "--amount-col",
            "交易金额",
            "--item-col",
            "说明",
        ],
    )
    .unwrap();

    let rows = load_entries(&conn, &ctx).unwrap();
    assert_eq!(rows.len(), 2);
    // Without a type column the sign decides.
    assert_eq!(rows[0].kind, EntryType::Expense);
    assert_eq!(rows[0].amount, Decimal::new(35, 0));
    assert_eq!(rows[0].item, "lunch");
    assert_eq!(rows[0].category, Category::Other);
    assert_eq!(rows[1].kind, EntryType::Income);
}

#[test]
fn bad_dates_and_unknown_types_are_dropped() {
    let sheet = Sheet {
        headers: vec!["date".into(), "amount".into(), "type".into()],
        rows: vec![
            vec!["2025-01-01".into(), "10".into(), "expense".into()],
            vec!["yesterday".into(), "10".into(), "expense".into()],
            vec!["2025-01-02".into(), "10".into(), "transfer".into()],
            vec!["2025-01-03".into(), "abc".into(), "income".into()],
        ],
    };
    let mapping = ColumnMapping {
        date: "date".into(),
        amount: "amount".into(),
        kind: Some("type".into()),
        category: None,
        book: None,
        item: None,
    };
    let (entries, dropped) = map_rows(&sheet, &mapping).unwrap();
    assert_eq!(dropped, 2);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].amount, Decimal::ZERO);
}

#[test]
fn missing_required_column_is_reported() {
    let mut conn = db::open_in_memory().unwrap();
    let ctx = UserContext::local();
    let file = csv_file("when,amount\n2025-01-01,5\n");
    let path = file.path().display().to_string();
    let err = import(&mut conn, &ctx, &["file", "--path", &path]).unwrap_err();
    assert_eq!(
        err.downcast_ref::<LedgerError>(),
        Some(&LedgerError::MissingColumn("date".into()))
    );
    assert!(load_entries(&conn, &ctx).unwrap().is_empty());
}

#[test]
fn preview_writes_nothing() {
    let mut conn = db::open_in_memory().unwrap();
    let ctx = UserContext::local();
    let file = csv_file("date,amount\n2025-01-01,5\n");
    let path = file.path().display().to_string();
    import(&mut conn, &ctx, &["file", "--path", &path, "--preview"]).unwrap();
    assert!(load_entries(&conn, &ctx).unwrap().is_empty());
}

#[test]
fn unsupported_extension_is_rejected() {
    let mut conn = db::open_in_memory().unwrap();
    let ctx = UserContext::local();
    let mut f = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
    f.write_all(b"date,amount\n").unwrap();
    let path = f.path().display().to_string();
    assert!(import(&mut conn, &ctx, &["file", "--path", &path]).is_err());
}

#[test]
fn memo_dry_run_parses_without_writing() {
    let mut conn = db::open_in_memory().unwrap();
    let ctx = UserContext::local();
    let text = "2025-12-02 支出 Rent 500\nno date here 5\n2025-12-01 收入 工资 3000";

    let (batch, ids) = import_memo_text(&mut conn, &ctx, text, true).unwrap();
    assert_eq!(batch.entries.len(), 2);
    assert_eq!(batch.skipped.len(), 1);
    assert!(ids.is_empty());
    assert!(load_entries(&conn, &ctx).unwrap().is_empty());

    let (_, ids) = import_memo_text(&mut conn, &ctx, text, false).unwrap();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(next_id(&conn, &ctx).unwrap(), 3);
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
    assert_eq!(income[0].amount, Decimal::new(3000, 0));
}

#[test]
fn memo_file_import_via_cli() {
    let mut conn = db::open_in_memory().unwrap();
    let ctx = UserContext::local();
    let mut f = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    f.write_all("2025-12-02 支出 Rent 500\n2025-12-02 支出 Rent 500\n".as_bytes())
        .unwrap();
    let path = f.path().display().to_string();
    import(&mut conn, &ctx, &["memo", "--path", &path]).unwrap();
    // Identical lines are both kept.
    assert_eq!(load_entries(&conn, &ctx).unwrap().len(), 2);
}
