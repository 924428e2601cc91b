// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::records::insert_entries;
use crate::context::UserContext;
use crate::error::LedgerError;
use crate::memo::{MemoBatch, parse_memo};
use crate::models::{Book, Category, EntryType, NewEntry};
use crate::normalize::{normalize_type, parse_amount};
use crate::utils::{maybe_print_json, parse_loose_date, pretty_table};
use anyhow::{Context, Result, anyhow};
use calamine::{Data, Reader, open_workbook_auto};
use chrono::{Duration, NaiveDate};
use csv::ReaderBuilder;
use rusqlite::Connection;
use std::io::Read;
use std::path::Path;

pub fn handle(conn: &mut Connection, ctx: &UserContext, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("file", sub)) => import_file(conn, ctx, sub),
        Some(("memo", sub)) => import_memo(conn, ctx, sub),
        _ => Ok(()),
    }
}

/// Header row plus data rows, every cell as trimmed text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    fn column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
    }
}

pub fn read_csv(path: &Path) -> Result<Sheet> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path.display()))?;
    let headers = rdr
        .headers()
        .with_context(|| format!("Read CSV header of {}", path.display()))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    let mut rows = Vec::new();
    for rec in rdr.records() {
        let rec = rec.with_context(|| format!("Read CSV row in {}", path.display()))?;
        rows.push(rec.iter().map(|c| c.trim().to_string()).collect());
    }
    Ok(Sheet { headers, rows })
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::DateTime(dt) => excel_serial_date(dt.as_f64())
            .map(|d| d.to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        other => other.to_string().trim().to_string(),
    }
}

/// Serial of 9999-12-31, the last date Excel can show.
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Excel day serials count from 1899-12-30.
fn excel_serial_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?
        .checked_add_signed(Duration::try_days(serial.floor() as i64)?)
}

/// First worksheet of an xlsx/xls/ods workbook.
pub fn read_workbook(path: &Path) -> Result<Sheet> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("Open workbook {}", path.display()))?;
    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| anyhow!("No worksheet in {}", path.display()))?;
    let range = workbook
        .worksheet_range(&first)
        .with_context(|| format!("Read worksheet '{}'", first))?;
    let mut iter = range.rows();
    let headers = iter
        .next()
        .map(|r| r.iter().map(cell_text).collect())
        .unwrap_or_default();
    let rows = iter.map(|r| r.iter().map(cell_text).collect()).collect();
    Ok(Sheet { headers, rows })
}

pub fn read_sheet(path: &Path) -> Result<Sheet> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match ext.as_str() {
        "csv" | "txt" => read_csv(path),
        "xlsx" | "xlsm" | "xls" | "ods" => read_workbook(path),
        _ => Err(anyhow!(
            "Unsupported file type '.{}' (use .csv or .xlsx)",
            ext
        )),
    }
}

/// Which header feeds which ledger field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub date: String,
    pub amount: String,
    pub kind: Option<String>,
    pub category: Option<String>,
    pub book: Option<String>,
    pub item: Option<String>,
}

impl ColumnMapping {
    /// Explicit flags win; otherwise the export template headers (English
    /// or Chinese) are picked up when present.
    pub fn resolve(sheet: &Sheet, sub: &clap::ArgMatches) -> Result<Self> {
        let pick = |flag: &str, defaults: [&str; 2]| -> Option<String> {
            sub.get_one::<String>(flag)
                .map(|s| s.trim().to_string())
                .or_else(|| {
                    defaults
                        .iter()
                        .find(|d| sheet.column(d).is_some())
                        .map(|d| d.to_string())
                })
        };
        let date = pick("date_col", ["date", "日期"])
            .ok_or_else(|| LedgerError::MissingColumn("date".into()))?;
        let amount = pick("amount_col", ["amount", "金额"])
            .ok_or_else(|| LedgerError::MissingColumn("amount".into()))?;
        Ok(ColumnMapping {
            date,
            amount,
            kind: pick("type_col", ["type", "类型"]),
            category: pick("category_col", ["category", "类别"]),
            book: pick("book_col", ["book", "账本"]),
            item: pick("item_col", ["item", "项目"]),
        })
    }
}

fn cell(row: &[String], i: usize) -> &str {
    row.get(i).map(String::as_str).unwrap_or("")
}

/// Turn sheet rows into entries. Rows with unreadable dates, or with a type
/// column value naming neither type, are dropped; the count of dropped rows
/// is returned alongside.
pub fn map_rows(sheet: &Sheet, mapping: &ColumnMapping) -> Result<(Vec<NewEntry>, usize)> {
    let idx = |name: &str| -> Result<usize> {
        sheet
            .column(name)
            .ok_or_else(|| LedgerError::MissingColumn(name.to_string()).into())
    };
    let opt_idx = |name: &Option<String>| -> Result<Option<usize>> {
        name.as_deref().map(idx).transpose()
    };
    let date_i = idx(&mapping.date)?;
    let amount_i = idx(&mapping.amount)?;
    let kind_i = opt_idx(&mapping.kind)?;
    let cat_i = opt_idx(&mapping.category)?;
    let book_i = opt_idx(&mapping.book)?;
    let item_i = opt_idx(&mapping.item)?;

    let mut entries = Vec::new();
    let mut dropped = 0;
    for row in &sheet.rows {
        let Some(date) = parse_loose_date(cell(row, date_i)) else {
            dropped += 1;
            continue;
        };
        let signed = parse_amount(cell(row, amount_i));
        let kind = match kind_i {
            Some(i) => match normalize_type(cell(row, i)) {
                Some(k) => k,
                None => {
                    dropped += 1;
                    continue;
                }
            },
            None if signed.is_sign_negative() && !signed.is_zero() => EntryType::Expense,
            None => EntryType::Income,
        };
        entries.push(NewEntry {
            date,
            book: book_i.map(|i| Book::parse(cell(row, i))).unwrap_or_default(),
            category: cat_i
                .map(|i| Category::parse(cell(row, i)))
                .unwrap_or(Category::Other),
            item: item_i.map(|i| cell(row, i).to_string()).unwrap_or_default(),
            amount: signed.abs(),
            kind,
        });
    }
    Ok((entries, dropped))
}

fn import_file(conn: &mut Connection, ctx: &UserContext, sub: &clap::ArgMatches) -> Result<()> {
    let path = sub.get_one::<String>("path").unwrap().trim();
    let sheet = read_sheet(Path::new(path))?;

    if sub.get_flag("preview") {
        let rows: Vec<Vec<String>> = sheet.rows.iter().take(30).cloned().collect();
        let headers: Vec<&str> = sheet.headers.iter().map(String::as_str).collect();
        println!("{}", pretty_table(&headers, rows));
        println!("{} data row(s) in {}", sheet.rows.len(), path);
        return Ok(());
    }

    let mapping = ColumnMapping::resolve(&sheet, sub)?;
    let (entries, dropped) = map_rows(&sheet, &mapping)?;
    let tx = conn.transaction()?;
    let ids = insert_entries(&tx, ctx, entries)?;
    tx.commit()?;
    log::info!(
        "imported {} row(s) from {} for '{}', dropped {}",
        ids.len(),
        path,
        ctx.username,
        dropped
    );
    println!(
        "Imported {} record(s) from {} ({} row(s) skipped)",
        ids.len(),
        path,
        dropped
    );
    Ok(())
}

/// Parse memo text and, unless `dry_run`, append the parsed entries.
pub fn import_memo_text(
    conn: &mut Connection,
    ctx: &UserContext,
    text: &str,
    dry_run: bool,
) -> Result<(MemoBatch, Vec<i64>)> {
    let batch = parse_memo(text);
    if dry_run || batch.entries.is_empty() {
        return Ok((batch, Vec::new()));
    }
    let tx = conn.transaction()?;
    let ids = insert_entries(&tx, ctx, batch.entries.clone())?;
    tx.commit()?;
    Ok((batch, ids))
}

fn import_memo(conn: &mut Connection, ctx: &UserContext, sub: &clap::ArgMatches) -> Result<()> {
    let text = match sub.get_one::<String>("path").map(|p| p.trim()) {
        Some(p) if p != "-" => {
            std::fs::read_to_string(p).with_context(|| format!("Read memo file {}", p))?
        }
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Read memo text from stdin")?;
            buf
        }
    };
    let dry_run = sub.get_flag("dry_run");
    let (batch, ids) = import_memo_text(conn, ctx, &text, dry_run)?;

    if maybe_print_json(sub.get_flag("json"), false, &batch)? {
        return Ok(());
    }
    let rows: Vec<Vec<String>> = batch
        .entries
        .iter()
        .map(|e| {
            vec![
                e.date.to_string(),
                e.book.to_string(),
                e.category.to_string(),
                e.item.clone(),
                format!("{:.2}", e.amount),
                e.kind.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Date", "Book", "Category", "Item", "Amount", "Type"], rows)
    );
    for s in &batch.skipped {
        println!("skipped line {}: {} ({})", s.line_no, s.text, s.reason);
    }
    if batch.entries.is_empty() {
        println!("No records parsed: each line needs a YYYY-MM-DD (or YYYY/MM/DD) date and an amount");
    } else if dry_run {
        println!(
            "Parsed {} of {} line(s); nothing written (dry run)",
            batch.entries.len(),
            batch.input_lines()
        );
    } else {
        println!(
            "Imported {} of {} line(s)",
            ids.len(),
            batch.input_lines()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{ExcelDateTime, ExcelDateTimeType};

    #[test]
    fn excel_serials_map_to_calendar_dates() {
        assert_eq!(
            excel_serial_date(45992.0),
            NaiveDate::from_ymd_opt(2025, 12, 1)
        );
        assert_eq!(
            excel_serial_date(45992.75),
            NaiveDate::from_ymd_opt(2025, 12, 1)
        );
        assert_eq!(
            excel_serial_date(MAX_EXCEL_SERIAL),
            NaiveDate::from_ymd_opt(9999, 12, 31)
        );
    }

    #[test]
    fn out_of_range_serials_are_rejected() {
        for serial in [0.0, -3.0, MAX_EXCEL_SERIAL + 1.0, 1e17, f64::NAN, f64::INFINITY] {
            assert_eq!(excel_serial_date(serial), None, "serial {}", serial);
        }
    }

    #[test]
    fn cells_render_as_text() {
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::Float(12.5)), "12.5");
        assert_eq!(cell_text(&Data::String("  Rent ".into())), "Rent");
        let date = ExcelDateTime::new(45992.0, ExcelDateTimeType::DateTime, false);
        assert_eq!(cell_text(&Data::DateTime(date)), "2025-12-01");

        // Too large for a date: the raw serial is kept so the row's date
        // fails to parse and the row is dropped.
        let huge = ExcelDateTime::new(1e17, ExcelDateTimeType::DateTime, false);
        let text = cell_text(&Data::DateTime(huge));
        assert!(parse_loose_date(&text).is_none());
    }
}
