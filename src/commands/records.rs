// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::context::UserContext;
use crate::error::LedgerError;
use crate::models::{Book, Category, EntryType, LedgerEntry, NewEntry};
use crate::normalize::parse_amount;
use crate::utils::{
    fmt_money, maybe_print_json, parse_date, parse_entry_type, parse_ids, pretty_table,
};
use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, Row, params, params_from_iter};
use rust_decimal::Decimal;

pub fn handle(conn: &mut Connection, ctx: &UserContext, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, ctx, sub)?,
        Some(("list", sub)) => list(conn, ctx, sub)?,
        Some(("edit", sub)) => edit(conn, ctx, sub)?,
        Some(("set", sub)) => set(conn, ctx, sub)?,
        Some(("rm", sub)) => rm(conn, ctx, sub)?,
        Some(("clear", sub)) => clear_cmd(conn, ctx, sub)?,
        _ => {}
    }
    Ok(())
}

/// Amount typed by a person: lenient parse, but the sign belongs to the
/// entry type so negatives are refused.
pub fn parse_manual_amount(raw: &str) -> Result<Decimal> {
    let amount = parse_amount(raw);
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(LedgerError::NegativeAmount(raw.trim().to_string()).into());
    }
    Ok(amount)
}

fn add(conn: &Connection, ctx: &UserContext, sub: &clap::ArgMatches) -> Result<()> {
    let kind = parse_entry_type(sub.get_one::<String>("type").unwrap())?;
    let date = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => chrono::Local::now().date_naive(),
    };
    let book = Book::parse(sub.get_one::<String>("book").map(String::as_str).unwrap_or(""));
    let category = Category::parse(
        sub.get_one::<String>("category")
            .map(String::as_str)
            .unwrap_or(""),
    )
    .with_override(sub.get_one::<String>("custom").map(String::as_str));
    let item = sub
        .get_one::<String>("item")
        .map(|s| s.trim().to_string())
        .unwrap_or_default();
    let amount = parse_manual_amount(sub.get_one::<String>("amount").unwrap())?;

    let entry = NewEntry {
        date,
        book,
        category,
        item,
        amount,
        kind,
    };
    let id = add_entry(conn, ctx, entry.clone())?;
    println!(
        "Recorded #{} {} {} {} on {}",
        id,
        entry.kind,
        entry.category,
        fmt_money(&entry.amount),
        entry.date
    );
    Ok(())
}

/// Next id for the user: past the highest id ever issued, so ids freed by
/// deletion are never handed out again.
pub fn next_id(conn: &Connection, ctx: &UserContext) -> Result<i64> {
    let id: i64 = conn
        .query_row(
            "SELECT MAX(u.next_record_id,
                        COALESCE((SELECT MAX(r.id) FROM records r WHERE r.username=u.username), 0) + 1)
             FROM users u WHERE u.username=?1",
            params![ctx.username],
            |r| r.get(0),
        )
        .with_context(|| format!("User '{}' not found", ctx.username))?;
    Ok(id)
}

/// Append entries with consecutive ids; returns the ids in input order.
/// Callers wanting all-or-nothing pass a transaction.
pub fn insert_entries(
    conn: &Connection,
    ctx: &UserContext,
    entries: Vec<NewEntry>,
) -> Result<Vec<i64>> {
    let start = next_id(conn, ctx)?;
    let mut ids = Vec::with_capacity(entries.len());
    let mut stmt = conn.prepare(
        "INSERT INTO records(username, id, date, book, category, item, amount, type)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    for (offset, e) in entries.into_iter().enumerate() {
        let id = start + offset as i64;
        stmt.execute(params![
            ctx.username,
            id,
            e.date.to_string(),
            e.book.label(),
            e.category.label(),
            e.item,
            e.amount.abs().to_string(),
            e.kind.as_str(),
        ])?;
        ids.push(id);
    }
    if let Some(last) = ids.last() {
        conn.execute(
            "UPDATE users SET next_record_id=?1 WHERE username=?2",
            params![last + 1, ctx.username],
        )?;
        log::info!("added {} record(s) for '{}'", ids.len(), ctx.username);
    }
    Ok(ids)
}

pub fn add_entry(conn: &Connection, ctx: &UserContext, entry: NewEntry) -> Result<i64> {
    let ids = insert_entries(conn, ctx, vec![entry])?;
    ids.first()
        .copied()
        .ok_or_else(|| anyhow!("record was not inserted"))
}

fn entry_from_row(r: &Row<'_>) -> Result<LedgerEntry> {
    let id: i64 = r.get(0)?;
    let date: String = r.get(1)?;
    let book: String = r.get(2)?;
    let category: String = r.get(3)?;
    let item: String = r.get(4)?;
    let amount: String = r.get(5)?;
    let kind: String = r.get(6)?;
    Ok(LedgerEntry {
        id,
        date: parse_date(&date).with_context(|| format!("Record {} has a bad date", id))?,
        book: Book::parse(&book),
        category: Category::parse(&category),
        item,
        amount: amount
            .parse::<Decimal>()
            .with_context(|| format!("Invalid amount '{}' in record {}", amount, id))?,
        kind: EntryType::from_db(&kind)
            .ok_or_else(|| anyhow!("Invalid type '{}' in record {}", kind, id))?,
    })
}

/// Every record of the user, oldest first.
pub fn load_entries(conn: &Connection, ctx: &UserContext) -> Result<Vec<LedgerEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, book, category, item, amount, type FROM records
         WHERE username=?1 ORDER BY date, id",
    )?;
    let mut rows = stmt.query(params![ctx.username])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        out.push(entry_from_row(r)?);
    }
    Ok(out)
}

pub fn get_entry(conn: &Connection, ctx: &UserContext, id: i64) -> Result<LedgerEntry> {
    let mut stmt = conn.prepare(
        "SELECT id, date, book, category, item, amount, type FROM records
         WHERE username=?1 AND id=?2",
    )?;
    let mut rows = stmt.query(params![ctx.username, id])?;
    match rows.next()? {
        Some(r) => entry_from_row(r),
        None => Err(LedgerError::EntryNotFound(id).into()),
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub kinds: Vec<EntryType>,
    pub books: Vec<Book>,
    pub categories: Vec<Category>,
    pub keyword: Option<String>,
    pub limit: Option<usize>,
}

impl RecordFilter {
    pub fn from_matches(sub: &clap::ArgMatches) -> Result<Self> {
        let kinds = sub
            .get_many::<String>("type")
            .map(|v| v.map(|s| parse_entry_type(s)).collect::<Result<Vec<_>>>())
            .transpose()?
            .unwrap_or_default();
        let books = sub
            .get_many::<String>("book")
            .map(|v| v.map(|s| Book::parse(s)).collect())
            .unwrap_or_default();
        let categories = sub
            .get_many::<String>("category")
            .map(|v| v.map(|s| Category::parse(s)).collect())
            .unwrap_or_default();
        let keyword = sub
            .get_one::<String>("keyword")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let limit = sub.get_one::<usize>("limit").copied();
        Ok(RecordFilter {
            kinds,
            books,
            categories,
            keyword,
            limit,
        })
    }

    pub fn matches(&self, e: &LedgerEntry) -> bool {
        if !self.kinds.is_empty() && !self.kinds.contains(&e.kind) {
            return false;
        }
        if !self.books.is_empty() && !self.books.contains(&e.book) {
            return false;
        }
        if !self.categories.is_empty() && !self.categories.contains(&e.category) {
            return false;
        }
        match &self.keyword {
            Some(kw) => {
                e.item.contains(kw.as_str())
                    || e.category.label().contains(kw.as_str())
                    || e.book.label().contains(kw.as_str())
            }
            None => true,
        }
    }
}

/// Newest first (date, then id), filtered.
pub fn query_rows(
    conn: &Connection,
    ctx: &UserContext,
    filter: &RecordFilter,
) -> Result<Vec<LedgerEntry>> {
    let mut rows: Vec<LedgerEntry> = load_entries(conn, ctx)?
        .into_iter()
        .filter(|e| filter.matches(e))
        .collect();
    rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
    if let Some(limit) = filter.limit {
        rows.truncate(limit);
    }
    Ok(rows)
}

fn list(conn: &Connection, ctx: &UserContext, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let filter = RecordFilter::from_matches(sub)?;
    let data = query_rows(conn, ctx, &filter)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|e| {
                vec![
                    e.id.to_string(),
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
            pretty_table(
                &["ID", "Date", "Book", "Category", "Item", "Amount", "Type"],
                rows,
            )
        );
        println!("{} record(s)", data.len());
    }
    Ok(())
}

/// Field-level change to one record; `None` leaves the field alone.
#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
    pub date: Option<chrono::NaiveDate>,
    pub book: Option<Book>,
    pub category: Option<Category>,
    pub item: Option<String>,
    pub amount: Option<Decimal>,
    pub kind: Option<EntryType>,
}

pub fn update_entry(
    conn: &Connection,
    ctx: &UserContext,
    id: i64,
    patch: EntryPatch,
) -> Result<LedgerEntry> {
    let mut e = get_entry(conn, ctx, id)?;
    if let Some(d) = patch.date {
        e.date = d;
    }
    if let Some(b) = patch.book {
        e.book = b;
    }
    if let Some(c) = patch.category {
        e.category = c;
    }
    if let Some(i) = patch.item {
        e.item = i;
    }
    if let Some(a) = patch.amount {
        e.amount = a;
    }
    if let Some(k) = patch.kind {
        e.kind = k;
    }
    conn.execute(
        "UPDATE records SET date=?1, book=?2, category=?3, item=?4, amount=?5, type=?6
         WHERE username=?7 AND id=?8",
        params![
            e.date.to_string(),
            e.book.label(),
            e.category.label(),
            e.item,
            e.amount.to_string(),
            e.kind.as_str(),
            ctx.username,
            id
        ],
    )?;
    log::info!("edited record {} for '{}'", id, ctx.username);
    Ok(e)
}

fn edit(conn: &Connection, ctx: &UserContext, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let patch = EntryPatch {
        date: sub.get_one::<String>("date").map(|d| parse_date(d)).transpose()?,
        book: sub.get_one::<String>("book").map(|b| Book::parse(b)),
        category: sub.get_one::<String>("category").map(|c| Category::parse(c)),
        item: sub.get_one::<String>("item").map(|i| i.trim().to_string()),
        amount: sub
            .get_one::<String>("amount")
            .map(|a| parse_manual_amount(a))
            .transpose()?,
        kind: sub
            .get_one::<String>("type")
            .map(|t| parse_entry_type(t))
            .transpose()?,
    };
    let e = update_entry(conn, ctx, id, patch)?;
    println!(
        "Updated #{}: {} {} {} {} '{}' {}",
        e.id,
        e.date,
        e.kind,
        e.book,
        e.category,
        e.item,
        fmt_money(&e.amount)
    );
    Ok(())
}

/// Overwrite one column on every listed record. Ids that do not exist are
/// ignored; returns the number of rows changed.
pub fn set_column(
    conn: &Connection,
    ctx: &UserContext,
    ids: &[i64],
    column: &str,
    value: &str,
) -> Result<usize> {
    let (col, stored) = match column.trim().to_lowercase().as_str() {
        "date" => ("date", parse_date(value)?.to_string()),
        "book" => ("book", Book::parse(value).label().to_string()),
        "category" => ("category", Category::parse(value).label().to_string()),
        "item" => ("item", value.trim().to_string()),
        "amount" => ("amount", parse_manual_amount(value)?.to_string()),
        "type" => ("type", parse_entry_type(value)?.as_str().to_string()),
        other => return Err(LedgerError::UnknownColumn(other.to_string()).into()),
    };
    if ids.is_empty() {
        return Ok(0);
    }
    let placeholders = vec!["?"; ids.len()].join(",");
    let sql = format!(
        "UPDATE records SET {}=? WHERE username=? AND id IN ({})",
        col, placeholders
    );
    let mut args: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(stored), Box::new(ctx.username.clone())];
    for id in ids {
        args.push(Box::new(*id));
    }
    let n = conn.execute(&sql, params_from_iter(args.iter()))?;
    log::info!("set {} on {} record(s) for '{}'", col, n, ctx.username);
    Ok(n)
}

fn set(conn: &Connection, ctx: &UserContext, sub: &clap::ArgMatches) -> Result<()> {
    let ids = parse_ids(sub.get_one::<String>("ids").unwrap())?;
    let column = sub.get_one::<String>("column").unwrap();
    let value = sub.get_one::<String>("value").unwrap();
    let n = set_column(conn, ctx, &ids, column, value)?;
    println!("Updated {} on {} record(s)", column, n);
    Ok(())
}

pub fn delete_entries(conn: &Connection, ctx: &UserContext, ids: &[i64]) -> Result<usize> {
    let mut stmt = conn.prepare("DELETE FROM records WHERE username=?1 AND id=?2")?;
    let mut n = 0;
    for id in ids {
        n += stmt.execute(params![ctx.username, id])?;
    }
    log::info!("deleted {} record(s) for '{}'", n, ctx.username);
    Ok(n)
}

fn rm(conn: &mut Connection, ctx: &UserContext, sub: &clap::ArgMatches) -> Result<()> {
    let raw: Vec<&str> = sub
        .get_many::<String>("ids")
        .map(|v| v.map(String::as_str).collect())
        .unwrap_or_default();
    let ids = parse_ids(&raw.join(","))?;
    if ids.is_empty() {
        println!("No record ids given");
        return Ok(());
    }
    let tx = conn.transaction()?;
    let n = delete_entries(&tx, ctx, &ids)?;
    tx.commit()?;
    println!("Deleted {} record(s)", n);
    Ok(())
}

pub fn clear(conn: &Connection, ctx: &UserContext) -> Result<usize> {
    let n = conn.execute(
        "DELETE FROM records WHERE username=?1",
        params![ctx.username],
    )?;
    log::info!("cleared {} record(s) for '{}'", n, ctx.username);
    Ok(n)
}

fn clear_cmd(conn: &Connection, ctx: &UserContext, sub: &clap::ArgMatches) -> Result<()> {
    if !sub.get_flag("yes") {
        println!("Refusing to clear every record without --yes");
        return Ok(());
    }
    let n = clear(conn, ctx)?;
    println!("Cleared {} record(s)", n);
    Ok(())
}
