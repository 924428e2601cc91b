// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Heuristic extraction of ledger entries from pasted free text, one entry
//! per line, e.g. `2025-12-01 收入 工资 3000`.

use crate::models::{Book, Category, EntryType, NewEntry};
use crate::normalize::{find_term, parse_amount};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde::Serialize;

use regex::Regex;

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})").expect("valid date regex"));
static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-+]?\d[\d,]*\.?\d*").expect("valid number regex"));
static SPACES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid space regex"));

// Symbols and "in"/"out" are left to the sign fallback; they collide with
// dates and ordinary prose.
const LINE_TYPE_TERMS: &[(&str, EntryType)] = &[
    ("收入", EntryType::Income),
    ("支出", EntryType::Expense),
    ("income", EntryType::Income),
    ("earnings", EntryType::Income),
    ("earning", EntryType::Income),
    ("expense", EntryType::Expense),
    ("spending", EntryType::Expense),
    ("spend", EntryType::Expense),
];

// Single characters that also occur inside words like 支付宝 or 收据; only
// consulted when no full keyword is present.
const LINE_TYPE_CHARS: &[(&str, EntryType)] =
    &[("收", EntryType::Income), ("支", EntryType::Expense)];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    NoDate,
    InvalidDate(String),
    NoAmount,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoDate => f.write_str("no YYYY-MM-DD date"),
            SkipReason::InvalidDate(d) => write!(f, "invalid date '{}'", d),
            SkipReason::NoAmount => f.write_str("no amount"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Parsed(NewEntry),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    pub line_no: usize,
    pub text: String,
    pub reason: SkipReason,
}

/// Result of parsing a pasted block: kept entries in input order plus every
/// non-blank line that was dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemoBatch {
    pub entries: Vec<NewEntry>,
    pub skipped: Vec<SkippedLine>,
}

impl MemoBatch {
    pub fn input_lines(&self) -> usize {
        self.entries.len() + self.skipped.len()
    }
}

pub fn classify_line(line: &str) -> LineOutcome {
    let line = line.trim();
    let Some(caps) = DATE_RE.captures(line) else {
        return LineOutcome::Skipped(SkipReason::NoDate);
    };
    let date_match = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
    let date = match (
        caps[1].parse::<i32>(),
        caps[2].parse::<u32>(),
        caps[3].parse::<u32>(),
    ) {
        (Ok(y), Ok(m), Ok(d)) => NaiveDate::from_ymd_opt(y, m, d),
        _ => None,
    };
    let Some(date) = date else {
        return LineOutcome::Skipped(SkipReason::InvalidDate(date_match.to_string()));
    };

    // Date digits never count as amount candidates.
    let rest = DATE_RE.replace_all(line, " ");
    let Some(token) = NUMBER_RE.find_iter(&rest).last().map(|m| m.as_str()) else {
        return LineOutcome::Skipped(SkipReason::NoAmount);
    };
    let amount = parse_amount(token).abs();

    let kind = type_from_text(&rest)
        .or_else(|| type_from_sign(token))
        .unwrap_or(EntryType::Expense);

    let book = Book::VOCABULARY
        .into_iter()
        .find(|b| b.terms().iter().any(|t| find_term(&rest, t).is_some()))
        .unwrap_or_default();

    let category = Category::scan_order()
        .find(|c| find_term(&rest, c.label()).is_some())
        .unwrap_or(Category::Other);

    let stripped = NUMBER_RE.replace_all(&rest, " ");
    let item = SPACES_RE.replace_all(stripped.trim(), " ").to_string();

    log::debug!(
        "memo line '{}' -> {} {} {} {} '{}' {}",
        line,
        date,
        kind,
        book,
        category,
        item,
        amount
    );
    LineOutcome::Parsed(NewEntry {
        date,
        book,
        category,
        item,
        amount,
        kind,
    })
}

/// Earliest full type keyword decides; bare 收/支 only as a fallback.
fn type_from_text(text: &str) -> Option<EntryType> {
    earliest_term(text, LINE_TYPE_TERMS).or_else(|| earliest_term(text, LINE_TYPE_CHARS))
}

fn earliest_term(text: &str, terms: &[(&str, EntryType)]) -> Option<EntryType> {
    terms
        .iter()
        .filter_map(|(term, kind)| find_term(text, term).map(|pos| (pos, *kind)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, kind)| kind)
}

fn type_from_sign(token: &str) -> Option<EntryType> {
    match token.chars().next() {
        Some('-') => Some(EntryType::Expense),
        Some('+') => Some(EntryType::Income),
        _ => None,
    }
}

pub fn parse_memo(text: &str) -> MemoBatch {
    let mut batch = MemoBatch::default();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        match classify_line(line) {
            LineOutcome::Parsed(e) => batch.entries.push(e),
            LineOutcome::Skipped(reason) => batch.skipped.push(SkippedLine {
                line_no: idx + 1,
                text: line.to_string(),
                reason,
            }),
        }
    }
    batch
}
