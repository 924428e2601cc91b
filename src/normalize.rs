// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Lenient normalizers for user-typed amounts and entry types.

use crate::models::EntryType;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

static STRICT_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?(\d+\.?\d*|\.\d+)$").expect("valid number regex"));

pub const INCOME_SYNONYMS: &[&str] = &["收入", "income", "in", "+", "earning", "earnings", "收"];
pub const EXPENSE_SYNONYMS: &[&str] = &["支出", "expense", "out", "-", "spend", "spending", "支"];

/// Strip currency symbols and separators and read what is left as a number.
///
/// Never fails: anything that does not reduce to a single well-formed
/// number (`""`, `"-"`, `"."`, `"12.3.4"`, `"1-2"`) becomes zero.
pub fn parse_amount(s: &str) -> Decimal {
    let s = s.trim();
    if s.is_empty() {
        return Decimal::ZERO;
    }
    let clean: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if matches!(clean.as_str(), "" | "-" | "." | "-.") || !STRICT_NUMBER.is_match(&clean) {
        return Decimal::ZERO;
    }
    let (neg, digits) = match clean.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, clean.as_str()),
    };
    let digits = digits.trim_end_matches('.');
    let digits = if digits.starts_with('.') {
        format!("0{}", digits)
    } else {
        digits.to_string()
    };
    match digits.parse::<Decimal>() {
        Ok(d) if neg => -d,
        Ok(d) => d,
        Err(_) => Decimal::ZERO,
    }
}

/// Whole-string synonym lookup; `None` when the text names neither type.
pub fn normalize_type(s: &str) -> Option<EntryType> {
    let t = s.trim().to_lowercase();
    if INCOME_SYNONYMS.contains(&t.as_str()) {
        Some(EntryType::Income)
    } else if EXPENSE_SYNONYMS.contains(&t.as_str()) {
        Some(EntryType::Expense)
    } else {
        None
    }
}

/// Case-insensitive containment. ASCII terms must sit on word boundaries so
/// `car` does not fire inside `card`; other scripts match as plain substrings.
pub fn find_term(hay: &str, term: &str) -> Option<usize> {
    if term.is_empty() {
        return None;
    }
    if !term.is_ascii() {
        return hay.find(term);
    }
    let hay_l = hay.to_ascii_lowercase();
    let term_l = term.to_ascii_lowercase();
    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric());
    let mut from = 0;
    while let Some(rel) = hay_l[from..].find(&term_l) {
        let start = from + rel;
        let end = start + term_l.len();
        let before = hay_l[..start].chars().next_back();
        let after = hay_l[end..].chars().next();
        if !is_word(before) && !is_word(after) {
            return Some(start);
        }
        from = start + term_l.len().max(1);
        while !hay_l.is_char_boundary(from) {
            from += 1;
        }
    }
    None
}
