// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Income,
    Expense,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Income => "income",
            EntryType::Expense => "expense",
        }
    }

    /// Strict decode of the stored column value.
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "income" => Some(EntryType::Income),
            "expense" => Some(EntryType::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named sub-account partition of a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Book {
    MainLiving,
    Car,
    TuitionFx,
    Investment,
    Custom(String),
}

impl Book {
    pub const VOCABULARY: [Book; 4] = [Book::MainLiving, Book::Car, Book::TuitionFx, Book::Investment];

    pub fn label(&self) -> &str {
        match self {
            Book::MainLiving => "生活主账",
            Book::Car => "车子专项",
            Book::TuitionFx => "学费/购汇",
            Book::Investment => "理财账本",
            Book::Custom(s) => s,
        }
    }

    pub fn alias(&self) -> Option<&'static str> {
        match self {
            Book::MainLiving => Some("main living"),
            Book::Car => Some("car"),
            Book::TuitionFx => Some("tuition/fx"),
            Book::Investment => Some("investment"),
            Book::Custom(_) => None,
        }
    }

    /// Labels a free-text scan may match for this book.
    pub fn terms(&self) -> Vec<&str> {
        let mut t = vec![self.label()];
        if let Some(a) = self.alias() {
            t.push(a);
        }
        t
    }

    /// Empty input maps to the default book.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            return Book::default();
        }
        for b in Book::VOCABULARY {
            if b.label() == s || b.alias().is_some_and(|a| a.eq_ignore_ascii_case(s)) {
                return b;
            }
        }
        Book::Custom(s.to_string())
    }
}

impl Default for Book {
    fn default() -> Self {
        Book::MainLiving
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<Book> for String {
    fn from(b: Book) -> String {
        b.label().to_string()
    }
}

impl From<String> for Book {
    fn from(s: String) -> Book {
        Book::parse(&s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Category {
    EatOutside,
    Shopping,
    Bill,
    Petrol,
    Insurance,
    Rent,
    Salary,
    SideProject,
    FamilyGift,
    InvestmentReturn,
    Other,
    Custom(String),
}

impl Category {
    pub const EXPENSE: [Category; 6] = [
        Category::EatOutside,
        Category::Shopping,
        Category::Bill,
        Category::Petrol,
        Category::Insurance,
        Category::Rent,
    ];

    pub const INCOME: [Category; 4] = [
        Category::Salary,
        Category::SideProject,
        Category::FamilyGift,
        Category::InvestmentReturn,
    ];

    pub fn label(&self) -> &str {
        match self {
            Category::EatOutside => "Eat outside",
            Category::Shopping => "Shopping",
            Category::Bill => "Bill",
            Category::Petrol => "Petrol",
            Category::Insurance => "Insurance",
            Category::Rent => "Rent",
            Category::Salary => "工资",
            Category::SideProject => "业余项目",
            Category::FamilyGift => "亲情赠与",
            Category::InvestmentReturn => "理财收益",
            Category::Other => "其他",
            Category::Custom(s) => s,
        }
    }

    /// Expense vocabulary followed by income vocabulary; the order free-text
    /// scans try them in.
    pub fn scan_order() -> impl Iterator<Item = Category> {
        Category::EXPENSE.into_iter().chain(Category::INCOME)
    }

    /// Suggested choices for a type, ending with `Other`.
    pub fn suggestions(kind: EntryType) -> Vec<Category> {
        let mut v: Vec<Category> = match kind {
            EntryType::Expense => Category::EXPENSE.to_vec(),
            EntryType::Income => Category::INCOME.to_vec(),
        };
        v.push(Category::Other);
        v
    }

    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s == Category::Other.label() || s.eq_ignore_ascii_case("other") {
            return Category::Other;
        }
        Category::scan_order()
            .find(|c| c.label().eq_ignore_ascii_case(s))
            .unwrap_or_else(|| Category::Custom(s.to_string()))
    }

    /// A selected `Other` is replaced by non-blank custom text.
    pub fn with_override(self, custom: Option<&str>) -> Self {
        match (self, custom.map(str::trim).filter(|c| !c.is_empty())) {
            (Category::Other, Some(c)) => Category::parse(c),
            (cat, _) => cat,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<Category> for String {
    fn from(c: Category) -> String {
        c.label().to_string()
    }
}

impl From<String> for Category {
    fn from(s: String) -> Category {
        Category::parse(&s)
    }
}

/// Entry as produced by a form, an import, or the memo parser, before an id
/// is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
    pub date: NaiveDate,
    pub book: Book,
    pub category: Category,
    pub item: String,
    pub amount: Decimal, // always >= 0; sign lives in `kind`
    #[serde(rename = "type")]
    pub kind: EntryType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub book: Book,
    pub category: Category,
    pub item: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: EntryType,
}

impl LedgerEntry {
    pub fn month(&self) -> String {
        self.date.format("%Y-%m").to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetEntry {
    pub month: String, // YYYY-MM
    pub category: Category,
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub amount: Decimal,
}

/// Per-user settings persisted as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub init_balance: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}
