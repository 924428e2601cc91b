// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Book, Category, EntryType};
use crate::utils::{parse_entry_type, pretty_table};
use anyhow::Result;

pub fn handle(m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => {
            let kinds = match sub.get_one::<String>("type") {
                Some(t) => vec![parse_entry_type(t)?],
                None => vec![EntryType::Expense, EntryType::Income],
            };
            let mut data = Vec::new();
            for kind in kinds {
                for c in Category::suggestions(kind) {
                    data.push(vec![kind.to_string(), c.to_string()]);
                }
            }
            println!("{}", pretty_table(&["Type", "Category"], data));
        }
        Some(("books", _)) => {
            let data = Book::VOCABULARY
                .iter()
                .map(|b| vec![b.to_string(), b.alias().unwrap_or_default().to_string()])
                .collect();
            println!("{}", pretty_table(&["Book", "Alias"], data));
        }
        _ => {}
    }
    Ok(())
}
