// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn period_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("year")
            .long("year")
            .action(ArgAction::Append)
            .value_parser(value_parser!(i32))
            .help("Calendar year (repeatable)"),
    )
    .arg(
        Arg::new("month")
            .long("month")
            .action(ArgAction::Append)
            .conflicts_with("year")
            .help("YYYY-MM (repeatable)"),
    )
    .arg(
        Arg::new("from")
            .long("from")
            .conflicts_with_all(["year", "month"])
            .help("Range start YYYY-MM-DD (inclusive)"),
    )
    .arg(
        Arg::new("to")
            .long("to")
            .conflicts_with_all(["year", "month"])
            .help("Range end YYYY-MM-DD (inclusive)"),
    )
    .arg(
        Arg::new("type")
            .long("type")
            .action(ArgAction::Append)
            .help("income|expense (repeatable)"),
    )
}

fn amount_arg(required: bool) -> Arg {
    Arg::new("amount")
        .long("amount")
        .required(required)
        .allow_hyphen_values(true)
        .help("Amount; currency symbols and thousands separators are ignored")
}

pub fn build_cli() -> Command {
    Command::new("tallybook")
        .about("Personal income/expense ledger with memo-text import and budgets")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("home")
                .long("home")
                .global(true)
                .env("TALLYBOOK_HOME")
                .help("Data directory (database and session file)"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("auth")
                .about("Users and sessions")
                .subcommand(
                    Command::new("register")
                        .arg(Arg::new("username").required(true))
                        .arg(
                            Arg::new("password")
                                .long("password")
                                .env("TALLYBOOK_PASSWORD")
                                .hide_env_values(true)
                                .required(true),
                        ),
                )
                .subcommand(
                    Command::new("login")
                        .arg(Arg::new("username").required(true))
                        .arg(
                            Arg::new("password")
                                .long("password")
                                .env("TALLYBOOK_PASSWORD")
                                .hide_env_values(true)
                                .required(true),
                        )
                        .arg(
                            Arg::new("remember")
                                .long("remember")
                                .action(ArgAction::SetTrue)
                                .help("Keep the session for TALLYBOOK_SESSION_DAYS instead of 12 hours"),
                        ),
                )
                .subcommand(Command::new("logout"))
                .subcommand(Command::new("whoami")),
        )
        .subcommand(
            Command::new("config")
                .about("Starting balance and profile")
                .subcommand(json_flags(Command::new("show")))
                .subcommand(
                    Command::new("balance").arg(
                        Arg::new("amount")
                            .required(true)
                            .allow_hyphen_values(true),
                    ),
                )
                .subcommand(
                    Command::new("profile")
                        .arg(Arg::new("nickname").long("nickname"))
                        .arg(Arg::new("avatar").long("avatar")),
                )
                .subcommand(
                    Command::new("export").arg(Arg::new("out").long("out").required(true)),
                ),
        )
        .subcommand(
            Command::new("category")
                .about("Suggested categories and books")
                .subcommand(Command::new("list").arg(Arg::new("type").long("type")))
                .subcommand(Command::new("books")),
        )
        .subcommand(
            Command::new("tx")
                .about("Ledger records")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("date").long("date").help("YYYY-MM-DD, default today"))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .default_value("expense")
                                .help("income|expense"),
                        )
                        .arg(Arg::new("book").long("book"))
                        .arg(Arg::new("category").long("category"))
                        .arg(
                            Arg::new("custom")
                                .long("custom")
                                .help("Category name used when --category is Other/其他"),
                        )
                        .arg(Arg::new("item").long("item"))
                        .arg(amount_arg(true)),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(Arg::new("type").long("type").action(ArgAction::Append))
                        .arg(Arg::new("book").long("book").action(ArgAction::Append))
                        .arg(
                            Arg::new("category")
                                .long("category")
                                .action(ArgAction::Append),
                        )
                        .arg(
                            Arg::new("keyword")
                                .long("keyword")
                                .help("Substring of item, category or book"),
                        )
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                ))
                .subcommand(
                    Command::new("edit")
                        .arg(
                            Arg::new("id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(Arg::new("date").long("date"))
                        .arg(Arg::new("type").long("type"))
                        .arg(Arg::new("book").long("book"))
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("item").long("item"))
                        .arg(amount_arg(false)),
                )
                .subcommand(
                    Command::new("set")
                        .about("Overwrite one column on many records")
                        .arg(
                            Arg::new("ids")
                                .long("ids")
                                .required(true)
                                .help("Comma-separated record ids"),
                        )
                        .arg(
                            Arg::new("column")
                                .long("column")
                                .required(true)
                                .help("date|book|category|item|amount|type"),
                        )
                        .arg(
                            Arg::new("value")
                                .long("value")
                                .required(true)
                                .allow_hyphen_values(true),
                        ),
                )
                .subcommand(
                    Command::new("rm").arg(
                        Arg::new("ids")
                            .required(true)
                            .num_args(1..)
                            .help("Record ids"),
                    ),
                )
                .subcommand(
                    Command::new("clear").arg(
                        Arg::new("yes")
                            .long("yes")
                            .action(ArgAction::SetTrue)
                            .help("Confirm deleting every record"),
                    ),
                ),
        )
        .subcommand(
            Command::new("import")
                .about("Import CSV/XLSX files or memo text")
                .subcommand(
                    Command::new("file")
                        .arg(Arg::new("path").long("path").required(true))
                        .arg(
                            Arg::new("preview")
                                .long("preview")
                                .action(ArgAction::SetTrue)
                                .help("Show headers and the first rows only"),
                        )
                        .arg(Arg::new("date_col").long("date-col"))
                        .arg(Arg::new("amount_col").long("amount-col"))
                        .arg(Arg::new("type_col").long("type-col"))
                        .arg(Arg::new("category_col").long("category-col"))
                        .arg(Arg::new("book_col").long("book-col"))
                        .arg(Arg::new("item_col").long("item-col")),
                )
                .subcommand(
                    Command::new("memo")
                        .arg(
                            Arg::new("path")
                                .long("path")
                                .help("Text file, or '-' / omitted for stdin"),
                        )
                        .arg(
                            Arg::new("dry_run")
                                .long("dry-run")
                                .action(ArgAction::SetTrue),
                        )
                        .arg(Arg::new("json").long("json").action(ArgAction::SetTrue)),
                ),
        )
        .subcommand(
            Command::new("export")
                .subcommand(
                    Command::new("records")
                        .arg(Arg::new("format").long("format").default_value("csv"))
                        .arg(Arg::new("out").long("out").required(true)),
                )
                .subcommand(
                    Command::new("template").arg(Arg::new("out").long("out").required(true)),
                ),
        )
        .subcommand(
            Command::new("report")
                .subcommand(json_flags(Command::new("dashboard")))
                .subcommand(json_flags(period_args(Command::new("summary"))))
                .subcommand(json_flags(period_args(Command::new("trend")))),
        )
        .subcommand(
            Command::new("budget")
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("month").long("month").required(true))
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(Arg::new("type").long("type").default_value("expense"))
                        .arg(amount_arg(true)),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(Arg::new("month").long("month").action(ArgAction::Append)),
                ))
                .subcommand(json_flags(
                    Command::new("compare")
                        .arg(Arg::new("month").long("month").action(ArgAction::Append)),
                )),
        )
        .subcommand(Command::new("doctor").about("Check stored records for problems"))
}
