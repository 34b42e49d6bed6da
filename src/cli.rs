// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{crate_version, value_parser, Arg, ArgAction, ArgGroup, Command};
use std::path::PathBuf;

fn with_output_flags(cmd: Command) -> Command {
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
            .help("Print as JSON lines"),
    )
}

fn required(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).required(true).help(help)
}

fn optional(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help)
}

fn positional(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).required(true).help(help)
}

fn month_arg(help: &'static str) -> Arg {
    optional("month", help)
}

fn flow_arg() -> Arg {
    Arg::new("flow")
        .long("flow")
        .value_parser(["income", "expense"])
        .help("income or expense")
}

fn user_cmd() -> Command {
    Command::new("user")
        .about("Register, check a login, reset a password")
        .subcommand_required(true)
        .subcommand(
            Command::new("register")
                .about("Create a user from --user/--password and seed default categories")
                .arg(required("email", "Email address"))
                .arg(required("phone", "11-digit phone number")),
        )
        .subcommand(with_output_flags(
            Command::new("login-check")
                .about("Verify credentials; with --service, a linked QQ/WeChat account")
                .arg(optional("service", "QQ or WeChat")),
        ))
        .subcommand(
            Command::new("reset")
                .about("Request a reset code, or set a new password with one")
                .arg(optional("identifier", "Username, email or phone to issue a code for"))
                .arg(optional("code", "Reset code").requires("new-password"))
                .arg(optional("new-password", "New password").requires("code"))
                .group(
                    ArgGroup::new("step")
                        .args(["identifier", "code"])
                        .required(true),
                ),
        )
}

fn category_cmd() -> Command {
    Command::new("category")
        .about("Manage categories")
        .subcommand_required(true)
        .subcommand(Command::new("add").arg(positional("name", "Category name")))
        .subcommand(with_output_flags(Command::new("list")))
        .subcommand(
            Command::new("rename")
                .arg(positional("category", "Category id or name"))
                .arg(positional("name", "New name")),
        )
        .subcommand(Command::new("rm").arg(positional("category", "Category id or name")))
}

fn tx_cmd() -> Command {
    Command::new("tx")
        .about("Record and browse transactions")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Positive amounts are income, negative are expenses")
                .arg(required("amount", "Amount, e.g. -12.50").allow_hyphen_values(true))
                .arg(required("date", "YYYY-MM-DD"))
                .arg(optional("category", "Category id or name"))
                .arg(
                    Arg::new("auto-category")
                        .long("auto-category")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("category")
                        .help("Ask the advice service to pick a category from the note"),
                )
                .arg(optional("note", "Free-text note"))
                .group(
                    ArgGroup::new("categorized")
                        .args(["category", "auto-category"])
                        .required(true),
                ),
        )
        .subcommand(with_output_flags(
            Command::new("list")
                .arg(month_arg("YYYY-MM"))
                .arg(optional("category", "Category id or name"))
                .arg(flow_arg())
                .arg(optional("from", "First date, YYYY-MM-DD"))
                .arg(optional("to", "Last date, YYYY-MM-DD"))
                .arg(optional("min", "Smallest signed amount").allow_hyphen_values(true))
                .arg(optional("max", "Largest signed amount").allow_hyphen_values(true))
                .arg(optional("holiday", "Holiday id or name"))
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(usize)),
                ),
        ))
        .subcommand(
            Command::new("edit")
                .arg(positional("id", "Transaction id"))
                .arg(optional("amount", "New amount").allow_hyphen_values(true))
                .arg(optional("date", "New date"))
                .arg(optional("category", "New category id or name"))
                .arg(optional("note", "New note")),
        )
        .subcommand(Command::new("rm").arg(positional("id", "Transaction id")))
        .subcommand(with_output_flags(
            Command::new("search").arg(positional("keyword", "Text to find in notes")),
        ))
}

fn budget_cmd() -> Command {
    Command::new("budget")
        .about("Monthly budgets")
        .subcommand_required(true)
        .subcommand(
            Command::new("set")
                .about("Without --category, sets the month's total budget")
                .arg(required("month", "YYYY-MM"))
                .arg(optional("category", "Category id or name"))
                .arg(required("amount", "Budget amount")),
        )
        .subcommand(with_output_flags(Command::new("list").arg(month_arg("YYYY-MM"))))
        .subcommand(with_output_flags(
            Command::new("status").arg(month_arg("YYYY-MM, defaults to the current month")),
        ))
        .subcommand(Command::new("rm").arg(positional("id", "Budget id")))
}

fn holiday_cmd() -> Command {
    Command::new("holiday")
        .about("Named date ranges for filtering")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .arg(required("name", "Holiday name"))
                .arg(required("start", "YYYY-MM-DD"))
                .arg(required("end", "YYYY-MM-DD")),
        )
        .subcommand(with_output_flags(Command::new("list")))
        .subcommand(Command::new("rm").arg(positional("holiday", "Holiday id or name")))
}

fn account_cmd() -> Command {
    Command::new("account")
        .about("Linked QQ/WeChat accounts")
        .subcommand_required(true)
        .subcommand(
            Command::new("link")
                .arg(required("service", "QQ or WeChat"))
                .arg(required("account-user", "Username on the service"))
                .arg(required("account-password", "Password on the service")),
        )
        .subcommand(with_output_flags(Command::new("list")))
        .subcommand(Command::new("rm").arg(required("service", "QQ or WeChat")))
}

fn threshold_cmd() -> Command {
    Command::new("threshold")
        .about("Abnormal-expense thresholds per category")
        .subcommand_required(true)
        .subcommand(
            Command::new("set")
                .arg(required("item", "Category name"))
                .arg(required("amount", "Largest normal expense")),
        )
        .subcommand(with_output_flags(Command::new("list")))
        .subcommand(Command::new("rm").arg(positional("item", "Category name")))
        .subcommand(with_output_flags(
            Command::new("check").about("List expenses above their category's threshold"),
        ))
}

fn report_cmd() -> Command {
    Command::new("report")
        .about("Aggregates over your transactions")
        .subcommand_required(true)
        .subcommand(with_output_flags(
            Command::new("summary")
                .about("Totals per category")
                .arg(month_arg("YYYY-MM"))
                .arg(flow_arg().default_value("expense")),
        ))
        .subcommand(with_output_flags(
            Command::new("monthly")
                .about("Totals per month")
                .arg(flow_arg().default_value("expense")),
        ))
        .subcommand(with_output_flags(
            Command::new("top")
                .about("Largest transactions")
                .arg(month_arg("YYYY-MM"))
                .arg(flow_arg().default_value("expense"))
                .arg(
                    Arg::new("n")
                        .long("n")
                        .value_parser(value_parser!(usize))
                        .default_value("5"),
                ),
        ))
        .subcommand(with_output_flags(
            Command::new("net")
                .about("Expenses between two dates, inclusive")
                .arg(required("from", "YYYY-MM-DD"))
                .arg(required("to", "YYYY-MM-DD")),
        ))
        .subcommand(with_output_flags(
            Command::new("overview")
                .about("Income, expense and savings with per-category totals")
                .arg(month_arg("YYYY-MM")),
        ))
}

pub fn build_cli() -> Command {
    Command::new("finsage")
        .version(crate_version!())
        .about("Personal finance ledger with budgets, reports and AI advice")
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Directory holding the data tables"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging on stderr"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .global(true)
                .env("FINSAGE_USER")
                .help("Username, email or phone to act as"),
        )
        .arg(
            Arg::new("password")
                .long("password")
                .global(true)
                .env("FINSAGE_PASSWORD")
                .hide_env_values(true)
                .help("Password for --user"),
        )
        .subcommand(Command::new("init").about("Create the data tables"))
        .subcommand(Command::new("doctor").about("Check tables for damage and dangling references"))
        .subcommand(user_cmd())
        .subcommand(category_cmd())
        .subcommand(tx_cmd())
        .subcommand(budget_cmd())
        .subcommand(holiday_cmd())
        .subcommand(account_cmd())
        .subcommand(threshold_cmd())
        .subcommand(report_cmd())
        .subcommand(
            Command::new("import").subcommand(
                Command::new("transactions")
                    .about("amount,date,categoryId[,note] CSV")
                    .arg(required("path", "CSV file")),
            ),
        )
        .subcommand(
            Command::new("export").subcommand(
                Command::new("transactions")
                    .arg(
                        Arg::new("format")
                            .long("format")
                            .value_parser(["csv", "json"])
                            .default_value("csv"),
                    )
                    .arg(required("out", "Output file")),
            ),
        )
        .subcommand(
            Command::new("advise")
                .about("Ask for advice on your finances")
                .arg(Arg::new("question").help("Your question"))
                .arg(
                    Arg::new("insight")
                        .long("insight")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("question")
                        .help("A written report on the month's transactions instead"),
                )
                .arg(month_arg("Month for --insight, YYYY-MM")),
        )
        .subcommand(with_output_flags(
            Command::new("forecast")
                .about("Predict next month's expenses per category")
                .arg(month_arg("Month to predict, YYYY-MM; defaults to next month")),
        ))
}
