// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use finsage::cli;
use finsage::commands::{self, Ctx};
use finsage::config::Config;
use finsage::exporter::{export_transactions, ExportFormat};
use finsage::importer::import_transactions;
use finsage::ledger::{Ledger, NewUser};
use finsage::session::Session;
use rust_decimal::Decimal;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::{tempdir, NamedTempFile};

const PASSWORD: &str = "pa55word#";

fn user(ledger: &Ledger, name: &str, phone: &str) -> Session {
    ledger
        .register(&NewUser {
            username: name,
            email: &format!("{}@example.com", name),
            phone,
            password: PASSWORD,
        })
        .unwrap();
    ledger.login(name, PASSWORD).unwrap()
}

fn csv_file(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", text).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn bad_row_is_skipped_and_the_rest_imported() {
    let dir = tempdir().unwrap();
    let ledger = Ledger::open_dir(dir.path()).unwrap();
    let s = user(&ledger, "frank01", "13600000001");
    let food = ledger.resolve_category(&s, "Food").unwrap();

    let file = csv_file(&format!(
        "Amount,DATE,categoryId,note\n\
         -12.50,2025-03-01,{id},lunch\n\
         -8.00,2025-03-02,{id},coffee\n\
         abc,2025-03-03,{id},broken\n\
         3000,2025-03-05,Salary,pay\n\
         -4.20, 2025-03-06 ,{id},\n",
        id = food.id
    ));

    let report = import_transactions(&ledger, &s, file.path()).unwrap();
    assert_eq!(report.imported_count(), 4);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].line, 4);
    assert!(report.skipped[0].reason.contains("abc"));

    let stored = ledger.list_transactions(&s).unwrap();
    assert_eq!(stored.len(), 4);
    let notes: Vec<&str> = stored.iter().map(|t| t.note.as_str()).collect();
    assert_eq!(notes, ["lunch", "coffee", "pay", ""]);
    let salary = ledger.resolve_category(&s, "Salary").unwrap();
    assert_eq!(stored[2].category_id, salary.id);
}

#[test]
fn rows_with_foreign_or_missing_categories_are_skipped() {
    let dir = tempdir().unwrap();
    let ledger = Ledger::open_dir(dir.path()).unwrap();
    let alice = user(&ledger, "alice02", "13600000002");
    let bob = user(&ledger, "bobby02", "13600000003");
    let alice_food = ledger.resolve_category(&alice, "Food").unwrap();

    let file = csv_file(&format!(
        "amount,date,categoryId\n-1,2025-03-01,{}\n-2,2025-03-01,\n-3,2025-03-01,Food\n0,2025-03-01,Food\n",
        alice_food.id
    ));
    let report = import_transactions(&ledger, &bob, file.path()).unwrap();
    assert_eq!(report.imported_count(), 1);
    let lines: Vec<u64> = report.skipped.iter().map(|s| s.line).collect();
    assert_eq!(lines, [2, 3, 5]);
    assert!(ledger.list_transactions(&alice).unwrap().is_empty());
}

fn run(data_dir: &Path, args: &[&str]) {
    let ledger = Ledger::open_dir(data_dir).unwrap();
    let ctx = Ctx {
        ledger,
        config: Config::with_data_dir(data_dir),
    };
    let mut argv = vec!["finsage", "--user", "grace01", "--password", PASSWORD];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("import", m)) => commands::importer::handle(&ctx, m).unwrap(),
        Some(("export", m)) => commands::exporter::handle(&ctx, m).unwrap(),
        other => panic!("unexpected command {:?}", other.map(|(n, _)| n)),
    }
}

#[test]
fn export_reads_back_through_import() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    let ledger = Ledger::open_dir(&data).unwrap();
    let s = user(&ledger, "grace01", "13600000004");

    let input = csv_file(
        "amount,date,categoryId,note\n-20.00,2025-02-10,Travel,\"taxi, airport\"\n150,2025-02-01,Gifts,\n",
    );
    let padded = format!("  {}  ", input.path().display());
    run(&data, &["import", "transactions", "--path", &padded]);
    assert_eq!(ledger.list_transactions(&s).unwrap().len(), 2);

    let out_csv = dir.path().join("out.csv");
    let out_json = dir.path().join("out.json");
    run(&data, &["export", "transactions", "--out", out_csv.to_str().unwrap()]);
    let n = export_transactions(&ledger, &s, ExportFormat::Json, &out_json).unwrap();
    assert_eq!(n, 2);

    let csv_text = fs::read_to_string(&out_csv).unwrap();
    let mut lines = csv_text.lines();
    assert_eq!(lines.next(), Some("date,amount,category,note"));
    // sorted by date
    assert_eq!(lines.next(), Some("2025-02-01,150.00,Gifts,"));
    assert_eq!(lines.next(), Some("2025-02-10,-20.00,Travel,\"taxi, airport\""));

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out_json).unwrap()).unwrap();
    assert_eq!(json[1]["category"], "Travel");
    assert_eq!(json[1]["note"], "taxi, airport");

    // a second user imports the export
    let h = user(&ledger, "heidi01", "13600000005");
    let report = import_transactions(&ledger, &h, &out_csv).unwrap();
    assert!(report.skipped.is_empty());
    let total: Decimal = ledger
        .list_transactions(&h)
        .unwrap()
        .iter()
        .map(|t| t.amount)
        .sum();
    assert_eq!(total, Decimal::new(130, 0));
}
