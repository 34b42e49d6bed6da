// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use finsage::error::LedgerError;
use finsage::ledger::{Ledger, NewTransaction, NewUser};
use finsage::models::Month;
use finsage::reports::{self, Flow, TransactionFilter};
use finsage::repos::budgets::Upsert;
use finsage::session::Session;
use finsage::validate::ValidationError;
use rust_decimal::Decimal;
use tempfile::tempdir;

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn setup(ledger: &Ledger, name: &str, phone: &str) -> Session {
    ledger
        .register(&NewUser {
            username: name,
            email: &format!("{}@example.com", name),
            phone,
            password: "pa55word#",
        })
        .unwrap();
    ledger.login(name, "pa55word#").unwrap()
}

fn spend(ledger: &Ledger, session: &Session, amount: i64, day: &str, category: &str, note: &str) {
    let category = ledger.resolve_category(session, category).unwrap();
    ledger
        .add_transaction(
            session,
            NewTransaction {
                amount: Decimal::new(amount, 0),
                date: date(day),
                category_id: category.id,
                note: note.into(),
            },
        )
        .unwrap();
}

#[test]
fn budget_status_tracks_month_spending() {
    let dir = tempdir().unwrap();
    let ledger = Ledger::open_dir(dir.path()).unwrap();
    let s = setup(&ledger, "carol01", "13700000001");
    let march = Month::new(2025, 3).unwrap();

    let first = ledger.set_budget(&s, march, None, Decimal::new(800, 0)).unwrap();
    assert!(matches!(first, Upsert::Inserted(_)));
    let again = ledger.set_budget(&s, march, None, Decimal::new(1000, 0)).unwrap();
    assert!(matches!(again, Upsert::Updated(_)));
    assert_eq!(again.budget().id, first.budget().id);
    assert_eq!(ledger.list_budgets(&s, Some(march)).unwrap().len(), 1);

    spend(&ledger, &s, 3000, "2025-03-01", "Salary", "pay");
    spend(&ledger, &s, -300, "2025-03-04", "Food", "groceries");
    spend(&ledger, &s, -150, "2025-03-20", "Food", "dinner");
    spend(&ledger, &s, -999, "2025-04-01", "Food", "next month");

    let status = ledger.budget_status(&s, march).unwrap();
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].spent, Decimal::new(450, 0));
    assert_eq!(status[0].remaining, Decimal::new(550, 0));
    assert_eq!(status[0].fraction, Decimal::new(45, 2));
    assert!(!status[0].is_over());

    let zero = ledger.set_budget(&s, march, None, Decimal::ZERO).unwrap_err();
    assert!(matches!(
        zero,
        LedgerError::Validation(ValidationError::NotPositive(_))
    ));
}

#[test]
fn aggregation_over_stored_transactions() {
    let dir = tempdir().unwrap();
    let ledger = Ledger::open_dir(dir.path()).unwrap();
    let s = setup(&ledger, "dave001", "13700000002");
    spend(&ledger, &s, 2000, "2025-03-01", "Salary", "");
    spend(&ledger, &s, -300, "2025-03-02", "Food", "");
    spend(&ledger, &s, -150, "2025-03-03", "Food", "");
    spend(&ledger, &s, -50, "2025-03-04", "Transportation", "");

    let all = ledger.list_transactions(&s).unwrap();
    let food = ledger.resolve_category(&s, "food").unwrap();
    let transport = ledger.resolve_category(&s, "Transportation").unwrap();

    let expenses = reports::category_summary(&all, Flow::Expense, None);
    assert_eq!(expenses.len(), 2);
    assert_eq!(expenses[&food.id], Decimal::new(450, 0));
    assert_eq!(expenses[&transport.id], Decimal::new(50, 0));
    assert_eq!(reports::total_amount(&all, Flow::Income, None), Decimal::new(2000, 0));
    assert_eq!(
        ledger
            .transactions()
            .net_expense_in_range(date("2025-03-02"), date("2025-03-03"), s.user_id())
            .unwrap(),
        Decimal::new(450, 0)
    );
}

#[test]
fn holiday_filter_and_abnormal_expenses() {
    let dir = tempdir().unwrap();
    let ledger = Ledger::open_dir(dir.path()).unwrap();
    let s = setup(&ledger, "erin001", "13700000003");
    let holiday = ledger
        .add_holiday(&s, "Spring Festival", date("2025-01-28"), date("2025-02-04"))
        .unwrap();
    assert!(ledger
        .add_holiday(&s, "Backwards", date("2025-05-05"), date("2025-05-01"))
        .is_err());

    spend(&ledger, &s, -80, "2025-01-27", "Food", "before");
    spend(&ledger, &s, -600, "2025-01-30", "Entertainment", "fireworks");
    spend(&ledger, &s, -40, "2025-02-04", "Food", "last day");
    spend(&ledger, &s, -20, "2025-02-05", "Food", "after");

    let all = ledger.list_transactions(&s).unwrap();
    let during = reports::filter(
        &all,
        &TransactionFilter {
            holiday: Some(ledger.resolve_holiday(&s, "Spring Festival").unwrap()),
            ..Default::default()
        },
    );
    let notes: Vec<&str> = during.iter().map(|t| t.note.as_str()).collect();
    assert_eq!(notes, ["fireworks", "last day"]);

    ledger.set_threshold(&s, "entertainment", Decimal::new(500, 0)).unwrap();
    let flagged = ledger.abnormal_expenses(&s).unwrap();
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].category, "Entertainment");
    assert_eq!(flagged[0].transaction.note, "fireworks");

    assert!(ledger.delete_holiday(&s, &holiday.id).unwrap());
    assert!(ledger.list_holidays(&s).unwrap().is_empty());
}

#[test]
fn records_of_other_users_are_out_of_reach() {
    let dir = tempdir().unwrap();
    let ledger = Ledger::open_dir(dir.path()).unwrap();
    let alice = setup(&ledger, "alice99", "13700000004");
    let bob = setup(&ledger, "bobby99", "13700000005");
    spend(&ledger, &alice, -25, "2025-03-01", "Food", "alice lunch");

    let alice_tx = ledger.list_transactions(&alice).unwrap().remove(0);
    assert!(ledger.list_transactions(&bob).unwrap().is_empty());
    assert!(!ledger.delete_transaction(&bob, &alice_tx.id).unwrap());
    assert!(ledger.owned_transaction(&bob, &alice_tx.id).is_err());

    let alice_food = ledger.resolve_category(&alice, "Food").unwrap();
    let bob_food = ledger.resolve_category(&bob, "Food").unwrap();
    assert_ne!(alice_food.id, bob_food.id);
    // bob cannot book against alice's category
    let err = ledger
        .add_transaction(
            &bob,
            NewTransaction {
                amount: Decimal::new(-1, 0),
                date: date("2025-03-02"),
                category_id: alice_food.id.clone(),
                note: String::new(),
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Validation(ValidationError::UnknownCategory(_))
    ));
    assert!(ledger.delete_transaction(&alice, &alice_tx.id).unwrap());
}
