use assert_cmd::Command;
use chrono::{DateTime, TimeZone, Utc};
use ledger_history_report::{
    id::Id,
    state::{BudgetNode, State},
    store::FileSystemStore,
};
use predicates::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fs;
use tempfile::TempDir;

const HEADER: &str = "Transaction,Time,Amount,Entity,Entity Type\n";

fn time(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, day, 8, 0, 0).unwrap()
}

fn state(a: Decimal) -> State {
    State {
        accounts: [("A".to_string(), a)].into_iter().collect(),
        budget: BudgetNode::new("root", dec!(0)),
    }
}

/// T0 <- T1 <- T2 with A = 10, 15, 15
fn ledger() -> (TempDir, Vec<Id>) {
    let temp_dir = TempDir::new().unwrap();
    let store = FileSystemStore::new(temp_dir.path());
    let ids = [dec!(10), dec!(15), dec!(15)]
        .into_iter()
        .enumerate()
        .map(|(n, a)| store.append(state(a), time(n as u32 + 1), "").unwrap())
        .collect();
    (temp_dir, ids)
}

fn report() -> Command {
    Command::cargo_bin("ledger-report").unwrap()
}

#[test]
fn test_no_arguments() {
    report()
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_too_many_arguments() {
    let (temp_dir, _) = ledger();
    report()
        .arg(temp_dir.path())
        .arg("extra")
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_empty_ledger() {
    let temp_dir = TempDir::new().unwrap();
    report()
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(HEADER);
}

#[test]
fn test_report() {
    let (temp_dir, ids) = ledger();
    let expected = format!("{HEADER}{},2024-02-01T08:00:00Z,5,A,Account\n", ids[0]);

    report()
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn test_report_is_repeatable() {
    let (temp_dir, _) = ledger();
    let first = report().arg(temp_dir.path()).output().unwrap();
    let second = report().arg(temp_dir.path()).output().unwrap();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn test_start_from_older_head() {
    let (temp_dir, ids) = ledger();
    report()
        .arg(temp_dir.path())
        .arg("--head")
        .arg(ids[0].to_string())
        .assert()
        .success()
        .stdout(HEADER);
}

#[test]
fn test_broken_link_is_silent() {
    let (temp_dir, ids) = ledger();
    fs::remove_file(temp_dir.path().join("objects").join(ids[0].to_string())).unwrap();

    report()
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(HEADER)
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_broken_link_strict() {
    let (temp_dir, ids) = ledger();
    fs::remove_file(temp_dir.path().join("objects").join(ids[0].to_string())).unwrap();

    report()
        .arg(temp_dir.path())
        .arg("--strict")
        .assert()
        .code(1)
        .stdout(HEADER)
        .stderr(predicate::str::contains(ids[0].to_string()));
}

#[test]
fn test_missing_ledger_directory() {
    let temp_dir = TempDir::new().unwrap();
    report()
        .arg(temp_dir.path().join("nowhere"))
        .assert()
        .failure()
        .stdout(predicate::str::is_empty());
}
