use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_demo_happy_path_settles_batch() {
    let mut cmd = Command::new(cargo_bin!("paylock"));
    cmd.args(["--balance", "1000.00", "--amount", "100.00", "--count", "3"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Transaction completed successfully"))
        .stdout(predicate::str::contains(
            "Settlement batch created successfully",
        ));
}

#[test]
fn test_demo_retryable_outcome_leaves_nothing_to_settle() {
    let mut cmd = Command::new(cargo_bin!("paylock"));
    cmd.args(["--outcome-code", "01", "--count", "1"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Transaction initiated"))
        .stdout(predicate::str::contains(
            "No transactions available for settlement",
        ));
}

#[test]
fn test_demo_insufficient_funds_is_reported() {
    let mut cmd = Command::new(cargo_bin!("paylock"));
    cmd.args(["--balance", "50.00", "--amount", "100.00", "--count", "1"]);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("INSUFFICIENT_FUNDS"));
}
