mod common;

use common::cmd;
use predicates::prelude::*;

#[test]
fn help_lists_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("import"))
        .stdout(predicate::str::contains("stamp"))
        .stdout(predicate::str::contains("report"))
        .stdout(predicate::str::contains("runs"));
}

#[test]
fn import_help_shows_options() {
    cmd()
        .args(["import", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--cut-ratio"))
        .stdout(predicate::str::contains("--prefix"))
        .stdout(predicate::str::contains("--archive"))
        .stdout(predicate::str::contains("--no-fallback"));
}

#[test]
fn import_requires_a_file() {
    cmd().arg("import").assert().failure();
}

#[test]
fn out_and_archive_conflict() {
    cmd()
        .args(["import", "a.pdf", "--out", "dir", "--archive", "a.zip"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn stamp_requires_output() {
    cmd()
        .args(["stamp", "a.pdf", "--line", "A=B"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--output"));
}

#[test]
fn unknown_mode_is_rejected() {
    cmd()
        .args(["stamp", "a.pdf", "--mode", "diagonal", "-o", "out.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("diagonal"));
}
