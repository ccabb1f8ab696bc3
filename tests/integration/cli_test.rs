//! CLI tests for the tdstrip binary

use super::helpers::{extract_fixture, fixtures_dir, load_fixture, temp_fixture};

use assert_cmd::Command;
use predicates::prelude::*;

use tdstream::Vendor;

fn tdstrip() -> Command {
    Command::from_std(std::process::Command::new(env!("CARGO_BIN_EXE_tdstrip")))
}

#[test]
fn extracts_a_sun_log_given_as_a_file() {
    let expected = extract_fixture(Vendor::Sun, "sun_threads.log");
    tdstrip()
        .args(["-t", "sun"])
        .arg(fixtures_dir().join("sun_threads.log"))
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn reads_standard_input_when_no_file_is_given() {
    let expected = extract_fixture(Vendor::Ibm, "ibm_javacore.txt");
    tdstrip()
        .args(["--type", "ibm"])
        .write_stdin(load_fixture("ibm_javacore.txt"))
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn defaults_to_the_sun_format() {
    tdstrip()
        .write_stdin("")
        .assert()
        .success()
        .stdout("<?xml version=\"1.0\"?>\n<dumps>\n</dumps>\n");
}

#[test]
fn works_from_any_file_location() {
    let (_temp_dir, path) = temp_fixture("ibm_javacore.txt");
    let expected = extract_fixture(Vendor::Ibm, "ibm_javacore.txt");
    tdstrip()
        .args(["-t", "ibm"])
        .arg(path)
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn rejects_unknown_format_types() {
    tdstrip()
        .args(["-t", "jrockit"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown dump format"));
}

#[test]
fn reports_unreadable_input_files() {
    tdstrip()
        .arg(fixtures_dir().join("no_such_file.log"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open"));
}
