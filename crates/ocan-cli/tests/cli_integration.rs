// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end tests for the `ocan` binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn ocan() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("ocan").expect("binary `ocan` should be built")
}

#[test]
fn help_exits_zero_and_lists_subcommands() {
    ocan()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("registry"))
        .stdout(predicate::str::contains("replay"));
}

#[test]
fn version_shows_version_string() {
    ocan()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn registry_list_prints_the_demo_instance() {
    ocan()
        .args(["registry", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("counters/demo"));
}

#[test]
fn registry_list_can_filter_to_an_unknown_binding() {
    ocan()
        .args(["registry", "list", "--binding", "widgets"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn replay_runs_a_captured_chain_and_prints_the_encoded_result() {
    // A chain equivalent to `handle.bump(5)` against the demo instance.
    let chain = ocan_core::Value::heap(ocan_core::HeapValue::Chain(
        ocan_core::OperationChain::new()
            .get("bump")
            .apply(vec![ocan_core::ChainArg::Value(ocan_core::Value::Number(5.0))]),
    ));
    let text = ocan_codec::stringify(&chain).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chain.json");
    std::fs::write(&path, text).unwrap();

    ocan()
        .args(["replay", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains('5'));
}

#[test]
fn replay_reports_a_missing_file() {
    ocan()
        .args(["replay", "/nonexistent/chain.json"])
        .assert()
        .failure();
}
