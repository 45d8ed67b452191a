use std::process::{Command, Output};

fn tgrade_tools(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tgrade-tools"))
        // unreachable endpoint so nothing here talks to a real node
        .args(["--grpc-url", "http://127.0.0.1:1"])
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

#[test]
fn test_cli_help() {
    let output = tgrade_tools(&["--help"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("compound"));
    assert!(stdout.contains("exporter"));
    assert!(stdout.contains("query"));

    println!("✅ CLI help command works correctly");
}

#[test]
fn test_cli_query_alias_help() {
    let output = tgrade_tools(&["q", "--help"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("spendable-balances"));
    assert!(stdout.contains("vesting-account"));

    println!("✅ CLI query alias works correctly");
}

#[test]
fn test_cli_invalid_command() {
    let output = tgrade_tools(&["invalid-command"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error"));

    println!("✅ CLI correctly rejects invalid commands");
}

#[test]
fn test_cli_compound_rejects_foreign_denom() {
    let output = tgrade_tools(&["compound", "--min-amount", "2atom"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("utgd denom required"), "stderr: {stderr}");

    println!("✅ CLI rejects non utgd amounts");
}

#[test]
fn test_cli_compound_requires_signer() {
    let output = tgrade_tools(&["compound", "--min-amount", "2tgd", "--reserve-amount", "0utgd"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("signer"), "stderr: {stderr}");
}

#[test]
fn test_cli_query_rejects_invalid_address() {
    let output = tgrade_tools(&["query", "spendable-balances", "cosmos1notanaddress"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cosmos1notanaddress"), "stderr: {stderr}");
}

#[test]
fn test_cli_exporter_rejects_bad_listen_address() {
    let addr = "tgrade1wl59k23zngj34l7d42y9yltask7rjlnxgccawc7ltrknp6n52fps2p2ent";
    let output = tgrade_tools(&["exporter", addr, "--prometheus-listen-address", "nowhere"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid prometheus listener address"), "stderr: {stderr}");
}
