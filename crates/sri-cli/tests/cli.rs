//! Runs the `sri` binary end to end: JSON on stdout, exit codes.

use std::io::Write;
use std::process::{Command, Output};

use serde_json::{json, Value};
use tempfile::NamedTempFile;

fn sri(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sri"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("sri runs")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

fn temp_json(value: &Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{value}").unwrap();
    file
}

fn shipment_guide() -> Value {
    json!({
        "type": "shipment_guide",
        "header": {
            "issuer": {
                "ruc": "1790016919001",
                "legal_name": "ACME S.A.",
                "main_address": "Av. Amazonas N34-45, Quito"
            },
            "establishment": "001",
            "emission_point": "001",
            "sequential": 3,
            "emission_date": "2026-01-15"
        },
        "origin_address": "Av. Amazonas N34-45, Quito",
        "carrier": { "identification": "0926687856", "legal_name": "Transportes Andinos" },
        "plate": "PBA-1234",
        "transport_start": "2026-01-16",
        "transport_end": "2026-01-17",
        "motive": "01",
        "recipients": [{
            "party": {
                "identification": "1710034065001",
                "legal_name": "Comercial Sierra Cia. Ltda.",
                "address": "Av. 10 de Agosto y Colón, Quito"
            },
            "items": [{ "internal_code": "P-001", "description": "Tornillos", "quantity": "10" }]
        }]
    })
}

#[test]
fn id_reports_validity_through_exit_code() {
    let ok = sri(&["id", "1790016919001"]);
    assert!(ok.status.success());
    let report = stdout_json(&ok);
    assert_eq!(report["id_type"], "04");
    assert_eq!(report["kind"], "private_entity");

    let bad = sri(&["id", "1710034066"]);
    assert_eq!(bad.status.code(), Some(1));
    assert_eq!(stdout_json(&bad)["valid"], false);
}

#[test]
fn key_generate_then_verify() {
    let input = temp_json(&json!({
        "emission_date": "2026-01-15",
        "document_type": "05",
        "issuer": "1790016919001",
        "establishment": "001",
        "emission_point": "002",
        "sequential": 99
    }));
    let path = input.path().to_str().unwrap();

    let generated = sri(&["key", "generate", path, "--fill", "87654321"]);
    assert!(generated.status.success(), "{}", String::from_utf8_lossy(&generated.stderr));
    let report = stdout_json(&generated);
    assert_eq!(report["numeric_fill"], "87654321");
    let key = report["access_key"].as_str().unwrap().to_string();
    assert_eq!(key.len(), 49);

    let again = stdout_json(&sri(&["key", "generate", path, "--fill", "87654321"]));
    assert_eq!(again["access_key"], key.as_str());

    let verified = sri(&["key", "verify", &key]);
    assert!(verified.status.success());
    let report = stdout_json(&verified);
    assert_eq!(report["segments"]["document_type"], "05");
    assert_eq!(report["segments"]["sequential"], "000000099");
}

#[test]
fn key_verify_rejects_garbage() {
    let output = sri(&["key", "verify", "not-a-key"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_json(&output)["valid"], false);
}

#[test]
fn validate_lists_business_violation() {
    let mut guide = shipment_guide();
    guide["motive"] = json!("03");
    let file = temp_json(&guide);
    let output = sri(&["validate", file.path().to_str().unwrap(), "--today", "2026-01-15"]);
    assert_eq!(output.status.code(), Some(1));
    let report = stdout_json(&output);
    assert_eq!(report["document"], "shipment_guide");
    let violations = report["violations"].as_array().unwrap();
    assert!(violations
        .iter()
        .any(|v| v["code"] == "MOTIVE_REQUIRES_REFERENCE" && v["path"] == "reference_document"));
}

#[test]
fn render_prints_key_fill_and_tree() {
    let file = temp_json(&shipment_guide());
    let output = sri(&["render", file.path().to_str().unwrap(), "--today", "2026-01-15"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let issued = stdout_json(&output);
    let key = issued["access_key"].as_str().unwrap();
    let fill = issued["numeric_fill"].as_str().unwrap();
    assert_eq!(&key[39..47], fill);
    assert_eq!(issued["rendered"]["root"]["name"], "guiaRemision");
}

#[test]
fn policy_file_tightens_limits() {
    let mut policy = NamedTempFile::new().unwrap();
    writeln!(policy, "address_min_len: 100").unwrap();
    let file = temp_json(&shipment_guide());
    let output = sri(&[
        "validate",
        file.path().to_str().unwrap(),
        "--today",
        "2026-01-15",
        "--policy",
        policy.path().to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(1));
    let report = stdout_json(&output);
    let violations = report["violations"].as_array().unwrap();
    assert!(violations.iter().any(|v| v["path"] == "origin_address"));
}

#[test]
fn invalid_policy_file_is_an_error() {
    let mut policy = NamedTempFile::new().unwrap();
    writeln!(policy, "shipment_max_recipients: 0").unwrap();
    let file = temp_json(&shipment_guide());
    let output = sri(&[
        "validate",
        file.path().to_str().unwrap(),
        "--policy",
        policy.path().to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to load policy"));
}

#[test]
fn unreadable_input_fails_with_context() {
    let output = sri(&["validate", "/nonexistent/doc.json"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read"));
}
