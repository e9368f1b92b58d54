//! CLI integration tests.
//!
//! Drives the binary against a temporary store: argument parsing, the
//! upload-inspect-fill workflow, and error codes on stderr.

use assert_cmd::Command;
use docfill::DocumentId;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

mod common;
use common::*;

/// Creates a test Command for the docfill binary.
fn docfill_cmd() -> Command {
    assert_cmd::cargo::cargo_bin_cmd!("docfill")
}

fn store_cmd(store: &Path) -> Command {
    let mut cmd = docfill_cmd();
    cmd.env_remove("RUST_LOG").arg("--store").arg(store);
    cmd
}

/// Uploads the contract template and returns its id.
fn upload_contract(dir: &TempDir) -> DocumentId {
    let template = dir.path().join("contract.docx");
    fs::write(&template, contract_template()).unwrap();

    let output = store_cmd(&dir.path().join("store"))
        .arg("upload")
        .arg(&template)
        .args(["--organization", "Acme Corp"])
        .output()
        .unwrap();
    assert!(output.status.success(), "upload failed: {:?}", output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2 placeholder(s)"), "unexpected output: {}", stdout);
    stdout
        .split_whitespace()
        .find_map(|word| word.parse::<DocumentId>().ok())
        .expect("upload prints the document id")
}

mod argument_parsing {
    use super::*;

    #[test]
    fn test_help_flag() {
        docfill_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("upload"))
            .stdout(predicate::str::contains("fill"))
            .stdout(predicate::str::contains("--store"));
    }

    #[test]
    fn test_version_flag() {
        docfill_cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("docfill"));
    }

    #[test]
    fn test_invalid_document_id() {
        let dir = TempDir::new().unwrap();
        store_cmd(dir.path())
            .args(["keys", "not-a-uuid"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not-a-uuid"));
    }

    #[test]
    fn test_fill_requires_name() {
        let dir = TempDir::new().unwrap();
        store_cmd(dir.path())
            .args(["fill", &DocumentId::new().to_string(), "--set", "#a=1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--name"));
    }
}

mod workflow {
    use super::*;

    #[test]
    fn test_upload_inspect_fill_remove() {
        let dir = TempDir::new().unwrap();
        let store = dir.path().join("store");
        let id = upload_contract(&dir).to_string();

        store_cmd(&store)
            .args(["keys", &id])
            .assert()
            .success()
            .stdout("#date\n#name\n");

        store_cmd(&store)
            .args(["stats", &id, "--json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"total\": 2"))
            .stdout(predicate::str::contains("\"header\": 1"));

        store_cmd(&store)
            .args(["locations", &id, "--json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"location_type\": \"header\""))
            .stdout(predicate::str::contains("\"key\": \"#name\""));

        store_cmd(&store)
            .args(["locations", &id])
            .assert()
            .success()
            .stdout(predicate::str::contains("#name\tparagraph\tparagraph=0"));

        let output_path = dir.path().join("filled.docx");
        store_cmd(&store)
            .args(["fill", &id, "--name", "filled", "--set", "name=Ali"])
            .args(["--set", "#date=01.02.2023", "--output"])
            .arg(&output_path)
            .assert()
            .success()
            .stdout(predicate::str::contains("filled.docx"));

        let bytes = fs::read(&output_path).unwrap();
        assert_has_paragraph(&bytes, "Dear Ali,");
        assert_has_paragraph(&bytes, "Date: 1 fevral 2023 yil");

        store_cmd(&store)
            .args(["remove", &id])
            .assert()
            .success()
            .stdout(predicate::str::contains("Removed"));
        store_cmd(&store)
            .args(["keys", &id])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("NOT_FOUND"));
    }

    #[test]
    fn test_values_file() {
        let dir = TempDir::new().unwrap();
        let store = dir.path().join("store");
        let id = upload_contract(&dir).to_string();

        let values = dir.path().join("values.json");
        fs::write(&values, r##"{"#name": "Vali", "date": "2023-02-01"}"##).unwrap();

        let output_path = dir.path().join("out.docx");
        store_cmd(&store)
            .args(["fill", &id, "--name", "out.docx", "--values"])
            .arg(&values)
            .arg("--output")
            .arg(&output_path)
            .assert()
            .success();
        assert_has_paragraph(&fs::read(&output_path).unwrap(), "Dear Vali,");
    }
}

mod errors {
    use super::*;

    #[test]
    fn test_missing_value_exit_code() {
        let dir = TempDir::new().unwrap();
        let id = upload_contract(&dir).to_string();

        store_cmd(&dir.path().join("store"))
            .args(["fill", &id, "--name", "out", "--set", "#name=Ali"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("MISSING_VALUE"))
            .stderr(predicate::str::contains("#date"));
    }

    #[test]
    fn test_unknown_key_exit_code() {
        let dir = TempDir::new().unwrap();
        let id = upload_contract(&dir).to_string();

        store_cmd(&dir.path().join("store"))
            .args(["fill", &id, "--name", "out", "--set", "#name=Ali"])
            .args(["--set", "#date=1.2.23", "--set", "#unused=x"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("UNKNOWN_KEY"))
            .stderr(predicate::str::contains("#unused"));
    }

    #[test]
    fn test_conversion_failure_exit_code() {
        let dir = TempDir::new().unwrap();
        let id = upload_contract(&dir).to_string();
        let config = dir.path().join("docfill.toml");
        fs::write(
            &config,
            "[converter]\nprogram = \"/nonexistent/soffice\"\ntimeout_secs = 5\n",
        )
        .unwrap();

        store_cmd(&dir.path().join("store"))
            .arg("--config")
            .arg(&config)
            .args(["fill", &id, "--name", "out", "--format", "pdf"])
            .args(["--set", "#name=Ali", "--set", "#date=01.02.2023"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("CONVERSION_FAILED"));
    }

    #[test]
    fn test_invalid_config_file() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("broken.toml");
        fs::write(&config, "[storage\nroot = 1").unwrap();

        store_cmd(dir.path())
            .arg("--config")
            .arg(&config)
            .args(["keys", &DocumentId::new().to_string()])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("CONFIG_ERROR"));
    }

    #[test]
    fn test_upload_missing_file() {
        let dir = TempDir::new().unwrap();
        store_cmd(dir.path())
            .arg("upload")
            .arg(dir.path().join("absent.docx"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("does not exist"));
    }

    #[test]
    fn test_upload_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.docx");
        fs::write(&path, b"definitely not a package").unwrap();

        store_cmd(dir.path())
            .arg("upload")
            .arg(&path)
            .assert()
            .code(1)
            .stderr(predicate::str::contains("READ_FAILURE"));
    }
}
