use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/phi-bucket")
}

fn cmd() -> assert_cmd::Command {
    let mut c = cargo_bin_cmd!("tfcomply");
    c.env("NO_COLOR", "1").env_remove("RUST_LOG");
    c
}

/// Write `files` under `root/modules/` plus a config anchoring the root.
fn write_module(root: &Path, files: &[(&str, &str)]) {
    fs::write(root.join("tfcomply.toml"), "module_name = \"test module\"\n").unwrap();
    for (name, body) in files {
        let path = root.join("modules").join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }
}

const KMS_NO_ROTATION: &str = r#"
resource "aws_kms_key" "phi" {
  description = "PHI key"
}
"#;

const VERSIONING_DISABLED: &str = r#"
resource "aws_s3_bucket_versioning" "phi" {
  bucket = aws_s3_bucket.phi.id
  versioning_configuration {
    status = "Disabled"
  }
}
"#;

mod check {
    use super::*;

    #[test]
    fn test_compliant_module_passes() {
        cmd()
            .args(["check", "--root"])
            .arg(fixture_root())
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Checking 3 Terraform files for HIPAA compliance...",
            ))
            .stdout(predicate::str::contains("Errors: 0"))
            .stdout(predicate::str::contains("Warnings: 0"))
            .stdout(predicate::str::contains("HIPAA compliance check PASSED"));
    }

    #[test]
    fn test_compliant_module_json() {
        let out = cmd()
            .args(["check", "--output", "json", "--root"])
            .arg(fixture_root())
            .output()
            .unwrap();
        assert!(out.status.success());
        let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
        assert_eq!(v["summary"]["verdict"], "pass");
        assert_eq!(v["summary"]["units"], 3);
        assert_eq!(v["summary"]["passed"], 19);
        assert!(v["errors"].as_array().unwrap().is_empty());
        assert!(v["warnings"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_kms_without_rotation_fails() {
        let dir = tempdir().unwrap();
        write_module(dir.path(), &[("phi/kms.tf", KMS_NO_ROTATION)]);
        cmd()
            .args(["check", "--root"])
            .arg(dir.path())
            .assert()
            .failure()
            .code(1)
            .stdout(predicate::str::contains("❌ ERRORS:"))
            .stdout(predicate::str::contains(
                "modules/phi/kms.tf ❲KMS-001❳ KMS key rotation must be enabled",
            ))
            .stdout(predicate::str::contains("HIPAA compliance check FAILED"));
    }

    #[test]
    fn test_disabled_versioning_is_an_error() {
        let dir = tempdir().unwrap();
        write_module(dir.path(), &[("phi/versioning.tf", VERSIONING_DISABLED)]);
        let out = cmd()
            .args(["check", "--output", "json", "--root"])
            .arg(dir.path())
            .output()
            .unwrap();
        assert_eq!(out.status.code(), Some(1));
        let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
        let errors = v["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0]["rule"], "VER-002");
        assert_eq!(v["warnings"][0]["rule"], "VER-003");
    }

    #[test]
    fn test_warnings_alone_do_not_fail() {
        let dir = tempdir().unwrap();
        write_module(
            dir.path(),
            &[("phi/main.tf", "resource \"aws_s3_bucket\" \"phi\" {}\n")],
        );
        cmd()
            .args(["check", "--root"])
            .arg(dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("⚠️  WARNINGS:"))
            .stdout(predicate::str::contains("Errors: 0"));
    }

    #[test]
    fn test_empty_corpus_aborts() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("tfcomply.toml"), "").unwrap();
        cmd()
            .args(["check", "--root"])
            .arg(dir.path())
            .assert()
            .failure()
            .code(1)
            .stdout(predicate::str::contains("Checking").not())
            .stderr(predicate::str::contains("no Terraform files found"));
    }

    #[test]
    fn test_path_flag_overrides_config() {
        let dir = tempdir().unwrap();
        write_module(dir.path(), &[("phi/kms.tf", KMS_NO_ROTATION)]);
        fs::create_dir_all(dir.path().join("stacks")).unwrap();
        fs::write(
            dir.path().join("stacks/kms.tf"),
            "resource \"aws_kms_key\" \"k\" {\n  enable_key_rotation = true\n}\n",
        )
        .unwrap();
        cmd()
            .args(["check", "--path", "stacks/*.tf", "--root"])
            .arg(dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Checking 1 Terraform files"));
    }

    #[test]
    fn test_rule_override_disables_rule() {
        let dir = tempdir().unwrap();
        write_module(dir.path(), &[("phi/kms.tf", KMS_NO_ROTATION)]);
        fs::write(
            dir.path().join("tfcomply.toml"),
            "[rules.KMS-001]\nenabled = false\n",
        )
        .unwrap();
        cmd()
            .args(["check", "--root"])
            .arg(dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Total checks performed: 0"));
    }

    #[test]
    fn test_invalid_config_is_usage_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("tfcomply.toml"), "output = [").unwrap();
        cmd()
            .args(["check", "--root"])
            .arg(dir.path())
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("error:"));
    }

    #[test]
    fn test_unknown_rules_file_is_usage_error() {
        let dir = tempdir().unwrap();
        write_module(dir.path(), &[("phi/kms.tf", KMS_NO_ROTATION)]);
        cmd()
            .args(["check", "--rules-file", "missing.toml", "--root"])
            .arg(dir.path())
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("failed to read rules file"));
    }
}

mod report {
    use super::*;

    #[test]
    fn test_report_to_stdout() {
        cmd()
            .args(["report", "--root"])
            .arg(fixture_root())
            .assert()
            .success()
            .stdout(predicate::str::starts_with("# HIPAA Compliance Report"))
            .stdout(predicate::str::contains(
                "**Module:** PHI S3 Bucket Terraform Module",
            ))
            .stdout(predicate::str::contains("## Encryption at Rest"))
            .stdout(predicate::str::contains(
                "### Overall Compliance Status: ✅ COMPLIANT",
            ));
    }

    #[test]
    fn test_report_to_file_even_when_non_compliant() {
        let dir = tempdir().unwrap();
        write_module(dir.path(), &[("phi/kms.tf", KMS_NO_ROTATION)]);
        let out = dir.path().join("COMPLIANCE.md");
        cmd()
            .args(["report", "--module-name", "billing", "--root"])
            .arg(dir.path())
            .arg("--out")
            .arg(&out)
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
        let md = fs::read_to_string(&out).unwrap();
        assert!(md.contains("**Module:** billing"));
        assert!(md.contains("❌ NON-COMPLIANT"));
        assert!(md.contains("`KMS-001` modules/phi/kms.tf"));
    }
}

mod rules {
    use super::*;

    #[test]
    fn test_rules_json_lists_builtin_table() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("tfcomply.toml"), "").unwrap();
        let out = cmd()
            .args(["rules", "--output", "json", "--root"])
            .arg(dir.path())
            .output()
            .unwrap();
        assert!(out.status.success());
        let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
        let ids: Vec<_> = v["rules"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect();
        assert!(ids.contains(&"KMS-001".to_string()));
        assert!(ids.contains(&"ACC-002".to_string()));
    }

    #[test]
    fn test_rules_human() {
        cmd()
            .args(["rules", "--root"])
            .arg(fixture_root())
            .assert()
            .success()
            .stdout(predicate::str::contains("KMS-001"))
            .stdout(predicate::str::contains("key-rotation"));
    }
}

#[test]
fn test_version() {
    cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
