//! CLI integration tests for the gooddata binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("gooddata"));
    cmd.env_remove("GOODDATA_USERNAME")
        .env_remove("GOODDATA_PASSWORD")
        .env_remove("GOODDATA_HOST")
        .env_remove("GOODDATA_WEBDAV_HOST");
    cmd
}

// Helper to create a temp declaration or data file
fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const DEPARTMENT: &str = r#"{
    "name": "Department",
    "columns": [
        {"name": "department", "ldmType": "CONNECTION_POINT", "title": "Department"},
        {"name": "name", "ldmType": "LABEL", "title": "Name", "reference": "department"},
        {"name": "city", "ldmType": "ATTRIBUTE", "title": "City", "dataType": "VARCHAR(20)"}
    ]
}"#;

const SALARY: &str = r#"{
    "name": "Salary",
    "columns": [
        {"name": "employee", "ldmType": "REFERENCE", "title": "Employee",
         "reference": "employee", "schemaReference": "Employee"},
        {"name": "payment", "ldmType": "FACT", "title": "Payment", "dataType": "DECIMAL(10,2)"},
        {"name": "payday", "ldmType": "DATE", "title": "Pay Day",
         "schemaReference": "payment", "datetime": true}
    ]
}"#;

mod maql_command {
    use super::*;

    #[test]
    fn prints_dataset_maql() {
        let dir = TempDir::new().unwrap();
        let dataset = write_temp_file(&dir, "department.json", DEPARTMENT);

        cmd()
            .args(["maql", dataset.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "CREATE DATASET {dataset.department} VISUAL(TITLE \"Department\");",
            ))
            .stdout(predicate::str::contains(
                "ALTER DATATYPE {d_department_city.nm_city} VARCHAR(20);",
            ))
            .stdout(predicate::str::contains("SYNCHRONIZE {dataset.department};"));
    }

    #[test]
    fn writes_output_file() {
        let dir = TempDir::new().unwrap();
        let dataset = write_temp_file(&dir, "salary.json", SALARY);
        let output = dir.path().join("salary.maql");

        cmd()
            .args([
                "maql",
                dataset.to_str().unwrap(),
                "--output",
                output.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::is_empty());

        let maql = fs::read_to_string(&output).unwrap();
        assert!(maql.contains("# CONNECT THE DATE TO THE DATE DIMENSION"));
        assert!(maql.contains("{attr.time.second.of.day.payment}"));
        assert!(maql.contains("CREATE ATTRIBUTE {attr.salary.factsof}"));
    }
}

mod manifest_command {
    use super::*;

    #[test]
    fn incremental_by_default() {
        let dir = TempDir::new().unwrap();
        let dataset = write_temp_file(&dir, "department.json", DEPARTMENT);

        cmd()
            .args(["manifest", dataset.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""dataSetSLIManifest""#))
            .stdout(predicate::str::contains(r#""mode":"INCREMENTAL""#))
            .stdout(predicate::str::contains(r#""dataSet":"dataset.department""#));
    }

    #[test]
    fn full_and_pretty() {
        let dir = TempDir::new().unwrap();
        let dataset = write_temp_file(&dir, "salary.json", SALARY);

        let output = cmd()
            .args(["manifest", dataset.to_str().unwrap(), "--full", "--pretty"])
            .assert()
            .success()
            .stdout(predicate::str::contains("{\n"))
            .get_output()
            .stdout
            .clone();

        let manifest: serde_json::Value = serde_json::from_slice(&output).unwrap();
        let parts = manifest["dataSetSLIManifest"]["parts"].as_array().unwrap();
        let names: Vec<&str> = parts
            .iter()
            .map(|p| p["columnName"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec!["employee", "payment", "payday", "payday_dt", "payday_tm", "tm_payday_id"]
        );
        assert!(parts.iter().all(|p| p["mode"] == "FULL"));
        assert_eq!(parts[2]["constraints"]["date"], "yyyy-MM-dd HH:mm:SS");
    }
}

mod upload_command {
    use super::*;

    #[test]
    fn no_upload_keeps_formatted_csv() {
        let dir = TempDir::new().unwrap();
        let dataset = write_temp_file(&dir, "salary.json", SALARY);
        let data = write_temp_file(
            &dir,
            "salary.csv",
            "employee,payment,payday\ne1,10.5,2020-01-02 03:04:05\n",
        );
        let kept = dir.path().join("kept.csv");

        cmd()
            .args([
                "upload",
                dataset.to_str().unwrap(),
                data.to_str().unwrap(),
                "--no-upload",
                "--keep-csv",
                kept.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("nothing uploaded"));

        let csv = fs::read_to_string(&kept).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            r#""employee","payment","payday","payday_dt","payday_tm","tm_payday_id""#
        );
        assert_eq!(
            lines[1],
            r#""e1","10.5","2020-01-02 03:04:05","43831","11045","11045""#
        );
    }

    #[test]
    fn upload_needs_project() {
        let dir = TempDir::new().unwrap();
        let dataset = write_temp_file(&dir, "salary.json", SALARY);
        let data = write_temp_file(&dir, "salary.csv", "employee,payment,payday\n");

        cmd()
            .args(["upload", dataset.to_str().unwrap(), data.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("--project is required"));
    }
}

mod remote_commands {
    use super::*;

    #[test]
    fn rejected_login() {
        let mut server = mockito::Server::new();
        let _login = server
            .mock("POST", "/gdc/account/login")
            .with_status(401)
            .with_body(r#"{"error": {"message": "Bad login: %s", "parameters": ["user"]}}"#)
            .create();

        let url = server.url();
        let dir = TempDir::new().unwrap();
        let dataset = write_temp_file(&dir, "department.json", DEPARTMENT);

        cmd()
            .args([
                "create",
                dataset.to_str().unwrap(),
                "--project",
                "p1",
                "--username",
                "user",
                "--password",
                "wrong",
                "--host",
                url.as_str(),
            ])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("authentication failed: Bad login: user"));
    }

    #[test]
    fn credentials_from_environment() {
        let dir = TempDir::new().unwrap();
        let dataset = write_temp_file(&dir, "department.json", DEPARTMENT);

        // Nothing listens on the discard port.
        cmd()
            .env("GOODDATA_USERNAME", "user")
            .env("GOODDATA_PASSWORD", "secret")
            .env("GOODDATA_HOST", "http://127.0.0.1:9")
            .args(["diff", dataset.to_str().unwrap(), "--project", "p1"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("unreachable"));
    }

    #[test]
    fn missing_credentials() {
        let dir = TempDir::new().unwrap();
        let dataset = write_temp_file(&dir, "department.json", DEPARTMENT);

        cmd()
            .args(["migrate", dataset.to_str().unwrap(), "--project", "p1"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("--username is required"));
    }
}

mod error_handling {
    use super::*;

    #[test]
    fn file_not_found() {
        cmd()
            .args(["maql", "/nonexistent/dataset.json"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("cannot access"));
    }

    #[test]
    fn invalid_json() {
        let dir = TempDir::new().unwrap();
        let dataset = write_temp_file(&dir, "bad.json", "{ not json }");

        cmd()
            .args(["maql", dataset.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid JSON"));
    }

    #[test]
    fn label_without_attribute() {
        let dir = TempDir::new().unwrap();
        let dataset = write_temp_file(
            &dir,
            "bad.json",
            r#"{"name": "Department", "columns": [
                {"name": "name", "ldmType": "LABEL", "title": "Name", "reference": "missing"}
            ]}"#,
        );

        cmd()
            .args(["manifest", dataset.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid dataset Department"));
    }

    #[test]
    fn two_connection_points() {
        let dir = TempDir::new().unwrap();
        let dataset = write_temp_file(
            &dir,
            "bad.json",
            r#"{"name": "Department", "columns": [
                {"name": "a", "ldmType": "CONNECTION_POINT", "title": "A"},
                {"name": "b", "ldmType": "CONNECTION_POINT", "title": "B"}
            ]}"#,
        );

        cmd()
            .args(["maql", dataset.to_str().unwrap()])
            .assert()
            .code(2);
    }

    #[test]
    fn unknown_column_type() {
        let dir = TempDir::new().unwrap();
        let dataset = write_temp_file(
            &dir,
            "bad.json",
            r#"{"name": "Department", "columns": [
                {"name": "a", "ldmType": "METRIC", "title": "A"}
            ]}"#,
        );

        cmd()
            .args(["maql", dataset.to_str().unwrap()])
            .assert()
            .code(2);
    }
}

mod required_args {
    use super::*;

    #[test]
    fn missing_dataset_path() {
        cmd()
            .args(["maql"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("required"));
    }

    #[test]
    fn upload_needs_data() {
        cmd()
            .args(["upload", "salary.json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("required"));
    }
}

mod help_and_version {
    use super::*;

    #[test]
    fn help_flag() {
        cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("migrate"))
            .stdout(predicate::str::contains("manifest"));
    }

    #[test]
    fn version_flag() {
        cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("gooddata"));
    }

    #[test]
    fn migrate_help() {
        cmd()
            .args(["migrate", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--dry-run"))
            .stdout(predicate::str::contains("GOODDATA_USERNAME"));
    }
}
