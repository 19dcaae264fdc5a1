//! End-to-end tests for the `dbdiff` binary using snapshot files.

use std::path::Path;
use std::process::{Command, Output};

use dbdiff::snapshot;
use dbdiff_core::{Delta, Field, Index, SchemaSnapshot, Table};
use tempfile::TempDir;

fn dbdiff(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dbdiff"))
        .args(args)
        .env_remove("DBDIFF_TYPE")
        .env_remove("DBDIFF_NEW")
        .env_remove("DBDIFF_OLD")
        .output()
        .unwrap()
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

async fn write_snapshots(dir: &TempDir) -> (String, String) {
    let older = SchemaSnapshot::new()
        .table(
            Table::new("users")
                .field(Field::new("id", "int").not_null())
                .field(Field::new("name", "varchar(255)")),
        )
        .table(Table::new("audit").field(Field::new("id", "int")));
    let newer = SchemaSnapshot::new().table(
        Table::new("users")
            .field(Field::new("id", "int").not_null())
            .field(Field::new("name", "varchar(255)"))
            .field(Field::new("email", "varchar(255)"))
            .index(Index::new("users", "email_idx", ["email"]).unique()),
    );

    let new_path = dir.path().join("new.json");
    let old_path = dir.path().join("old.json");
    snapshot::save(&new_path, &newer).await.unwrap();
    snapshot::save(&old_path, &older).await.unwrap();
    (
        path_str(&new_path).to_string(),
        path_str(&old_path).to_string(),
    )
}

#[tokio::test]
async fn prints_statements_to_stdout() {
    let dir = TempDir::new().unwrap();
    let (new, old) = write_snapshots(&dir).await;

    let output = dbdiff(&["diff", "-t", "snapshot", "-n", &new, "-o", &old]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "DROP TABLE `audit`;\n\
         ALTER TABLE `users` ADD `email` VARCHAR(255) NULL AFTER `name`;\n\
         ALTER TABLE `users` ADD UNIQUE `email_idx` (`email`);\n"
    );
}

#[tokio::test]
async fn prefix_limits_compared_tables() {
    let dir = TempDir::new().unwrap();
    let (new, old) = write_snapshots(&dir).await;

    let output = dbdiff(&[
        "diff", "-t", "snapshot", "-n", &new, "-o", &old, "--prefix", "aud",
    ]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "DROP TABLE `audit`;\n"
    );
}

#[tokio::test]
async fn identical_schemas_print_nothing() {
    let dir = TempDir::new().unwrap();
    let (new, _) = write_snapshots(&dir).await;

    let output = dbdiff(&["diff", "-t", "snapshot", "-n", &new, "-o", &new]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[tokio::test]
async fn json_flag_prints_delta_first() {
    let dir = TempDir::new().unwrap();
    let (new, old) = write_snapshots(&dir).await;

    let output = dbdiff(&[
        "diff", "-t", "snapshot", "-n", &new, "-o", &old, "--json",
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let split = stdout.find("\nDROP TABLE").unwrap();
    let delta: Delta = serde_json::from_str(&stdout[..split]).unwrap();
    assert_eq!(delta.drop_tables.len(), 1);
    assert_eq!(delta.change_tables.len(), 1);
}

#[test]
fn unsupported_type_fails() {
    let output = dbdiff(&["diff", "-t", "oracle", "-n", "a", "-o", "b"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("oracle is not supported"));
}

#[test]
fn missing_snapshot_file_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.json");
    let missing = path_str(&missing);

    let output = dbdiff(&["diff", "-t", "snapshot", "-n", missing, "-o", missing]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}
