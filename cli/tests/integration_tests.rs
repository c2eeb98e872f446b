use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_schema-history"))
        .args(args)
        .output()
        .expect("failed to run schema-history")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are valid UTF-8")
}

// ---------------------------------------------------------------------------
// sql
// ---------------------------------------------------------------------------

#[test]
fn sql_prints_exact_insert_statement() {
    let out = run(&[
        "sql",
        "--dialect",
        "postgresql",
        "--schema",
        "public",
        "--statement",
        "insert",
    ]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(
        stdout(&out).trim_end(),
        r#"INSERT INTO "public"."schema_history" ("installed_rank","version","description","type","script","checksum","installed_by","execution_time","success") VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#
    );
}

#[test]
fn sql_select_uses_watermark() {
    let out = run(&[
        "sql",
        "--dialect",
        "mysql",
        "--schema",
        "app",
        "--statement",
        "select",
        "--watermark",
        "5",
    ]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("WHERE `installed_rank` > 5 ORDER BY `installed_rank`"));
}

#[test]
fn sql_create_for_sqlserver_ends_with_go() {
    let out = run(&["sql", "--dialect", "mssql", "--schema", "dbo", "--statement", "create"]);
    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.contains("CREATE TABLE [dbo].[schema_history]"));
    assert_eq!(text.trim_end().lines().last(), Some("GO"));
}

#[test]
fn sql_rejects_unknown_dialect() {
    let out = run(&["sql", "--dialect", "informix"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("unknown database type: informix"));
}

// ---------------------------------------------------------------------------
// SQLite target
// ---------------------------------------------------------------------------

#[test]
fn init_creates_history_table_once() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("app.db");

    let first = run(&["init", "--db", path_str(&db)]);
    assert!(first.status.success(), "stderr: {}", stderr(&first));
    assert!(stdout(&first).contains("Created schema history table"));

    let second = run(&["init", "--db", path_str(&db)]);
    assert!(second.status.success());
    assert!(stdout(&second).contains("already exists"));

    let conn = rusqlite::Connection::open(&db).unwrap();
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'schema_history'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn exec_applies_and_records_script() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("app.db");
    let script = dir.path().join("V1__create_users.sql");
    fs::write(&script, "CREATE TABLE users (id INTEGER PRIMARY KEY);\n").unwrap();

    let out = run(&[
        "exec",
        "--db",
        path_str(&db),
        "--file",
        path_str(&script),
        "--version",
        "1",
    ]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("installed rank 1"));

    let out = run(&["history", "--db", path_str(&db), "--format", "json"]);
    assert!(out.status.success());
    let rows: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(rows[0]["script"], "V1__create_users.sql");
    assert_eq!(rows[0]["description"], "create users");
    assert_eq!(rows[0]["version"], "1");
    assert_eq!(rows[0]["success"], true);
}

#[test]
fn exec_failure_exits_nonzero_and_is_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("app.db");
    let script = dir.path().join("V1__broken.sql");
    fs::write(&script, "CREATE TABLE ok (a INT);\nCREATE TABLE (;\n").unwrap();

    let out = run(&["exec", "--db", path_str(&db), "--file", path_str(&script)]);
    assert!(!out.status.success());
    let err = stderr(&out);
    assert!(err.starts_with("Error: script V1__broken.sql failed at line 2"));
    assert!(err.contains("Caused by:"));

    let out = run(&["history", "--db", path_str(&db)]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("Failed"));
}

#[test]
fn history_since_filters_rows() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("app.db");
    for (i, name) in ["V1__a.sql", "V2__b.sql"].iter().enumerate() {
        let script = dir.path().join(name);
        fs::write(&script, format!("CREATE TABLE t{i} (a INT);")).unwrap();
        let out = run(&["exec", "--db", path_str(&db), "--file", path_str(&script)]);
        assert!(out.status.success(), "stderr: {}", stderr(&out));
    }

    let out = run(&["history", "--db", path_str(&db), "--since", "1", "--format", "yaml"]);
    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.contains("V2__b.sql"));
    assert!(!text.contains("V1__a.sql"));
}

#[test]
fn history_on_fresh_database_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("fresh.db");
    let out = run(&["history", "--db", path_str(&db)]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("No schema history entries."));
}

#[test]
fn info_reports_sqlite_target() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("app.db");
    let out = run(&["info", "--db", path_str(&db), "--table", "audit_history"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("Type: SQLite"));
    assert!(text.contains("Single connection: yes"));
    assert!(text.contains(r#"History table: "main"."audit_history""#));
    assert!(text.contains("Exists: no"));
}

#[test]
fn config_file_sets_table_and_init_sql() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("app.db");
    let config = dir.path().join("database.yml");
    fs::write(
        &config,
        "init_sql: \"CREATE TABLE IF NOT EXISTS init_marker (id INT);\"\ntable: from_config\n",
    )
    .unwrap();

    let out = run(&["init", "--db", path_str(&db), "--config", path_str(&config)]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains(r#""main"."from_config""#));

    let conn = rusqlite::Connection::open(&db).unwrap();
    let marker: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE name = 'init_marker'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(marker, 1);
}

#[test]
fn exec_rejects_missing_script() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("app.db");
    let out = run(&["exec", "--db", path_str(&db), "--file", "does-not-exist.sql"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("does not exist"));
}
