//! Full lifecycle against an in-memory SQLite database: connect, gate the
//! version, create the history table, apply two scripts and read back the
//! rows appended after a watermark.

use schema_history_core::Resource;
use schema_history_db::{Database, DatabaseConfig, Dialect};
use schema_history_sqlite::{SchemaHistory, SqliteSource};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    let config = DatabaseConfig {
        init_sql: Some("PRAGMA foreign_keys = ON;".into()),
        ..DatabaseConfig::default()
    };
    let db = Database::connect(config, SqliteSource::in_memory())?;
    if let Some(warning) = db.ensure_supported()? {
        println!("note: {warning}");
    }
    println!(
        "{} {} (single connection: {})",
        db.database_type(),
        db.dialect().version_display_name(&db.version()),
        db.dialect().use_single_connection()
    );

    let history = SchemaHistory::new(&db)?;
    history.create()?;

    let scripts = [
        (
            "1",
            "create teams",
            Resource::named(
                "V1__create_teams.sql",
                "CREATE TABLE teams (id INTEGER PRIMARY KEY, name TEXT NOT NULL);",
            ),
        ),
        (
            "2",
            "create members",
            Resource::named(
                "V2__create_members.sql",
                "CREATE TABLE members (\n    id INTEGER PRIMARY KEY,\n    team_id INTEGER REFERENCES teams (id)\n);\nCREATE INDEX members_team ON members (team_id);",
            ),
        ),
    ];
    for (version, description, resource) in &scripts {
        let rank = history.apply(resource, Some(version), description)?;
        println!("applied {} as rank {rank}", resource.filename());
    }

    let table = history.table().clone();
    println!("\n{}", db.get_select_statement(&table, 1));
    for row in history.applied_since(1)? {
        println!(
            "  {} | {} | {} | {}",
            row.installed_rank,
            row.version.as_deref().unwrap_or("-"),
            row.description,
            row.installed_on
        );
    }

    db.close();
    Ok(())
}
