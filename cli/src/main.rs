use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use schema_history_core::Resource;
use schema_history_db::{Database, DatabaseConfig, Dialect, DialectImpl, SchemaHistorySql};
use schema_history_sqlite::{AppliedMigration, SchemaHistory, SqliteSource};
use tracing::Level;

/// Output format for history listings.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutputFormat {
    Table,
    Json,
    Yaml,
}

/// Which schema-history statement to print.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatementKind {
    Create,
    Insert,
    Select,
    All,
}

#[derive(Debug, Parser)]
#[command(name = "schema-history")]
#[command(about = "Dialect-aware schema-history bookkeeping for SQL migrations")]
struct Cli {
    /// Log debug output to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the schema-history SQL a dialect generates, without connecting.
    Sql(SqlArgs),
    /// Show the engine, version support and history table of a database.
    Info(TargetArgs),
    /// Create the schema-history table if it does not exist.
    Init(TargetArgs),
    /// Execute a SQL script and record it in the schema-history table.
    Exec(ExecArgs),
    /// List schema-history rows above a watermark.
    History(HistoryArgs),
}

#[derive(Debug, Args)]
struct SqlArgs {
    /// Dialect identifier (postgresql, mysql, sqlserver, oracle, sqlite).
    #[arg(long)]
    dialect: String,
    /// Schema holding the history table.
    #[arg(long, default_value = "public")]
    schema: String,
    /// History table name.
    #[arg(long, default_value = schema_history_db::DEFAULT_TABLE)]
    table: String,
    /// Watermark for the select statement.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    watermark: i64,
    /// Statement to print.
    #[arg(long, default_value = "all")]
    statement: StatementKind,
}

#[derive(Debug, Args)]
struct TargetArgs {
    /// SQLite database file path.
    #[arg(long)]
    db: PathBuf,
    /// Path to a database YAML config.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Schema holding the history table (overrides the config).
    #[arg(long)]
    schema: Option<String>,
    /// History table name (overrides the config).
    #[arg(long)]
    table: Option<String>,
}

#[derive(Debug, Args)]
struct ExecArgs {
    #[command(flatten)]
    target: TargetArgs,
    /// SQL script to execute.
    #[arg(long)]
    file: PathBuf,
    /// Migration version to record.
    #[arg(long)]
    version: Option<String>,
    /// Description to record (default: derived from the file name).
    #[arg(long)]
    description: Option<String>,
}

#[derive(Debug, Args)]
struct HistoryArgs {
    #[command(flatten)]
    target: TargetArgs,
    /// Only list rows with an installed rank above this value.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    since: i64,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: CliOutputFormat,
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    }

    let result = match cli.command {
        Command::Sql(args) => run_sql(args),
        Command::Info(args) => run_info(args),
        Command::Init(args) => run_init(args),
        Command::Exec(args) => run_exec(args),
        Command::History(args) => run_history(args),
    };

    if let Err(err) = result {
        eprintln!("{}", err.trim_end());
        std::process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// sql command
// ---------------------------------------------------------------------------

fn run_sql(args: SqlArgs) -> Result<(), String> {
    let dialect = DialectImpl::from_id(&args.dialect).map_err(|e| e.format_detailed())?;
    let sql = SchemaHistorySql::new(&dialect);
    let table = sql.table(&args.schema, &args.table);

    if matches!(args.statement, StatementKind::Create | StatementKind::All) {
        let script = sql.create_script(&table).map_err(|e| e.format_detailed())?;
        let delimiter = dialect.default_delimiter();
        for statement in script.statements() {
            if delimiter.is_alone_on_line() {
                println!("{}\n{delimiter}", statement.sql);
            } else {
                println!("{}{delimiter}", statement.sql);
            }
        }
    }
    if matches!(args.statement, StatementKind::Insert | StatementKind::All) {
        println!("{}", sql.insert_statement(&table));
    }
    if matches!(args.statement, StatementKind::Select | StatementKind::All) {
        println!("{}", sql.select_statement(&table, args.watermark));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Commands against a SQLite target
// ---------------------------------------------------------------------------

fn run_info(args: TargetArgs) -> Result<(), String> {
    let db = open_target(&args)?;
    let result = (|| -> schema_history_sqlite::Result<_> {
        let warning = db.ensure_supported()?;
        let history = SchemaHistory::new(&db)?;
        let status = history.status()?;
        let dialect = db.dialect();

        println!("Database:");
        println!("  Type: {}", db.database_type());
        println!("  Version: {}", dialect.version_display_name(&db.version()));
        println!(
            "  Supported: {}",
            if warning.is_some() { "yes (untested version)" } else { "yes" }
        );
        println!("  Single connection: {}", yes_no(dialect.use_single_connection()));
        println!("  DDL transactions: {}", yes_no(dialect.supports_ddl_transactions()));
        println!("History table: {}", status.table);
        println!("  Exists: {}", yes_no(status.exists));
        println!("  Entries: {}", status.entries);
        if let Some(rank) = status.last_rank {
            println!("  Last rank: {rank}");
        }
        Ok(())
    })();
    db.close();
    result.map_err(|e| e.format_detailed())
}

fn run_init(args: TargetArgs) -> Result<(), String> {
    let db = open_target(&args)?;
    let result = (|| -> schema_history_sqlite::Result<_> {
        db.ensure_supported()?;
        let history = SchemaHistory::new(&db)?;
        let created = history.create()?;
        Ok((created, history.table().to_string()))
    })();
    db.close();

    let (created, table) = result.map_err(|e| e.format_detailed())?;
    if created {
        println!("Created schema history table {table} in '{}'.", args.db.display());
    } else {
        println!("Schema history table {table} already exists in '{}'.", args.db.display());
    }
    Ok(())
}

fn run_exec(args: ExecArgs) -> Result<(), String> {
    if !args.file.is_file() {
        return Err(format!("Error: script '{}' does not exist", args.file.display()));
    }
    let description = args
        .description
        .clone()
        .unwrap_or_else(|| description_from_path(&args.file));

    let db = open_target(&args.target)?;
    let result = (|| -> schema_history_sqlite::Result<_> {
        db.ensure_supported()?;
        let history = SchemaHistory::new(&db)?;
        history.create()?;
        history.apply(
            &Resource::file(&args.file),
            args.version.as_deref(),
            &description,
        )
    })();
    db.close();

    let rank = result.map_err(|e| e.format_detailed())?;
    println!(
        "Applied '{}' as installed rank {rank}.",
        args.file.display()
    );
    Ok(())
}

fn run_history(args: HistoryArgs) -> Result<(), String> {
    let db = open_target(&args.target)?;
    let result = (|| -> schema_history_sqlite::Result<_> {
        let history = SchemaHistory::new(&db)?;
        if !history.exists()? {
            return Ok(Vec::new());
        }
        history.applied_since(args.since)
    })();
    db.close();

    let rows = result.map_err(|e| e.format_detailed())?;
    match args.format {
        CliOutputFormat::Table => print_history_table(&rows),
        CliOutputFormat::Json => {
            let raw = serde_json::to_string_pretty(&rows)
                .map_err(|err| format!("Error: failed to serialize history: {err}"))?;
            println!("{raw}");
        }
        CliOutputFormat::Yaml => {
            let raw = serde_yaml::to_string(&rows)
                .map_err(|err| format!("Error: failed to serialize history: {err}"))?;
            print!("{raw}");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Loads the config, applies overrides and connects to the SQLite file.
fn open_target(args: &TargetArgs) -> Result<Database<SqliteSource>, String> {
    let mut config = match &args.config {
        Some(path) => DatabaseConfig::load(path).map_err(|e| e.format_detailed())?,
        None => DatabaseConfig::default(),
    };
    if let Some(schema) = &args.schema {
        config.schema = Some(schema.clone());
    }
    if let Some(table) = &args.table {
        config.table = table.clone();
    }

    Database::connect(config, SqliteSource::file(&args.db)).map_err(|e| e.format_detailed())
}

/// `V2__add_users_table.sql` becomes `add users table`.
fn description_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let description = stem.split_once("__").map_or(stem.as_str(), |(_, rest)| rest);
    description.replace('_', " ")
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn print_history_table(rows: &[AppliedMigration]) {
    if rows.is_empty() {
        println!("No schema history entries.");
        return;
    }
    println!(
        "{:>5}  {:<10}  {:<30}  {:<23}  {:>8}  {}",
        "Rank", "Version", "Description", "Installed on", "Time ms", "State"
    );
    for row in rows {
        println!(
            "{:>5}  {:<10}  {:<30}  {:<23}  {:>8}  {}",
            row.installed_rank,
            row.version.as_deref().unwrap_or(""),
            row.description,
            row.installed_on.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            row.execution_time,
            if row.success { "Success" } else { "Failed" }
        );
    }
}
