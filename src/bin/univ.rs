use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;
use univ_migrate::database_ops::config::parse_delimiter;
use univ_migrate::util::{env, logging};

#[derive(Parser, Debug)]
#[command(name = "univ", version, about = "University dataset migration CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Split legacy delimited rows into the Univ / Depart / AdmissionResult tables
    Migrate {
        /// Optional override for the store file (UNIV_DB_PATH)
        #[arg(long)]
        db_path: Option<PathBuf>,
        /// Table holding the legacy rows (LEGACY_TABLE)
        #[arg(long)]
        legacy_table: Option<String>,
        /// Column holding the delimited text (LEGACY_COLUMN)
        #[arg(long)]
        legacy_column: Option<String>,
        /// Field delimiter; a single character or "tab" (LEGACY_DELIMITER)
        #[arg(long, value_parser = delimiter_arg)]
        delimiter: Option<char>,
        /// Enforce foreign keys during the run: true or false (ENFORCE_FOREIGN_KEYS)
        #[arg(long, action = ArgAction::Set, value_name = "BOOL")]
        enforce_foreign_keys: Option<bool>,
    },
    /// Load a published admission-results CSV into AdmissionResult
    ImportAdmissions {
        /// Optional override for the store file (UNIV_DB_PATH)
        #[arg(long)]
        db_path: Option<PathBuf>,
        /// Path to the admission-results CSV
        #[arg(long)]
        csv: PathBuf,
        /// Admission year the CSV describes
        #[arg(long)]
        year: i64,
        /// Enforce foreign keys during the import: true or false (ENFORCE_FOREIGN_KEYS)
        #[arg(long, action = ArgAction::Set, value_name = "BOOL")]
        enforce_foreign_keys: Option<bool>,
    },
    /// Print row counts for the legacy and normalized tables
    DbCounts {
        /// Optional override for the store file (UNIV_DB_PATH)
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
}

fn delimiter_arg(raw: &str) -> Result<char, String> {
    parse_delimiter(raw).ok_or_else(|| format!("expected a single character, got {raw:?}"))
}

fn main() -> Result<()> {
    env::init_env();
    logging::init_tracing(logging::DEFAULT_FILTER)?;

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Migrate {
            db_path,
            legacy_table,
            legacy_column,
            delimiter,
            enforce_foreign_keys,
        } => {
            use univ_migrate::cli::migrate::{run, MigrateConfig};
            let cfg = MigrateConfig {
                db_path,
                legacy_table,
                legacy_column,
                delimiter,
                enforce_foreign_keys,
            };
            run(cfg).map(|_| ())
        }
        Commands::ImportAdmissions {
            db_path,
            csv,
            year,
            enforce_foreign_keys,
        } => {
            use univ_migrate::cli::import_admissions::{run, ImportAdmissionsConfig};
            let cfg = ImportAdmissionsConfig {
                db_path,
                csv_path: csv,
                year,
                enforce_foreign_keys,
            };
            run(cfg).map(|_| ())
        }
        Commands::DbCounts { db_path } => {
            use univ_migrate::cli::db_counts::{run, DbCountsConfig};
            run(DbCountsConfig { db_path }).map(|_| ())
        }
    };

    if let Err(err) = &result {
        error!(error = %format!("{err:#}"), "run aborted");
    }
    result
}
