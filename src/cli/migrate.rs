use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use crate::database_ops::config::{store_path_from_env, PipelineConfig};
use crate::database_ops::pipeline::{run_migration, MigrationSummary};
use crate::database_ops::store::with_store;
use crate::util::env as env_util;

#[derive(Debug, Clone, Default)]
pub struct MigrateConfig {
    /// Optional override for the store file (defaults to env UNIV_DB_PATH or universities.db).
    pub db_path: Option<PathBuf>,
    /// Override LEGACY_TABLE.
    pub legacy_table: Option<String>,
    /// Override LEGACY_COLUMN.
    pub legacy_column: Option<String>,
    /// Override LEGACY_DELIMITER.
    pub delimiter: Option<char>,
    /// Force foreign-key enforcement (defaults to env ENFORCE_FOREIGN_KEYS).
    pub enforce_foreign_keys: Option<bool>,
}

impl MigrateConfig {
    /// Flags win over environment, environment wins over defaults.
    pub fn resolve(&self) -> (PathBuf, PipelineConfig) {
        let path = self.db_path.clone().unwrap_or_else(store_path_from_env);
        let mut pipeline = PipelineConfig::from_env();
        if let Some(table) = &self.legacy_table {
            pipeline.source.table = table.clone();
        }
        if let Some(column) = &self.legacy_column {
            pipeline.source.column = column.clone();
        }
        if let Some(delimiter) = self.delimiter {
            pipeline.delimiter = delimiter;
        }
        if let Some(enforce) = self.enforce_foreign_keys {
            pipeline.enforce_foreign_keys = enforce;
        }
        (path, pipeline)
    }
}

pub fn run(cfg: MigrateConfig) -> Result<MigrationSummary> {
    env_util::init_env();
    let (path, pipeline) = cfg.resolve();
    env_util::log_snapshot(
        "migrate",
        &[
            ("db_path", path.display().to_string()),
            ("legacy_table", pipeline.source.table.clone()),
            ("legacy_column", pipeline.source.column.clone()),
            ("delimiter", format!("{:?}", pipeline.delimiter)),
            ("enforce_foreign_keys", pipeline.enforce_foreign_keys.to_string()),
        ],
    );

    let summary = with_store(&path, |conn| run_migration(conn, &pipeline))?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    info!(db = %path.display(), "migrate done");
    Ok(summary)
}
