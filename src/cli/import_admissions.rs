use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::database_ops::admission::{import_admission_results, AdmissionImportSummary};
use crate::database_ops::config::{store_path_from_env, PipelineConfig};
use crate::database_ops::store::with_store;
use crate::util::env as env_util;

#[derive(Debug, Clone)]
pub struct ImportAdmissionsConfig {
    /// Optional override for the store file.
    pub db_path: Option<PathBuf>,
    /// Admission results CSV (header row + one record per department/track).
    pub csv_path: PathBuf,
    /// Admission year the CSV describes.
    pub year: i64,
    /// Override ENFORCE_FOREIGN_KEYS.
    pub enforce_foreign_keys: Option<bool>,
}

pub fn run(cfg: ImportAdmissionsConfig) -> Result<AdmissionImportSummary> {
    env_util::init_env();
    let path = cfg.db_path.clone().unwrap_or_else(store_path_from_env);
    let mut pipeline = PipelineConfig::from_env();
    if let Some(enforce) = cfg.enforce_foreign_keys {
        pipeline.enforce_foreign_keys = enforce;
    }
    env_util::log_snapshot(
        "import-admissions",
        &[
            ("db_path", path.display().to_string()),
            ("csv_path", cfg.csv_path.display().to_string()),
            ("year", cfg.year.to_string()),
            ("legacy_table", pipeline.source.table.clone()),
            ("admission_table", pipeline.targets.admission_result.clone()),
            ("enforce_foreign_keys", pipeline.enforce_foreign_keys.to_string()),
        ],
    );

    let file = File::open(&cfg.csv_path)
        .with_context(|| format!("failed to open {}", cfg.csv_path.display()))?;
    let summary = with_store(&path, |conn| {
        import_admission_results(conn, &pipeline, file, cfg.year)
    })?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    info!(db = %path.display(), "import-admissions done");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn missing_csv_fails_before_touching_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("universities.db");
        Connection::open(&db).unwrap();
        let err = run(ImportAdmissionsConfig {
            db_path: Some(db.clone()),
            csv_path: dir.path().join("missing.csv"),
            year: 2025,
            enforce_foreign_keys: None,
        })
        .unwrap_err();
        assert!(err.to_string().contains("missing.csv"), "{err}");

        let conn = Connection::open(&db).unwrap();
        let tables: i64 = conn
            .query_row("SELECT COUNT(*) FROM sqlite_master", [], |r| r.get(0))
            .unwrap();
        assert_eq!(tables, 0);
    }
}
