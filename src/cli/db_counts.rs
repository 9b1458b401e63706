use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

use crate::database_ops::config::{store_path_from_env, PipelineConfig};
use crate::database_ops::store::{count_rows, table_exists, with_store};
use crate::util::env as env_util;

#[derive(Debug, Clone, Default)]
pub struct DbCountsConfig {
    /// Optional override for the store file.
    pub db_path: Option<PathBuf>,
}

/// Row counts for the legacy source and the three normalized tables.
/// A table that does not exist yet counts as zero.
pub fn table_counts(conn: &Connection, cfg: &PipelineConfig) -> Result<BTreeMap<String, i64>> {
    let mut out = BTreeMap::new();
    for table in [
        &cfg.source.table,
        &cfg.targets.institution,
        &cfg.targets.department,
        &cfg.targets.admission_result,
    ] {
        let count = if table_exists(conn, table)? {
            count_rows(conn, table)?
        } else {
            0
        };
        out.insert(table.clone(), count);
    }
    Ok(out)
}

pub fn run(cfg: DbCountsConfig) -> Result<BTreeMap<String, i64>> {
    env_util::init_env();
    let path = cfg.db_path.clone().unwrap_or_else(store_path_from_env);
    let pipeline = PipelineConfig::from_env();
    let counts = with_store(&path, |conn| table_counts(conn, &pipeline))?;
    println!("{}", serde_json::to_string_pretty(&counts)?);
    info!("db_counts done");
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_missing_tables_as_zero() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE university_departments (x TEXT);
             INSERT INTO university_departments VALUES ('a'), ('b');
             CREATE TABLE Univ (univ_name TEXT PRIMARY KEY, address TEXT);
             INSERT INTO Univ VALUES ('대한대학교', NULL);",
        )
        .unwrap();
        let counts = table_counts(&conn, &PipelineConfig::default()).unwrap();
        assert_eq!(counts["university_departments"], 2);
        assert_eq!(counts["Univ"], 1);
        assert_eq!(counts["Depart"], 0);
        assert_eq!(counts["AdmissionResult"], 0);
    }
}
