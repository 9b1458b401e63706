use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::database_ops::config::PipelineConfig;
use crate::database_ops::legacy::{read_legacy_rows, LegacyRecord};
use crate::database_ops::schema::ensure_schema;
use crate::database_ops::store::set_foreign_keys;
use crate::database_ops::writer::{write_record, RowOutcome, WriteStatus};
use crate::error::RowError;
use crate::normalization::fields::LegacyFields;

/// Counters for one migration run, printed at the end of `univ migrate`.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub rows_read: usize,
    pub rows_malformed: usize,
    pub rows_failed: usize,
    pub institutions_inserted: usize,
    pub institutions_skipped: usize,
    pub departments_inserted: usize,
    pub departments_skipped: usize,
}

impl MigrationSummary {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            rows_read: 0,
            rows_malformed: 0,
            rows_failed: 0,
            institutions_inserted: 0,
            institutions_skipped: 0,
            departments_inserted: 0,
            departments_skipped: 0,
        }
    }

    fn record(&mut self, outcome: RowOutcome) {
        match outcome.institution {
            WriteStatus::Inserted => self.institutions_inserted += 1,
            WriteStatus::AlreadyPresent => self.institutions_skipped += 1,
            WriteStatus::NotApplicable => {}
        }
        match outcome.department {
            WriteStatus::Inserted => self.departments_inserted += 1,
            WriteStatus::AlreadyPresent => self.departments_skipped += 1,
            WriteStatus::NotApplicable => {}
        }
    }

    fn record_failure(&mut self, err: &RowError) {
        if err.is_malformed() {
            self.rows_malformed += 1;
        } else {
            self.rows_failed += 1;
        }
    }
}

/// Split, map and write a single legacy row.
pub fn process_record(
    conn: &Connection,
    cfg: &PipelineConfig,
    record: &LegacyRecord,
) -> Result<RowOutcome, RowError> {
    let raw = record.raw.as_deref().ok_or(RowError::NullRow {
        position: record.position,
    })?;
    let fields = LegacyFields::parse(raw, cfg.delimiter)?;
    write_record(conn, &cfg.targets, &fields)
}

fn log_row_error(position: usize, err: &RowError) {
    match err {
        RowError::Malformed {
            raw,
            expected,
            actual,
        } => warn!(
            row = position,
            expected,
            actual,
            raw = %raw,
            "skipping malformed row"
        ),
        RowError::InvalidCount {
            field,
            department_code,
            admission_capacity,
            graduates_count,
        } => warn!(
            row = position,
            field,
            department_code = %department_code,
            admission_capacity = %admission_capacity,
            graduates_count = %graduates_count,
            "data type error; row not written"
        ),
        other => warn!(row = position, kind = other.kind(), error = %other, "row skipped"),
    }
}

/// Rebuild the normalized tables from the legacy rows.
///
/// Schema creation, reading and every row write share one transaction that is
/// committed once at the end. A fatal error drops the transaction, so nothing
/// from a failed run is persisted. Row-local errors are logged and counted.
#[instrument(skip_all, fields(source = %cfg.source.table))]
pub fn run_migration(conn: &mut Connection, cfg: &PipelineConfig) -> Result<MigrationSummary> {
    let mut summary = MigrationSummary::new(Utc::now());

    set_foreign_keys(conn, cfg.enforce_foreign_keys)
        .context("failed to configure foreign key enforcement")?;
    let tx = conn
        .transaction()
        .context("failed to begin migration transaction")?;

    ensure_schema(&tx, &cfg.targets).context("failed to create target schema")?;
    let records = read_legacy_rows(&tx, &cfg.source).context("failed to read legacy rows")?;

    for record in &records {
        summary.rows_read += 1;
        match process_record(&tx, cfg, record) {
            Ok(outcome) => summary.record(outcome),
            Err(err) => {
                log_row_error(record.position, &err);
                summary.record_failure(&err);
            }
        }
    }

    tx.commit().context("failed to commit migration")?;
    summary.finished_at = Utc::now();
    info!(
        rows = summary.rows_read,
        malformed = summary.rows_malformed,
        failed = summary.rows_failed,
        institutions = summary.institutions_inserted,
        departments = summary.departments_inserted,
        "data successfully processed; target tables created/populated"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_ops::config::{LegacySource, TargetTables};
    use crate::database_ops::store::{table_exists, with_store};

    const SAMPLE: &str = "2024,51,강원특별자치도,11010,A구,대한대학교,대학,4,학사,주간,정상,컴퓨터공학과,CS001,공학,E01,자체공학,공과대학,실습중심,자료구조,60,55,소프트웨어개발자,2024-01-01,2024-01-01";

    fn cfg() -> PipelineConfig {
        PipelineConfig {
            source: LegacySource {
                table: "legacy".into(),
                column: "line".into(),
            },
            ..PipelineConfig::default()
        }
    }

    fn seeded(rows: &[Option<&str>]) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE legacy (line TEXT)").unwrap();
        for row in rows {
            conn.execute("INSERT INTO legacy (line) VALUES (?1)", [row])
                .unwrap();
        }
        conn
    }

    fn departments(conn: &Connection) -> Vec<(String, Option<i64>, Option<i64>, String)> {
        let mut stmt = conn
            .prepare(
                "SELECT dept_code, admission_capacity, graduates_count, main_subjects \
                 FROM Depart ORDER BY dept_code",
            )
            .unwrap();
        stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap()
    }

    fn institutions(conn: &Connection) -> Vec<(String, Option<String>)> {
        let mut stmt = conn
            .prepare("SELECT univ_name, address FROM Univ ORDER BY univ_name")
            .unwrap();
        stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?)))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap()
    }

    #[test]
    fn migrates_sample_row() {
        let mut conn = seeded(&[Some(SAMPLE)]);
        let summary = run_migration(&mut conn, &cfg()).unwrap();
        assert_eq!(summary.rows_read, 1);
        assert_eq!(summary.institutions_inserted, 1);
        assert_eq!(summary.departments_inserted, 1);
        assert_eq!(
            institutions(&conn),
            vec![("대한대학교".into(), Some("강원특별자치도 A구".into()))]
        );
        assert_eq!(
            departments(&conn),
            vec![("CS001".into(), Some(60), Some(55), "자료구조".into())]
        );
    }

    #[test]
    fn blank_capacity_is_null() {
        let raw = SAMPLE.replace(",60,55,", ",,55,");
        let mut conn = seeded(&[Some(raw.as_str())]);
        let summary = run_migration(&mut conn, &cfg()).unwrap();
        assert_eq!(summary.rows_failed, 0);
        assert_eq!(
            departments(&conn),
            vec![("CS001".into(), None, Some(55), "자료구조".into())]
        );
    }

    #[test]
    fn malformed_and_bad_rows_do_not_stop_the_batch() {
        let short = SAMPLE.rsplit_once(',').map(|(head, _)| head).unwrap();
        let bad_count = SAMPLE
            .replace("CS001", "BAD01")
            .replace("대한대학교", "오류대학교")
            .replace(",60,55,", ",sixty,55,");
        let other = SAMPLE
            .replace("CS001", "EE002")
            .replace("대한대학교", "민국대학교")
            .replace(",A구,", ",,");
        let mut conn = seeded(&[Some(short), None, Some(bad_count.as_str()), Some(other.as_str())]);

        let summary = run_migration(&mut conn, &cfg()).unwrap();
        assert_eq!(summary.rows_read, 4);
        assert_eq!(summary.rows_malformed, 2);
        assert_eq!(summary.rows_failed, 1);
        assert_eq!(summary.departments_inserted, 1);

        // the coercion failure wrote neither its department nor its institution
        assert_eq!(institutions(&conn), vec![("민국대학교".into(), None)]);
        assert_eq!(
            departments(&conn),
            vec![("EE002".into(), Some(60), Some(55), "자료구조".into())]
        );
    }

    #[test]
    fn duplicate_codes_keep_first_values() {
        let second = SAMPLE.replace("자료구조", "운영체제");
        let mut conn = seeded(&[Some(SAMPLE), Some(second.as_str())]);
        let summary = run_migration(&mut conn, &cfg()).unwrap();
        assert_eq!(summary.departments_inserted, 1);
        assert_eq!(summary.departments_skipped, 1);
        assert_eq!(summary.institutions_skipped, 1);
        assert_eq!(departments(&conn)[0].3, "자료구조");
    }

    #[test]
    fn second_run_is_idempotent() {
        let other = SAMPLE.replace("CS001", "EE002");
        let mut conn = seeded(&[Some(SAMPLE), Some(other.as_str())]);
        run_migration(&mut conn, &cfg()).unwrap();
        let (univ_once, dept_once) = (institutions(&conn), departments(&conn));

        let again = run_migration(&mut conn, &cfg()).unwrap();
        assert_eq!(again.institutions_inserted, 0);
        assert_eq!(again.departments_inserted, 0);
        assert_eq!(again.rows_failed, 0);
        assert_eq!(institutions(&conn), univ_once);
        assert_eq!(departments(&conn), dept_once);
    }

    #[test]
    fn missing_source_aborts_without_writes() {
        let mut conn = Connection::open_in_memory().unwrap();
        let err = run_migration(&mut conn, &cfg()).unwrap_err();
        assert!(format!("{err:#}").contains("legacy source table"), "{err:#}");
        // the schema DDL was rolled back with the transaction
        assert!(!table_exists(&conn, "Univ").unwrap());
    }

    #[test]
    fn custom_targets_and_file_backed_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("universities.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch("CREATE TABLE legacy (line TEXT)").unwrap();
            conn.execute("INSERT INTO legacy (line) VALUES (?1)", [SAMPLE])
                .unwrap();
        }
        let cfg = PipelineConfig {
            targets: TargetTables {
                institution: "institutions".into(),
                department: "departments".into(),
                admission_result: "admission_results".into(),
            },
            enforce_foreign_keys: true,
            ..cfg()
        };

        let summary = with_store(&path, |conn| run_migration(conn, &cfg)).unwrap();
        assert_eq!(summary.departments_inserted, 1);

        let conn = Connection::open(&path).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM departments", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
        assert!(table_exists(&conn, "admission_results").unwrap());
    }
}
