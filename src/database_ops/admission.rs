//! Import of published admission results (competition rates and cutoffs).
//!
//! The CSV carries university and department names but no department code, so
//! each record is joined to an already-migrated department by name. Only
//! tracks decided by 수능, 교과 or 종합 are kept; when a name pair resolves to
//! several departments, the day-program one is used.

use std::collections::HashSet;
use std::io::Read;

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::database_ops::config::{PipelineConfig, TargetTables};
use crate::database_ops::legacy::read_legacy_rows;
use crate::database_ops::models::AdmissionResult;
use crate::database_ops::schema::ensure_schema;
use crate::database_ops::store::{quote_ident, set_foreign_keys};
use crate::database_ops::writer::{insert_admission_result_if_absent, WriteStatus};
use crate::normalization::fields::LegacyFields;

const COL_UNIVERSITY: usize = 0;
const COL_DEPARTMENT: usize = 2;
const COL_ADMISSION_TYPE: usize = 4;
const COL_COMPETITION_RATE: usize = 7;
const COL_CUTOFF_50: usize = 9;
const COL_CUTOFF_70: usize = 10;
const MIN_COLUMNS: usize = COL_CUTOFF_70 + 1;

const DAY_PROGRAM: &str = "주간";
const ADMISSION_TRACKS: [&str; 3] = ["수능", "교과", "종합"];

#[derive(Debug, Clone, Default, Serialize)]
pub struct AdmissionImportSummary {
    pub records_read: usize,
    pub records_malformed: usize,
    pub records_unmatched: usize,
    pub records_filtered: usize,
    pub records_failed: usize,
    pub inserted: usize,
    pub already_present: usize,
}

/// Department codes listed under a (university, department) name pair, in code order.
pub fn department_candidates(
    conn: &Connection,
    tables: &TargetTables,
    university: &str,
    department: &str,
) -> rusqlite::Result<Vec<String>> {
    let sql = format!(
        "SELECT dept_code FROM {} WHERE univ_name = ?1 AND dept_name = ?2 ORDER BY dept_code",
        quote_ident(&tables.department)
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let codes = stmt
        .query_map([university, department], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(codes)
}

/// Department code for a (university, department) name pair. A day-program
/// department wins; otherwise the lowest code does.
pub fn lookup_department_code(
    conn: &Connection,
    tables: &TargetTables,
    day_codes: &HashSet<String>,
    university: &str,
    department: &str,
) -> rusqlite::Result<Option<String>> {
    let candidates = department_candidates(conn, tables, university, department)?;
    let preferred = candidates
        .iter()
        .position(|code| day_codes.contains(code))
        .unwrap_or(0);
    Ok(candidates.into_iter().nth(preferred))
}

/// Codes of departments whose legacy row is a day program. Rows that do not
/// parse are ignored here; `migrate` already reported them.
pub fn day_program_codes(conn: &Connection, cfg: &PipelineConfig) -> Result<HashSet<String>> {
    let rows = read_legacy_rows(conn, &cfg.source)?;
    let codes: HashSet<String> = rows
        .iter()
        .filter_map(|rec| rec.raw.as_deref())
        .filter_map(|raw| LegacyFields::parse(raw, cfg.delimiter).ok())
        .filter(|fields| fields.day_night_program.as_deref().map(str::trim) == Some(DAY_PROGRAM))
        .filter_map(|fields| fields.department_code)
        .filter(|code| !code.is_empty())
        .collect();
    debug!(day_programs = codes.len(), "day-program departments indexed");
    Ok(codes)
}

/// Whether an admission type names one of the imported tracks.
pub fn is_imported_track(admission_type: &str) -> bool {
    ADMISSION_TRACKS
        .iter()
        .any(|track| admission_type.contains(track))
}

/// Lenient score parsing: anything that is not a number becomes null.
pub fn parse_score(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Load admission results from `reader` for `year`. Runs in one transaction.
///
/// The legacy source named by `cfg` must still be present: it decides which
/// department a name pair resolves to.
#[instrument(skip_all, fields(year = year))]
pub fn import_admission_results<R: Read>(
    conn: &mut Connection,
    cfg: &PipelineConfig,
    reader: R,
    year: i64,
) -> Result<AdmissionImportSummary> {
    let tables = &cfg.targets;
    set_foreign_keys(conn, cfg.enforce_foreign_keys)
        .context("failed to set foreign_keys pragma")?;
    let tx = conn
        .transaction()
        .context("failed to begin admission import transaction")?;
    ensure_schema(&tx, tables).context("failed to create target schema")?;
    let day_codes = day_program_codes(&tx, cfg).context("failed to index legacy departments")?;

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let mut summary = AdmissionImportSummary::default();

    for (idx, record) in csv_reader.records().enumerate() {
        // header is line 1
        let line = idx + 2;
        summary.records_read += 1;
        let record = match record {
            Ok(r) => r,
            Err(err) => {
                warn!(line, error = %err, "unreadable admission record; skipping");
                summary.records_malformed += 1;
                continue;
            }
        };
        if record.len() < MIN_COLUMNS {
            warn!(
                line,
                expected = MIN_COLUMNS,
                actual = record.len(),
                "short admission record; skipping"
            );
            summary.records_malformed += 1;
            continue;
        }

        let university = record[COL_UNIVERSITY].trim();
        let department = record[COL_DEPARTMENT].trim();
        let track = record[COL_ADMISSION_TYPE].trim();
        if !is_imported_track(track) {
            debug!(line, university, department, track, "admission track not imported");
            summary.records_filtered += 1;
            continue;
        }
        let code = match lookup_department_code(&tx, tables, &day_codes, university, department) {
            Ok(Some(code)) => code,
            Ok(None) => {
                debug!(line, university, department, "no matching department");
                summary.records_unmatched += 1;
                continue;
            }
            Err(err) => {
                warn!(line, university, department, error = %err, "department lookup failed");
                summary.records_failed += 1;
                continue;
            }
        };

        let result = AdmissionResult {
            department_code: code,
            admission_year: year,
            admission_type: Some(track.to_string()),
            competition_rate: parse_score(&record[COL_COMPETITION_RATE]),
            cutoff_70_percent: parse_score(&record[COL_CUTOFF_70]),
            cutoff_50_percent: parse_score(&record[COL_CUTOFF_50]),
            average_score: None,
        };

        match insert_admission_result_if_absent(&tx, tables, &result) {
            Ok(WriteStatus::Inserted) => summary.inserted += 1,
            Ok(_) => summary.already_present += 1,
            Err(err) => {
                warn!(
                    line,
                    department_code = %result.department_code,
                    error = %err,
                    "failed to insert admission result"
                );
                summary.records_failed += 1;
            }
        }
    }

    tx.commit().context("failed to commit admission import")?;
    info!(
        read = summary.records_read,
        inserted = summary.inserted,
        unmatched = summary.records_unmatched,
        filtered = summary.records_filtered,
        "admission results imported"
    );
    Ok(summary)
}
