//! Insert-if-absent writes for the normalized tables.
//!
//! Every insert keeps the first-seen row for a key: a conflicting primary key
//! is a no-op, never an update.

use rusqlite::{params, Connection};
use serde::Serialize;

use crate::database_ops::config::TargetTables;
use crate::database_ops::models::{AdmissionResult, Department, Institution};
use crate::database_ops::store::quote_ident;
use crate::error::RowError;
use crate::normalization::fields::LegacyFields;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteStatus {
    Inserted,
    AlreadyPresent,
    /// The row had no key for this entity, so nothing was attempted.
    NotApplicable,
}

impl WriteStatus {
    fn from_changes(changed: usize) -> Self {
        if changed > 0 {
            WriteStatus::Inserted
        } else {
            WriteStatus::AlreadyPresent
        }
    }
}

/// What happened to each entity for one legacy row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowOutcome {
    pub institution: WriteStatus,
    pub department: WriteStatus,
}

pub fn insert_institution_if_absent(
    conn: &Connection,
    tables: &TargetTables,
    institution: &Institution,
) -> rusqlite::Result<WriteStatus> {
    let sql = format!(
        "INSERT INTO {} (univ_name, address) VALUES (?1, ?2) ON CONFLICT(univ_name) DO NOTHING",
        quote_ident(&tables.institution)
    );
    let changed = conn
        .prepare_cached(&sql)?
        .execute(params![institution.name, institution.address])?;
    Ok(WriteStatus::from_changes(changed))
}

pub fn insert_department_if_absent(
    conn: &Connection,
    tables: &TargetTables,
    department: &Department,
) -> rusqlite::Result<WriteStatus> {
    let sql = format!(
        r#"INSERT INTO {} (
            dept_code, univ_name, dept_name, seven_major_categories,
            standard_classification_code, univ_specific_category, college_name,
            dept_characteristic, main_subjects, admission_capacity,
            graduates_count, related_jobs
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        ON CONFLICT(dept_code) DO NOTHING"#,
        quote_ident(&tables.department)
    );
    let changed = conn.prepare_cached(&sql)?.execute(params![
        department.code,
        department.institution_name,
        department.name,
        department.seven_category,
        department.standard_classification_code,
        department.institution_category,
        department.college_name,
        department.characteristic,
        department.main_subjects,
        department.admission_capacity,
        department.graduates_count,
        department.related_occupations,
    ])?;
    Ok(WriteStatus::from_changes(changed))
}

/// Admission results have a surrogate key, so "absent" means no row yet for the
/// same department, year and admission type.
pub fn insert_admission_result_if_absent(
    conn: &Connection,
    tables: &TargetTables,
    result: &AdmissionResult,
) -> rusqlite::Result<WriteStatus> {
    let table = quote_ident(&tables.admission_result);
    let sql = format!(
        r#"INSERT INTO {table} (
            dept_code, admission_year, admission_type, competition_rate,
            cutoff_70_percent, cutoff_50_percent, average_score
        )
        SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7
        WHERE NOT EXISTS (
            SELECT 1 FROM {table}
            WHERE dept_code = ?1 AND admission_year = ?2 AND admission_type IS ?3
        )"#
    );
    let changed = conn.prepare_cached(&sql)?.execute(params![
        result.department_code,
        result.admission_year,
        result.admission_type,
        result.competition_rate,
        result.cutoff_70_percent,
        result.cutoff_50_percent,
        result.average_score,
    ])?;
    Ok(WriteStatus::from_changes(changed))
}

/// Write the institution, then the department, derived from one parsed row.
///
/// Legacy rows carry no competition or cutoff figures, so no admission result
/// is derived here.
pub fn write_record(
    conn: &Connection,
    tables: &TargetTables,
    fields: &LegacyFields,
) -> Result<RowOutcome, RowError> {
    let institution = match Institution::from_fields(fields) {
        Some(inst) => insert_institution_if_absent(conn, tables, &inst).map_err(|source| {
            RowError::Write {
                entity: "institution",
                key: inst.name.clone(),
                source,
            }
        })?,
        None => WriteStatus::NotApplicable,
    };

    let department = match Department::from_fields(fields) {
        Some(dept) => insert_department_if_absent(conn, tables, &dept).map_err(|source| {
            RowError::Write {
                entity: "department",
                key: dept.code.clone(),
                source,
            }
        })?,
        None => WriteStatus::NotApplicable,
    };

    Ok(RowOutcome {
        institution,
        department,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_ops::schema::ensure_schema;

    const SAMPLE: &str = "2024,51,강원특별자치도,11010,A구,대한대학교,대학,4,학사,주간,정상,컴퓨터공학과,CS001,공학,E01,자체공학,공과대학,실습중심,자료구조,60,55,소프트웨어개발자,2024-01-01,2024-01-01";

    fn setup() -> (Connection, TargetTables) {
        let conn = Connection::open_in_memory().unwrap();
        let tables = TargetTables::default();
        ensure_schema(&conn, &tables).unwrap();
        (conn, tables)
    }

    #[test]
    fn writes_institution_then_department() {
        let (conn, tables) = setup();
        let fields = LegacyFields::parse(SAMPLE, ',').unwrap();
        let outcome = write_record(&conn, &tables, &fields).unwrap();
        assert_eq!(outcome.institution, WriteStatus::Inserted);
        assert_eq!(outcome.department, WriteStatus::Inserted);

        let (name, address): (String, Option<String>) = conn
            .query_row("SELECT univ_name, address FROM Univ", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(name, "대한대학교");
        assert_eq!(address.as_deref(), Some("강원특별자치도 A구"));

        let (code, cap, grads): (String, Option<i64>, Option<i64>) = conn
            .query_row(
                "SELECT dept_code, admission_capacity, graduates_count FROM Depart",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap();
        assert_eq!((code.as_str(), cap, grads), ("CS001", Some(60), Some(55)));
    }

    #[test]
    fn first_seen_department_wins() {
        let (conn, tables) = setup();
        let first = LegacyFields::parse(SAMPLE, ',').unwrap();
        let second = LegacyFields::parse(&SAMPLE.replace("자료구조", "운영체제"), ',').unwrap();

        write_record(&conn, &tables, &first).unwrap();
        let outcome = write_record(&conn, &tables, &second).unwrap();
        assert_eq!(outcome.institution, WriteStatus::AlreadyPresent);
        assert_eq!(outcome.department, WriteStatus::AlreadyPresent);

        let subjects: String = conn
            .query_row("SELECT main_subjects FROM Depart WHERE dept_code = 'CS001'", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(subjects, "자료구조");
    }

    #[test]
    fn skips_entities_without_keys() {
        let (conn, tables) = setup();
        let fields =
            LegacyFields::parse(&SAMPLE.replace("대한대학교", "").replace("CS001", ""), ',')
                .unwrap();
        let outcome = write_record(&conn, &tables, &fields).unwrap();
        assert_eq!(outcome.institution, WriteStatus::NotApplicable);
        assert_eq!(outcome.department, WriteStatus::NotApplicable);
    }

    #[test]
    fn enforced_foreign_key_surfaces_as_row_error() {
        let (conn, tables) = setup();
        conn.pragma_update(None, "foreign_keys", true).unwrap();
        let dept = Department::from_fields(&LegacyFields::parse(SAMPLE, ',').unwrap()).unwrap();
        assert!(insert_department_if_absent(&conn, &tables, &dept).is_err());

        let orphan = LegacyFields::parse(&SAMPLE.replace("대한대학교", ""), ',').unwrap();
        match write_record(&conn, &tables, &orphan) {
            Err(RowError::Write { entity, key, .. }) => {
                assert_eq!(entity, "department");
                assert_eq!(key, "CS001");
            }
            other => panic!("expected write error, got {other:?}"),
        }
    }

    #[test]
    fn admission_result_is_inserted_once_per_track() {
        let (conn, tables) = setup();
        conn.pragma_update(None, "foreign_keys", true).unwrap();
        let fields = LegacyFields::parse(SAMPLE, ',').unwrap();
        write_record(&conn, &tables, &fields).unwrap();

        let result = AdmissionResult {
            department_code: "CS001".into(),
            admission_year: 2025,
            admission_type: Some("수시교과".into()),
            competition_rate: Some(7.5),
            cutoff_70_percent: Some(2.1),
            cutoff_50_percent: None,
            average_score: None,
        };
        assert_eq!(
            insert_admission_result_if_absent(&conn, &tables, &result).unwrap(),
            WriteStatus::Inserted
        );
        assert_eq!(
            insert_admission_result_if_absent(&conn, &tables, &result).unwrap(),
            WriteStatus::AlreadyPresent
        );
        let untyped = AdmissionResult {
            admission_type: None,
            ..result.clone()
        };
        assert_eq!(
            insert_admission_result_if_absent(&conn, &tables, &untyped).unwrap(),
            WriteStatus::Inserted
        );
        assert_eq!(
            insert_admission_result_if_absent(&conn, &tables, &untyped).unwrap(),
            WriteStatus::AlreadyPresent
        );

        let dangling = AdmissionResult {
            department_code: "XX999".into(),
            ..result
        };
        assert!(insert_admission_result_if_absent(&conn, &tables, &dangling).is_err());
    }
}
