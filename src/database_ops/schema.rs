use rusqlite::Connection;
use tracing::debug;

use crate::database_ops::config::TargetTables;
use crate::database_ops::store::quote_ident;

/// DDL for the three normalized tables. Every statement is create-if-absent.
pub fn schema_ddl(tables: &TargetTables) -> String {
    let univ = quote_ident(&tables.institution);
    let depart = quote_ident(&tables.department);
    let admission = quote_ident(&tables.admission_result);
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {univ} (
    univ_name TEXT PRIMARY KEY,
    address TEXT
);
CREATE TABLE IF NOT EXISTS {depart} (
    dept_code TEXT PRIMARY KEY,
    univ_name TEXT NOT NULL,
    dept_name TEXT,
    seven_major_categories TEXT,
    standard_classification_code TEXT,
    univ_specific_category TEXT,
    college_name TEXT,
    dept_characteristic TEXT,
    main_subjects TEXT,
    admission_capacity INTEGER,
    graduates_count INTEGER,
    related_jobs TEXT,
    FOREIGN KEY (univ_name) REFERENCES {univ}(univ_name)
);
CREATE TABLE IF NOT EXISTS {admission} (
    result_id INTEGER PRIMARY KEY AUTOINCREMENT,
    dept_code TEXT NOT NULL,
    admission_year INTEGER NOT NULL,
    admission_type TEXT,
    competition_rate REAL,
    cutoff_70_percent REAL,
    cutoff_50_percent REAL,
    average_score REAL,
    FOREIGN KEY (dept_code) REFERENCES {depart}(dept_code)
);
"#
    )
}

/// Ensure the institution, department and admission-result tables exist.
pub fn ensure_schema(conn: &Connection, tables: &TargetTables) -> rusqlite::Result<()> {
    conn.execute_batch(&schema_ddl(tables))?;
    debug!(
        institution = %tables.institution,
        department = %tables.department,
        admission_result = %tables.admission_result,
        "target schema ensured"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_ops::store::{table_columns, table_exists};

    #[test]
    fn creates_tables_once_and_is_repeatable() {
        let conn = Connection::open_in_memory().unwrap();
        let tables = TargetTables::default();
        ensure_schema(&conn, &tables).unwrap();
        conn.execute("INSERT INTO Univ (univ_name) VALUES ('대한대학교')", [])
            .unwrap();
        ensure_schema(&conn, &tables).unwrap();

        for t in ["Univ", "Depart", "AdmissionResult"] {
            assert!(table_exists(&conn, t).unwrap(), "{t}");
        }
        let kept: i64 = conn
            .query_row("SELECT COUNT(*) FROM Univ", [], |r| r.get(0))
            .unwrap();
        assert_eq!(kept, 1);

        let cols = table_columns(&conn, "Depart").unwrap();
        assert_eq!(cols.len(), 12);
        assert!(cols.contains("admission_capacity"));
    }

    #[test]
    fn foreign_keys_follow_custom_names() {
        let conn = Connection::open_in_memory().unwrap();
        let tables = TargetTables {
            institution: "institutions".into(),
            department: "departments".into(),
            admission_result: "admission_results".into(),
        };
        ensure_schema(&conn, &tables).unwrap();
        let parent: String = conn
            .query_row(
                "SELECT \"table\" FROM pragma_foreign_key_list('departments')",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(parent, "institutions");
    }
}
