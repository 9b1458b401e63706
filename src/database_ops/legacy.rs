use anyhow::{bail, Result};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use tracing::info;

use crate::database_ops::config::LegacySource;
use crate::database_ops::store::{quote_ident, table_columns, table_exists};

/// One source row: its 1-based position and the delimited text it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyRecord {
    pub position: usize,
    pub raw: Option<String>,
}

/// Fetch every legacy row from the configured table/column in scan order.
///
/// A missing table or column is a configuration error and fails the run.
pub fn read_legacy_rows(conn: &Connection, source: &LegacySource) -> Result<Vec<LegacyRecord>> {
    if !table_exists(conn, &source.table)? {
        bail!("legacy source table {:?} not found", source.table);
    }
    if !table_columns(conn, &source.table)?.contains(&source.column) {
        bail!(
            "legacy source column {:?} not found in table {:?}",
            source.column,
            source.table
        );
    }

    let sql = format!(
        "SELECT {} FROM {}",
        quote_ident(&source.column),
        quote_ident(&source.table)
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let raw = match row.get_ref(0)? {
            ValueRef::Null => None,
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                Some(String::from_utf8_lossy(bytes).into_owned())
            }
            ValueRef::Integer(v) => Some(v.to_string()),
            ValueRef::Real(v) => Some(v.to_string()),
        };
        out.push(LegacyRecord {
            position: out.len() + 1,
            raw,
        });
    }
    info!(table = %source.table, rows = out.len(), "legacy rows loaded");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> LegacySource {
        LegacySource {
            table: "legacy".into(),
            column: "blob".into(),
        }
    }

    #[test]
    fn reads_rows_in_order_including_nulls() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE legacy (blob TEXT, other INTEGER);
             INSERT INTO legacy (blob) VALUES ('a,b'), (NULL), ('c,d');",
        )
        .unwrap();
        let rows = read_legacy_rows(&conn, &source()).unwrap();
        assert_eq!(
            rows,
            vec![
                LegacyRecord {
                    position: 1,
                    raw: Some("a,b".into()),
                },
                LegacyRecord {
                    position: 2,
                    raw: None,
                },
                LegacyRecord {
                    position: 3,
                    raw: Some("c,d".into()),
                },
            ]
        );
    }

    #[test]
    fn missing_table_or_column_is_fatal() {
        let conn = Connection::open_in_memory().unwrap();
        let err = read_legacy_rows(&conn, &source()).unwrap_err();
        assert!(err.to_string().contains("table"), "{err}");

        conn.execute_batch("CREATE TABLE legacy (other TEXT)").unwrap();
        let err = read_legacy_rows(&conn, &source()).unwrap_err();
        assert!(err.to_string().contains("column"), "{err}");
    }
}
