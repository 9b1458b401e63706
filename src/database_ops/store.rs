//! File-backed SQLite handle plus the small amount of catalog introspection
//! the pipeline needs.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use rusqlite::{Connection, OpenFlags};
use tracing::{debug, warn};

const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Busy handler that never gives up: a locked store stalls the run instead of
/// failing it.
fn wait_for_lock(_attempts: i32) -> bool {
    std::thread::sleep(LOCK_RETRY_INTERVAL);
    true
}

/// Open an existing store for read/write. The file is never created here.
pub fn open_store(path: &Path) -> Result<Connection> {
    if !path.exists() {
        bail!("store file {} does not exist", path.display());
    }
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("failed to open store {}", path.display()))?;
    // replaces rusqlite's default 5s busy timeout
    conn.busy_handler(Some(wait_for_lock as fn(i32) -> bool))
        .context("failed to install busy handler")?;
    debug!(path = %path.display(), "store opened");
    Ok(conn)
}

/// Run `f` against a freshly opened store and release the connection on every
/// exit path, whether `f` succeeded or not.
pub fn with_store<T>(path: &Path, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
    let mut conn = open_store(path)?;
    let outcome = f(&mut conn);
    let released = conn
        .close()
        .map_err(|(_, err)| anyhow::Error::from(err).context("failed to close store"));
    match &released {
        Ok(()) => debug!(path = %path.display(), "store connection released"),
        Err(err) => warn!(path = %path.display(), error = %err, "store close failed"),
    }
    let value = outcome?;
    released?;
    Ok(value)
}

/// Toggle foreign-key enforcement. Must run outside a transaction to take effect.
pub fn set_foreign_keys(conn: &Connection, enabled: bool) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", enabled)
}

pub fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    let mut stmt =
        conn.prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 LIMIT 1")?;
    let mut rows = stmt.query([table])?;
    Ok(rows.next()?.is_some())
}

pub fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<HashSet<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let mut rows = stmt.query([])?;
    let mut cols = HashSet::new();
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        cols.insert(name);
    }
    Ok(cols)
}

pub fn count_rows(conn: &Connection, table: &str) -> rusqlite::Result<i64> {
    conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
        [],
        |row| row.get(0),
    )
}

/// Quote an identifier for interpolation into SQL. Table and column names come
/// from configuration, so they are never bound as parameters.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
