//! Row-local failures. None of these abort a run; the pipeline logs them,
//! counts them, and moves on to the next legacy row.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RowError {
    #[error("malformed row: expected {expected} fields, got {actual} (raw: {raw})")]
    Malformed {
        raw: String,
        expected: usize,
        actual: usize,
    },

    #[error("legacy row {position} holds no text")]
    NullRow { position: usize },

    #[error(
        "non-numeric {field} for department {department_code:?} \
         (admission_capacity={admission_capacity:?}, graduates_count={graduates_count:?})"
    )]
    InvalidCount {
        field: &'static str,
        department_code: String,
        admission_capacity: String,
        graduates_count: String,
    },

    #[error("failed to write {entity} {key:?}: {source}")]
    Write {
        entity: &'static str,
        key: String,
        #[source]
        source: rusqlite::Error,
    },
}

impl RowError {
    /// Short label used for log fields and summary buckets.
    pub fn kind(&self) -> &'static str {
        match self {
            RowError::Malformed { .. } => "malformed",
            RowError::NullRow { .. } => "null_row",
            RowError::InvalidCount { .. } => "invalid_count",
            RowError::Write { .. } => "write",
        }
    }

    /// Rows that never reached the mapper (wrong arity or no text at all).
    pub fn is_malformed(&self) -> bool {
        matches!(self, RowError::Malformed { .. } | RowError::NullRow { .. })
    }
}
