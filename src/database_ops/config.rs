use std::path::PathBuf;

use crate::util::env as env_util;

pub const DEFAULT_STORE_PATH: &str = "universities.db";
pub const DEFAULT_LEGACY_TABLE: &str = "university_departments";
/// The legacy dataset stores every row in one column whose name is the
/// underscore-joined header of the original export.
pub const DEFAULT_LEGACY_COLUMN: &str = "_연도_시도코드_시도명_시군구코드_시군구명_학교명_학교구분명_수업연한_학위과정명_주야과정명_학과상태명_학과명_학과코드명_7대계열__표준분류계열코드_대학자체계열명_단과대학명_학교학과특성명_주요교과목명_입학정원수_졸업자수_관련직업명_수정일자_데이터기준일자";
pub const DEFAULT_DELIMITER: char = ',';

/// Where the delimited legacy rows live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacySource {
    pub table: String,
    pub column: String,
}

impl Default for LegacySource {
    fn default() -> Self {
        Self {
            table: DEFAULT_LEGACY_TABLE.to_string(),
            column: DEFAULT_LEGACY_COLUMN.to_string(),
        }
    }
}

/// Names of the normalized tables the pipeline writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetTables {
    pub institution: String,
    pub department: String,
    pub admission_result: String,
}

impl Default for TargetTables {
    fn default() -> Self {
        Self {
            institution: "Univ".to_string(),
            department: "Depart".to_string(),
            admission_result: "AdmissionResult".to_string(),
        }
    }
}

/// Immutable settings handed to [`crate::database_ops::pipeline::run_migration`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub source: LegacySource,
    pub delimiter: char,
    pub targets: TargetTables,
    /// Turn on `PRAGMA foreign_keys` for the run. Off by default: department rows
    /// rely on insertion order rather than the engine to keep their institution.
    pub enforce_foreign_keys: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source: LegacySource::default(),
            delimiter: DEFAULT_DELIMITER,
            targets: TargetTables::default(),
            enforce_foreign_keys: false,
        }
    }
}

impl PipelineConfig {
    /// Defaults overlaid with `LEGACY_*`, `*_TABLE` and `ENFORCE_FOREIGN_KEYS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            source: LegacySource {
                table: env_util::env_opt("LEGACY_TABLE").unwrap_or(defaults.source.table),
                column: env_util::env_opt("LEGACY_COLUMN").unwrap_or(defaults.source.column),
            },
            delimiter: env_util::env_opt("LEGACY_DELIMITER")
                .and_then(|raw| parse_delimiter(&raw))
                .unwrap_or(defaults.delimiter),
            targets: TargetTables {
                institution: env_util::env_opt("UNIV_TABLE")
                    .unwrap_or(defaults.targets.institution),
                department: env_util::env_opt("DEPART_TABLE")
                    .unwrap_or(defaults.targets.department),
                admission_result: env_util::env_opt("ADMISSION_TABLE")
                    .unwrap_or(defaults.targets.admission_result),
            },
            enforce_foreign_keys: env_util::env_flag(
                "ENFORCE_FOREIGN_KEYS",
                defaults.enforce_foreign_keys,
            ),
        }
    }
}

/// Store file from `UNIV_DB_PATH`, falling back to `universities.db` in the cwd.
pub fn store_path_from_env() -> PathBuf {
    env_util::env_opt("UNIV_DB_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH))
}

/// Accepts a single character, or the names `tab`/`\t` for a tab.
pub fn parse_delimiter(raw: &str) -> Option<char> {
    match raw {
        "\\t" | "tab" | "TAB" => return Some('\t'),
        _ => {}
    }
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
