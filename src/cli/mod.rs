pub mod db_counts;
pub mod import_admissions;
pub mod migrate;
