pub mod cli;
pub mod database_ops;
pub mod error;
pub mod normalization;

pub mod util {
    pub mod env;
    pub mod logging;
}

pub use database_ops::config::PipelineConfig;
pub use database_ops::pipeline::{run_migration, MigrationSummary};
