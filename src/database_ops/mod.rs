pub mod admission;
pub mod config;
pub mod legacy;
pub mod models;
pub mod pipeline;
pub mod schema;
pub mod store;
pub mod writer;
