mod query;
mod warehouse;

pub use query::*;
pub use warehouse::*;

/// SQL migration for the warehouse schema
pub const MIGRATION_001_WAREHOUSE: &str = include_str!("migrations/001_warehouse.sql");
