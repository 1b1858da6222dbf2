mod repository;

pub use repository::*;

/// SQL migration for the keyed state table
pub const MIGRATION_001_APP_STATE: &str = include_str!("migrations/001_app_state.sql");
