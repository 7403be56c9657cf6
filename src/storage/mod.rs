//! Storage module for database and configuration.

pub mod config;
pub mod database;
pub mod schema;

pub use config::{load_config, ConfigError, ImportConfig};
pub use database::{Database, DatabaseError};
