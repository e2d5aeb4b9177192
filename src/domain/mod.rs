//! Domain layer for the image migration workflow
//!
//! This module contains the typed model of TeamCity cloud configuration and
//! the port through which the services reach the server.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{ApiError, MigrationError, MigrationResult};
