//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - Human-readable or JSON console output on stderr
//! - Optional JSON log file
pub mod config;
pub mod logger;

pub use config::{LogConfig, LogFormat};
pub use logger::LoggerImpl;
