//! Logging setup for services embedding the formatter

mod config;

pub use config::{init_tracing, LogConfig, DEFAULT_LOG_FILTER};
