//! Shared Utilities for heic-convert
//!
//! Batch plumbing that knows nothing about image formats:
//! - Extension sniffing helpers
//! - Safe argv rendering for paths handed to external tools
//! - tracing-based logging and logged external command execution
//! - Bounded worker pool with exactly-one-result-per-item semantics

pub mod common_utils;
pub mod logging;
pub mod path_safety;
pub mod worker_pool;

pub use common_utils::{get_extension_lowercase, has_extension};
pub use logging::{
    execute_external_command, init_logging, ExternalCommandResult, LogConfig,
};
pub use path_safety::safe_path_arg;
pub use worker_pool::{run_bounded, PoolError};
