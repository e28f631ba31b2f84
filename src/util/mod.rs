//! Utility modules

pub mod json;
pub mod paths;

pub use json::{set_path, value_at, PathError};
pub use paths::{
    config_path, data_dir, default_tape_path, init_data_dir, log_file_path, logs_dir, tapes_dir,
};

/// Milliseconds since the Unix epoch, zero if the clock is before it.
pub fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
