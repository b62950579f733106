//! Tracing/logging setup shared by every binary.

/// Initialize process-wide tracing at `info`, formatted per `LIBRIS_LOG_FORMAT`.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init("info", tracing::LogFormat::from_env());
}

/// Tracing configuration (filters, formats).
pub mod tracing;
