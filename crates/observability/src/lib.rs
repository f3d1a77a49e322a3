//! Process-wide logging setup shared by the storefront binaries.

/// Initialize process-wide tracing.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    self::tracing::init(self::tracing::LogFormat::from_env());
}

/// Tracing configuration (filters, layers).
pub mod tracing;
