//! Logging macros with verbosity level control.
//!
//! Events go through `tracing`, so the host decides where they end up. The
//! verbosity carried in `EngineConfig` gates them before they reach the
//! subscriber:
//! - 0: SILENT (nothing from the core)
//! - 1: CHANGES (readiness verdicts, aggregation summaries)
//! - 2: CHECKS (dropped slots, unrecognised skill tags)
//! - 3: DEBUG (block construction and status walk internals)

/// Verbosity level constants.
pub const VERBOSITY_SILENT: u8 = 0;
pub const VERBOSITY_CHANGES: u8 = 1;
pub const VERBOSITY_CHECKS: u8 = 2;
pub const VERBOSITY_DEBUG: u8 = 3;

/// Log at CHANGES level (verbosity >= 1).
///
/// Used for: readiness verdicts, per-entity aggregation results.
#[macro_export]
macro_rules! log_changes {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_CHANGES {
            ::tracing::info!($($arg)*);
        }
    };
}

/// Log at CHECKS level (verbosity >= 2).
///
/// Used for: data-quality drops, flagged skill tags.
#[macro_export]
macro_rules! log_checks {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_CHECKS {
            ::tracing::warn!($($arg)*);
        }
    };
}

/// Log at DEBUG level (verbosity >= 3).
///
/// Used for: opened/closed blocks, status walk terminations.
#[macro_export]
macro_rules! log_debug {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_DEBUG {
            ::tracing::debug!($($arg)*);
        }
    };
}
