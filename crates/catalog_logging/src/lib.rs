#![deny(missing_docs)]
//! Shared logging utilities for the catalog harvester workspace.
//!
//! This crate provides the `catalog_*` logging macros used across the
//! harvesting pipeline and a minimal test initializer for the global logger.
//! Messages go through the `log` facade, so whatever logger the binary
//! installs receives them.

/// Log target used by the harvesting pipeline. Lets a binary raise or lower
/// pipeline verbosity independently of its dependencies.
pub const HARVEST_TARGET: &str = "catalog";

/// Logs a trace-level message under the harvest target.
#[macro_export]
macro_rules! catalog_trace {
    ($($arg:tt)*) => {{
        log::trace!(target: $crate::HARVEST_TARGET, $($arg)*);
    }};
}

/// Logs a debug-level message under the harvest target.
#[macro_export]
macro_rules! catalog_debug {
    ($($arg:tt)*) => {{
        log::debug!(target: $crate::HARVEST_TARGET, $($arg)*);
    }};
}

/// Logs an info-level message under the harvest target.
#[macro_export]
macro_rules! catalog_info {
    ($($arg:tt)*) => {{
        log::info!(target: $crate::HARVEST_TARGET, $($arg)*);
    }};
}

/// Logs a warn-level message under the harvest target.
#[macro_export]
macro_rules! catalog_warn {
    ($($arg:tt)*) => {{
        log::warn!(target: $crate::HARVEST_TARGET, $($arg)*);
    }};
}

/// Logs an error-level message under the harvest target.
#[macro_export]
macro_rules! catalog_error {
    ($($arg:tt)*) => {{
        log::error!(target: $crate::HARVEST_TARGET, $($arg)*);
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
