//! crates/logging/src/tracing_macros.rs
//! Convenience macros for subsystem-specific tracing.
//!
//! These macros wrap the standard tracing macros with the targets listed in
//! [`crate::targets`], so filters can address one subsystem at a time.

/// Emit a tree-copy trace.
///
/// # Example
/// ```ignore
/// trace_copy!("copying {}", path.display());
/// ```
#[macro_export]
macro_rules! trace_copy {
    ($($arg:tt)*) => {
        $crate::tracing::debug!(target: "nasfs::copy", $($arg)*);
    };
}

/// Emit a tree-copy warning (skipped entries, recoverable failures).
#[macro_export]
macro_rules! warn_copy {
    ($($arg:tt)*) => {
        $crate::tracing::warn!(target: "nasfs::copy", $($arg)*);
    };
}

/// Emit a mount-table trace.
///
/// # Example
/// ```ignore
/// trace_mount!("unmounting {}", path.display());
/// ```
#[macro_export]
macro_rules! trace_mount {
    ($($arg:tt)*) => {
        $crate::tracing::debug!(target: "nasfs::mount", $($arg)*);
    };
}

/// Emit a metadata-propagation trace.
#[macro_export]
macro_rules! trace_meta {
    ($($arg:tt)*) => {
        $crate::tracing::debug!(target: "nasfs::meta", $($arg)*);
    };
}

/// Emit a metadata-propagation warning.
///
/// Per-attribute failures are non-fatal and reported through this macro.
#[macro_export]
macro_rules! warn_meta {
    ($($arg:tt)*) => {
        $crate::tracing::warn!(target: "nasfs::meta", $($arg)*);
    };
}

/// Emit a dataset-resolution trace.
///
/// # Example
/// ```ignore
/// trace_resolve!("deferring {}: locked dataset", path.display());
/// ```
#[macro_export]
macro_rules! trace_resolve {
    ($($arg:tt)*) => {
        $crate::tracing::debug!(target: "nasfs::resolve", $($arg)*);
    };
}

/// Emit a copy-mechanism trace (clone, sendfile and userspace fallbacks).
///
/// # Example
/// ```ignore
/// trace_io!("sendfile stalled at offset {}", offset);
/// ```
#[macro_export]
macro_rules! trace_io {
    ($($arg:tt)*) => {
        $crate::tracing::debug!(target: "nasfs::io", $($arg)*);
    };
}
