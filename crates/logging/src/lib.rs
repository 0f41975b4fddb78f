#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` gives every crate in the workspace the same tracing targets and a
//! single place to install a subscriber. Library code never prints; it emits
//! events through the subsystem macros ([`trace_copy!`], [`trace_mount!`],
//! [`trace_meta!`], [`trace_resolve!`], [`trace_io!`] and the `warn_*`
//! variants) and the embedding application decides what to keep.
//!
//! # Examples
//!
//! ```
//! use logging::{LogConfig, init_tracing};
//!
//! let config = LogConfig::from_verbose_level(2);
//! let _ = init_tracing(&config);
//! logging::trace_copy!("copied {} files", 3);
//! ```

mod config;
mod tracing_macros;

pub use config::{LogConfig, init_tracing};

#[doc(hidden)]
pub use tracing;

/// Tracing targets, one per subsystem.
pub mod targets {
    /// Tree copier.
    pub const COPY: &str = "nasfs::copy";
    /// Metadata propagator.
    pub const META: &str = "nasfs::meta";
    /// Mount introspector and unmount controller.
    pub const MOUNT: &str = "nasfs::mount";
    /// Dataset path resolver.
    pub const RESOLVE: &str = "nasfs::resolve";
    /// Copy mechanisms (clone, sendfile, userspace).
    pub const IO: &str = "nasfs::io";
}
