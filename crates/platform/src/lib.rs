#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `platform` isolates the raw Linux syscalls the workspace needs and that
//! neither `std` nor `libc` wrap in a usable form: `statx(2)` with mount-id
//! and attribute fields, `statmount(2)`, `listmount(2)`, and `umount2(2)`.
//! `mount`, `dataset`, `copytree` and `logging` deny `unsafe` and reach the
//! kernel through these wrappers or `rustix`. Two narrow exceptions keep
//! their `unsafe` local, each block with a `SAFETY` comment:
//! `fast_io::primitives` calls `copy_file_range(2)` and `sendfile(2)`
//! through `libc`, and `metadata::ownership` builds `rustix` uid and gid
//! values.
//!
//! The crate also owns the workspace error taxonomy, [`FsError`] and
//! [`FsErrorKind`], so that every layer classifies errno values the same way.
//!
//! # Invariants
//!
//! - Wrappers return [`std::io::Error`] carrying the raw errno; classification
//!   into [`FsErrorKind`] happens in [`FsError::from_io`].
//! - Kernel structures are declared `#[repr(C)]` with compile-time size checks.

pub mod error;

#[cfg(target_os = "linux")]
pub mod statmount;
#[cfg(target_os = "linux")]
pub mod statx;
#[cfg(target_os = "linux")]
pub mod umount;

pub use error::{FsError, FsErrorKind, FsResult, IoResultExt};
