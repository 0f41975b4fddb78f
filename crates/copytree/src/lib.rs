#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `copytree` recursively copies a directory tree: regular files,
//! directories and symlinks. Devices, sockets and FIFOs are counted and
//! skipped. File contents move through [`fast_io`] (block clone, then
//! sendfile, then userspace) and attributes through [`metadata`].
//!
//! # Walk rules
//!
//! - Entries are visited depth first in byte order of their names.
//! - Below the two roots, entries are opened relative to their parent's
//!   open directory handle and symlinks are never followed: a symlink is
//!   copied as a symlink, and a directory replaced by one mid-walk is an
//!   error.
//! - Parent directories are created before their contents; a directory's
//!   own metadata is applied after its contents so child writes cannot
//!   disturb its timestamps. The root is handled last.
//! - Directories on another mount than their parent are not entered unless
//!   [`CopyTreeConfig::traverse`] is set.
//! - The ZFS `.zfs` control directory is recognised by inode identity
//!   ([`ControlDirSentinel`]), never by name alone.
//! - If the destination lies inside the source, the walk does not descend
//!   into the destination root.
//!
//! # Failures
//!
//! Anything that prevents an entry from being created or its data from
//! being copied aborts the copy; nothing is rolled back. Attribute failures
//! are logged and counted in [`CopyTreeStats::metadata_failures`] unless
//! [`CopyTreeConfig::raise_error`] is set. A [`ProgressSink`] that reports
//! cancellation stops the walk between entries with
//! [`FsErrorKind::Cancelled`](platform::FsErrorKind::Cancelled).
//!
//! # Examples
//!
//! ```no_run
//! use std::path::Path;
//! use copytree::{CopyFlags, CopyTreeConfig, copy_tree};
//!
//! let config = CopyTreeConfig::new()
//!     .flags(CopyFlags::PERMISSIONS | CopyFlags::TIMESTAMPS)
//!     .exist_ok(false);
//! let stats = copy_tree(Path::new("/mnt/tank/src"), Path::new("/mnt/tank/dst"), &config)?;
//! println!("{} files, {} bytes", stats.files, stats.bytes);
//! # Ok::<(), platform::FsError>(())
//! ```

mod config;
mod progress;
mod sentinel;
mod stats;
mod walk;

pub use config::CopyTreeConfig;
pub use fast_io::CopyOperation;
pub use metadata::CopyFlags;
pub use progress::ProgressSink;
pub use sentinel::{ControlDirSentinel, ZFS_CTLDIR_INO};
pub use stats::CopyTreeStats;
pub use walk::copy_tree;
