#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `metadata` copies the attributes of one filesystem entry onto another:
//! ownership, permission bits, access and modification times with
//! nanosecond precision, and `user.*` extended attributes. Which of them are
//! applied is selected with [`CopyFlags`].
//!
//! # Rules by file kind
//!
//! | Kind | Owner | Permissions | Timestamps | Xattrs |
//! |------|-------|-------------|------------|--------|
//! | regular file, directory | `chown` | `chmod` | atime and mtime | `user.*` |
//! | symlink | `lchown` | ignored | ignored | ignored |
//! | other | ignored | ignored | ignored | ignored |
//!
//! Attributes are applied in the order xattrs, owner, permissions,
//! timestamps so that nothing written later disturbs the times.
//!
//! # Failures
//!
//! A failure to apply one attribute does not stop the others. Each one is
//! logged on the `nasfs::meta` target and recorded in the returned
//! [`PropagationReport`]; the caller decides whether it is fatal.
//!
//! # Examples
//!
//! ```no_run
//! use std::path::Path;
//! use metadata::{CopyFlags, propagate};
//!
//! let report = propagate(
//!     Path::new("/mnt/tank/src/file"),
//!     Path::new("/mnt/tank/dst/file"),
//!     CopyFlags::PERMISSIONS | CopyFlags::TIMESTAMPS,
//! )?;
//! assert!(report.is_clean());
//! # Ok::<(), platform::FsError>(())
//! ```

mod apply;
mod flags;
mod ownership;
mod report;

#[cfg(all(unix, feature = "xattr"))]
mod xattr;
#[cfg(not(all(unix, feature = "xattr")))]
#[path = "xattr_stub.rs"]
mod xattr;

pub use apply::{propagate, propagate_at, propagate_with_metadata};
pub use flags::{CopyFlags, FileKind};
pub use report::{Attribute, MetadataFailure, PropagationReport};
pub use xattr::{copy_user_xattrs, copy_user_xattrs_at};
