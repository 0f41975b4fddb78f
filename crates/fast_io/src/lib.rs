//! Single-file content copy for the tree copier.
//!
//! This crate moves the bytes of one regular file between two open
//! descriptors, preferring the cheapest mechanism the filesystems allow.
//!
//! # Mechanisms
//!
//! - **Clone**: positional `copy_file_range(2)`. Shares blocks on ZFS with
//!   block cloning, btrfs and XFS.
//! - **Sendfile**: in-kernel `sendfile(2)` transfer, no userspace buffer.
//! - **Userspace**: `pread`/`pwrite` through a 1 MiB buffer.
//!
//! [`CopyOperation::Auto`] tries them in that order. Clone falls through on
//! cross-device or unsupported errors, sendfile when it stops short of the
//! source length, and every mechanism resumes at the byte offset the previous
//! one reached. The explicit operations use one mechanism and fail on the
//! first error.
//!
//! # Testing seam
//!
//! The kernel calls sit behind [`CopyPrimitives`], so failures such as
//! `EXDEV` from clone or a premature zero from sendfile can be injected
//! without special filesystems.

#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]

mod copy;
mod copy_file_range;
mod primitives;
mod sendfile;
mod userspace;

pub use copy::{
    CopyOperation, clone_file, clone_or_copy_file, copy_file_userspace, copy_file_with,
    copy_sendfile,
};
pub use primitives::{CopyPrimitives, KernelPrimitives};

/// Largest transfer the kernel accepts in one read/write style call
/// (`MAX_RW_COUNT`).
pub const MAX_CHUNK: usize = 0x7fff_f000;

/// Buffer size of the userspace mechanism.
pub const USERSPACE_BUFFER_SIZE: usize = 1024 * 1024;

/// How a zero-copy mechanism stopped.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum RangeEnd {
    /// Reached the requested end.
    Complete,
    /// The kernel returned zero before the end.
    Stalled,
}
