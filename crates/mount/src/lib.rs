#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `mount` answers two questions about the kernel mount table: which mount a
//! path lives on, and what that mount looks like. It also tears mounts down,
//! either one at a time or as a whole subtree with children unmounted before
//! their parent.
//!
//! Lookups go through `statx(2)` with the mount-id mask, records come from
//! `statmount(2)`, and enumeration from `listmount(2)`. All three require
//! Linux 6.8 or later; on older kernels the functions fail with
//! [`FsErrorKind::NotSupported`](platform::FsErrorKind::NotSupported).
//!
//! # Examples
//!
//! ```no_run
//! use std::path::Path;
//!
//! let id = mount::mount_id_of_path(Path::new("/"))?;
//! let record = mount::statmount(id)?;
//! println!("{} is {} from {}", record.mountpoint.display(), record.fs_type, record.source);
//!
//! for child in mount::iter_mounts(Some(id), false) {
//!     let child = child?;
//!     println!("child: {}", child.mountpoint.display());
//! }
//! # Ok::<(), platform::FsError>(())
//! ```
//!
//! # Invariants
//!
//! - Option bitmasks are decoded into [`MountOptions`] and [`SuperOptions`];
//!   raw kernel integers never leave this crate.
//! - Every record is a snapshot taken by one syscall. Nothing is cached.

mod introspect;
mod iter;
mod record;
mod unmount;

pub use introspect::{mount_id_of_fd, mount_id_of_path, statmount, statmount_with_mask};
pub use iter::{MountIter, iter_mounts};
pub use record::{DeviceId, MountId, MountOptions, MountRecord, SuperOptions};
pub use unmount::{UnmountOptions, unmount};
