#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `nasfs` is the filesystem layer of a storage appliance: it copies
//! directory trees between datasets, answers which mount or dataset a path
//! lives on, and tears mounts down. This crate re-exports the public API of
//! the workspace crates so that callers depend on a single package.
//!
//! | Area | Crate | Entry points |
//! |------|-------|--------------|
//! | Mount introspection | [`mount`] | [`mount_id_of_path`], [`statmount`], [`iter_mounts`] |
//! | Unmounting | [`mount`] | [`unmount`] with [`UnmountOptions`] |
//! | Dataset resolution | [`dataset`] | [`resolve_dataset_path`] |
//! | File copying | [`fast_io`] | [`clone_or_copy_file`], [`copy_file_with`] |
//! | Metadata | [`metadata`] | [`propagate`], [`copy_user_xattrs`] |
//! | Tree copying | [`copytree`] | [`copy_tree`] with [`CopyTreeConfig`] |
//!
//! Every fallible operation returns [`FsResult`]; [`FsError::kind`] gives
//! the classified [`FsErrorKind`]. Diagnostics go through `tracing` under the
//! `nasfs::*` targets; install a subscriber with [`init_tracing`].
//!
//! # Examples
//!
//! ```no_run
//! use std::path::Path;
//! use nasfs::{CopyFlags, CopyTreeConfig, copy_tree};
//!
//! let config = CopyTreeConfig::new().flags(CopyFlags::PERMISSIONS | CopyFlags::TIMESTAMPS);
//! let stats = copy_tree(Path::new("/mnt/tank/a"), Path::new("/mnt/tank/b"), &config)?;
//! assert_eq!(stats.metadata_failures, 0);
//! # Ok::<(), nasfs::FsError>(())
//! ```

pub use copytree::{
    ControlDirSentinel, CopyTreeConfig, CopyTreeStats, ProgressSink, ZFS_CTLDIR_INO, copy_tree,
};
pub use dataset::{
    DatasetLocator, DatasetReference, Resolution, StaticLocator, resolve_dataset_path,
};
pub use fast_io::{
    CopyOperation, CopyPrimitives, KernelPrimitives, clone_file, clone_or_copy_file,
    copy_file_userspace, copy_file_with, copy_sendfile,
};
pub use logging::{LogConfig, init_tracing};
pub use metadata::{
    Attribute, CopyFlags, FileKind, MetadataFailure, PropagationReport, copy_user_xattrs,
    propagate, propagate_at,
};
pub use mount::{
    DeviceId, MountId, MountIter, MountOptions, MountRecord, SuperOptions, UnmountOptions,
    iter_mounts, mount_id_of_fd, mount_id_of_path, statmount, unmount,
};
pub use platform::{FsError, FsErrorKind, FsResult};

pub use copytree;
pub use dataset;
pub use fast_io;
pub use metadata;
pub use mount;
