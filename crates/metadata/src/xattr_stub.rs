//! Extended-attribute stubs for builds without the `xattr` feature.
//!
//! Propagation still runs; requesting xattrs yields a `NotSupported`
//! failure that the caller counts like any other.

use std::fs::File;
use std::path::Path;

use platform::{FsError, FsErrorKind, FsResult};

fn unsupported(path: Option<&Path>) -> FsError {
    FsError::with_message(
        FsErrorKind::NotSupported,
        "copy extended attributes",
        path,
        "built without extended attribute support",
    )
}

/// Always fails with [`FsErrorKind::NotSupported`].
pub fn copy_user_xattrs(_source: &File, _destination: &File) -> FsResult<usize> {
    Err(unsupported(None))
}

/// Always fails with [`FsErrorKind::NotSupported`].
pub fn copy_user_xattrs_at(_source: &Path, destination: &Path) -> FsResult<usize> {
    Err(unsupported(Some(destination)))
}
