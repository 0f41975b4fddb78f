//! crates/platform/src/error.rs
//!
//! Error taxonomy shared by every crate in the workspace.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result alias used across the workspace.
pub type FsResult<T> = Result<T, FsError>;

/// Classification of a filesystem failure.
///
/// Callers match on the kind rather than on raw errno values. The
/// classification is performed once, at the syscall boundary, by
/// [`FsError::from_io`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FsErrorKind {
    /// Path or mount id does not exist.
    NotFound,
    /// Permissions reject the operation.
    Denied,
    /// Destination already exists.
    Exists,
    /// Mount id was unmounted between lookup and use.
    Gone,
    /// Operation cannot span the source and destination device.
    CrossDevice,
    /// Filesystem or kernel rejects the operation.
    NotSupported,
    /// No space or quota left on the device.
    NoSpace,
    /// Generic I/O failure.
    Io,
    /// Target filesystem is mounted read-only.
    ReadOnlyFs,
    /// Path or a path component exceeds the kernel limit.
    PathTooLong,
    /// Incompatible arguments or flag combinations.
    InvalidArgument,
    /// Recursive unmount target is not a mount root.
    NotAMount,
    /// Operation aborted through a cancellation signal.
    Cancelled,
}

impl FsErrorKind {
    /// Classifies an [`io::Error`], preferring the raw errno when present.
    #[must_use]
    pub fn classify(error: &io::Error) -> Self {
        match error.raw_os_error() {
            Some(errno) => Self::from_errno(errno),
            None => match error.kind() {
                io::ErrorKind::NotFound => Self::NotFound,
                io::ErrorKind::PermissionDenied => Self::Denied,
                io::ErrorKind::AlreadyExists => Self::Exists,
                io::ErrorKind::Unsupported => Self::NotSupported,
                io::ErrorKind::InvalidInput => Self::InvalidArgument,
                io::ErrorKind::ReadOnlyFilesystem => Self::ReadOnlyFs,
                io::ErrorKind::StorageFull | io::ErrorKind::QuotaExceeded => Self::NoSpace,
                io::ErrorKind::InvalidFilename => Self::PathTooLong,
                io::ErrorKind::CrossesDevices => Self::CrossDevice,
                _ => Self::Io,
            },
        }
    }

    /// Maps a raw errno value onto the taxonomy.
    #[must_use]
    pub const fn from_errno(errno: i32) -> Self {
        match errno {
            libc::ENOENT => Self::NotFound,
            libc::EACCES | libc::EPERM => Self::Denied,
            libc::EEXIST => Self::Exists,
            libc::EXDEV => Self::CrossDevice,
            libc::EOPNOTSUPP | libc::ENOSYS | libc::ENOTTY => Self::NotSupported,
            libc::ENOSPC | libc::EDQUOT => Self::NoSpace,
            libc::EROFS => Self::ReadOnlyFs,
            libc::ENAMETOOLONG => Self::PathTooLong,
            libc::EINVAL => Self::InvalidArgument,
            _ => Self::Io,
        }
    }

    /// Short lowercase label used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not found",
            Self::Denied => "permission denied",
            Self::Exists => "already exists",
            Self::Gone => "mount is gone",
            Self::CrossDevice => "cross-device",
            Self::NotSupported => "not supported",
            Self::NoSpace => "no space left",
            Self::Io => "i/o error",
            Self::ReadOnlyFs => "read-only filesystem",
            Self::PathTooLong => "path too long",
            Self::InvalidArgument => "invalid argument",
            Self::NotAMount => "not a mount root",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for FsErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every fallible operation in the workspace.
///
/// Carries the classified [`FsErrorKind`], the action that failed, the path
/// involved (when there is one), and the original [`io::Error`].
#[derive(Debug, Error)]
#[error("failed to {action}{}: {source}", PathSuffix(.path.as_deref()))]
pub struct FsError {
    kind: FsErrorKind,
    action: &'static str,
    path: Option<PathBuf>,
    #[source]
    source: io::Error,
}

impl FsError {
    /// Builds an error with an explicit kind.
    pub fn new(
        kind: FsErrorKind,
        action: &'static str,
        path: Option<PathBuf>,
        source: io::Error,
    ) -> Self {
        Self {
            kind,
            action,
            path,
            source,
        }
    }

    /// Builds an error from an I/O failure, classifying its errno.
    pub fn from_io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::new(
            FsErrorKind::classify(&source),
            action,
            Some(path.into()),
            source,
        )
    }

    /// Builds a path-less error from an I/O failure (descriptor or mount id operations).
    pub fn from_io_unpathed(action: &'static str, source: io::Error) -> Self {
        Self::new(FsErrorKind::classify(&source), action, None, source)
    }

    /// Builds an error that did not originate from a syscall.
    pub fn with_message(
        kind: FsErrorKind,
        action: &'static str,
        path: Option<&Path>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            kind,
            action,
            path.map(Path::to_path_buf),
            io::Error::other(message.into()),
        )
    }

    /// Returns the classified kind.
    #[must_use]
    pub const fn kind(&self) -> FsErrorKind {
        self.kind
    }

    /// Returns the action that failed.
    #[must_use]
    pub const fn action(&self) -> &'static str {
        self.action
    }

    /// Returns the path involved, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the underlying I/O error.
    #[must_use]
    pub const fn io_error(&self) -> &io::Error {
        &self.source
    }

    /// Reclassifies the error, keeping action, path and source.
    #[must_use]
    pub fn reclassify(mut self, kind: FsErrorKind) -> Self {
        self.kind = kind;
        self
    }

    /// Attaches or replaces the path.
    #[must_use]
    pub fn at(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl From<FsError> for io::Error {
    fn from(error: FsError) -> Self {
        let kind = error.source.kind();
        Self::new(kind, error)
    }
}

struct PathSuffix<'a>(Option<&'a Path>);

impl fmt::Display for PathSuffix<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(path) => write!(f, " '{}'", path.display()),
            None => Ok(()),
        }
    }
}

/// Extension trait attaching action and path context to `io::Result`.
pub trait IoResultExt<T> {
    /// Maps the error through [`FsError::from_io`].
    fn fs_context(self, action: &'static str, path: impl Into<PathBuf>) -> FsResult<T>;

    /// Maps the error through [`FsError::from_io_unpathed`].
    fn fs_action(self, action: &'static str) -> FsResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn fs_context(self, action: &'static str, path: impl Into<PathBuf>) -> FsResult<T> {
        self.map_err(|error| FsError::from_io(action, path, error))
    }

    fn fs_action(self, action: &'static str) -> FsResult<T> {
        self.map_err(|error| FsError::from_io_unpathed(action, error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errno_classification_covers_taxonomy() {
        let cases = [
            (libc::ENOENT, FsErrorKind::NotFound),
            (libc::EACCES, FsErrorKind::Denied),
            (libc::EPERM, FsErrorKind::Denied),
            (libc::EEXIST, FsErrorKind::Exists),
            (libc::EXDEV, FsErrorKind::CrossDevice),
            (libc::EOPNOTSUPP, FsErrorKind::NotSupported),
            (libc::ENOSYS, FsErrorKind::NotSupported),
            (libc::ENOSPC, FsErrorKind::NoSpace),
            (libc::EDQUOT, FsErrorKind::NoSpace),
            (libc::EROFS, FsErrorKind::ReadOnlyFs),
            (libc::ENAMETOOLONG, FsErrorKind::PathTooLong),
            (libc::EINVAL, FsErrorKind::InvalidArgument),
            (libc::EIO, FsErrorKind::Io),
        ];
        for (errno, expected) in cases {
            let error = io::Error::from_raw_os_error(errno);
            assert_eq!(FsErrorKind::classify(&error), expected, "errno {errno}");
        }
    }

    #[test]
    fn synthetic_errors_classify_by_kind() {
        let error = io::Error::new(io::ErrorKind::Unsupported, "nope");
        assert_eq!(FsErrorKind::classify(&error), FsErrorKind::NotSupported);
        let error = io::Error::other("mystery");
        assert_eq!(FsErrorKind::classify(&error), FsErrorKind::Io);
    }

    #[test]
    fn display_includes_action_and_path() {
        let error = FsError::from_io(
            "open source file",
            "/tank/data/file",
            io::Error::from_raw_os_error(libc::ENOENT),
        );
        let rendered = error.to_string();
        assert!(rendered.starts_with("failed to open source file '/tank/data/file'"));
        assert_eq!(error.kind(), FsErrorKind::NotFound);
    }

    #[test]
    fn display_without_path_omits_quotes() {
        let error = FsError::from_io_unpathed("statmount", io::Error::from_raw_os_error(libc::ENOENT))
            .reclassify(FsErrorKind::Gone);
        assert_eq!(error.kind(), FsErrorKind::Gone);
        assert!(!error.to_string().contains('\''));
    }

    #[test]
    fn io_result_ext_attaches_context() {
        let result: io::Result<()> = Err(io::Error::from_raw_os_error(libc::EROFS));
        let error = result
            .fs_context("create directory", "/mnt/ro")
            .expect_err("read-only failure");
        assert_eq!(error.kind(), FsErrorKind::ReadOnlyFs);
        assert_eq!(error.path(), Some(Path::new("/mnt/ro")));
    }

    #[test]
    fn converts_back_into_io_error() {
        let error = FsError::from_io("read", "/x", io::Error::from_raw_os_error(libc::EACCES));
        let io_error: io::Error = error.into();
        assert_eq!(io_error.kind(), io::ErrorKind::PermissionDenied);
    }
}
