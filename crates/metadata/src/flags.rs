//! crates/metadata/src/flags.rs

use std::fs;

use bitflags::bitflags;

bitflags! {
    /// Attributes to carry from source to destination.
    ///
    /// The default is every attribute.
    #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
    pub struct CopyFlags: u8 {
        /// Extended attributes in the `user.` namespace.
        const XATTRS      = 1 << 0;
        /// Permission bits, including setuid, setgid and sticky.
        const PERMISSIONS = 1 << 1;
        /// Access and modification times.
        const TIMESTAMPS  = 1 << 2;
        /// Owning user and group.
        const OWNER       = 1 << 3;
    }
}

impl Default for CopyFlags {
    fn default() -> Self {
        Self::all()
    }
}

/// Entry classification used by the copier and the propagator.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FileKind {
    /// Regular file.
    Regular,
    /// Directory.
    Directory,
    /// Symbolic link.
    Symlink,
    /// Devices, sockets and FIFOs. Never copied.
    Other,
}

impl FileKind {
    /// Classifies a file type without following symlinks.
    #[must_use]
    pub fn from_file_type(file_type: fs::FileType) -> Self {
        if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::Regular
        } else {
            Self::Other
        }
    }

    /// Short name for diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "file",
            Self::Directory => "directory",
            Self::Symlink => "symlink",
            Self::Other => "special file",
        }
    }
}
