//! crates/copytree/src/sentinel.rs
//!
//! Identification of the ZFS `.zfs` control directory.
//!
//! The control directory is synthesised by ZFS at the root of every
//! dataset and exposes snapshots. Copying it would duplicate every snapshot
//! into the destination, so the walk skips it. A user directory that merely
//! happens to be called `.zfs` must still be copied, which is why the match
//! is on inode number and device rather than on the name.

use std::ffi::OsStr;
use std::fs::{self, Metadata};
use std::os::unix::fs::MetadataExt;
use std::sync::OnceLock;

use logging::trace_copy;

/// Inode number ZFS assigns to the `.zfs` control directory.
pub const ZFS_CTLDIR_INO: u64 = 0x0000_FFFF_FFFF_FFFF;

const CONTROL_DIR_NAME: &str = ".zfs";

/// Inode identity of the control directory.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ControlDirSentinel {
    ino: u64,
}

impl ControlDirSentinel {
    /// Uses `ino` as the control directory inode.
    #[must_use]
    pub const fn new(ino: u64) -> Self {
        Self { ino }
    }

    /// Returns the inode number matched against.
    #[must_use]
    pub const fn ino(self) -> u64 {
        self.ino
    }

    /// Returns the sentinel observed on this host.
    ///
    /// The first mounted ZFS dataset's `.zfs` entry is examined once per
    /// process. Without a mounted dataset, or when the entry is hidden from
    /// lookup, [`ZFS_CTLDIR_INO`] is used.
    #[must_use]
    pub fn probe() -> Self {
        static PROBED: OnceLock<ControlDirSentinel> = OnceLock::new();
        *PROBED.get_or_init(probe_uncached)
    }

    /// Returns true when the directory entry `name` with metadata `entry`,
    /// found inside a directory with metadata `parent`, is the control
    /// directory.
    #[must_use]
    pub fn matches(self, name: &OsStr, entry: &Metadata, parent: &Metadata) -> bool {
        name == CONTROL_DIR_NAME && entry.ino() == self.ino && entry.dev() == parent.dev()
    }
}

impl Default for ControlDirSentinel {
    fn default() -> Self {
        Self::new(ZFS_CTLDIR_INO)
    }
}

fn probe_uncached() -> ControlDirSentinel {
    let observed = mount::iter_mounts(None, false)
        .filter_map(Result::ok)
        .find(|record| record.fs_type == "zfs")
        .and_then(|record| {
            let candidate = record.mountpoint.join(CONTROL_DIR_NAME);
            fs::symlink_metadata(&candidate)
                .ok()
                .filter(Metadata::is_dir)
                .map(|metadata| metadata.ino())
        });

    match observed {
        Some(ino) => {
            trace_copy!("control directory inode probed as {:#x}", ino);
            ControlDirSentinel::new(ino)
        }
        None => ControlDirSentinel::default(),
    }
}
