//! crates/mount/src/record.rs
//!
//! Typed mount records and the decoding of kernel option bits.

use std::ffi::OsStr;
use std::fmt;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

use bitflags::bitflags;
use platform::statmount::{StatmountBuf, mask};

/// Kernel-assigned unique mount identifier.
///
/// Stable for the lifetime of the mount and reused only after it is gone.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MountId(pub u64);

impl MountId {
    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Superblock device number.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct DeviceId {
    /// Major number.
    pub major: u32,
    /// Minor number.
    pub minor: u32,
}

impl DeviceId {
    /// Packs the pair into the `dev_t` reported by `stat(2)`.
    #[must_use]
    pub fn dev_t(self) -> u64 {
        #[allow(clippy::useless_conversion)]
        u64::from(libc::makedev(self.major, self.minor))
    }
}

bitflags! {
    /// Per-mount options decoded from `MOUNT_ATTR_*`.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct MountOptions: u16 {
        /// Access times are never updated.
        const NOATIME     = 1 << 0;
        /// Access times are updated relative to mtime/ctime.
        const RELATIME    = 1 << 1;
        /// Set-user-id bits are ignored.
        const NOSUID      = 1 << 2;
        /// Device nodes are not interpreted.
        const NODEV       = 1 << 3;
        /// Execution is refused.
        const NOEXEC      = 1 << 4;
        /// Mounted read-only.
        const RO          = 1 << 5;
        /// Mounted read-write.
        const RW          = 1 << 6;
        /// Idmapped mount.
        const IDMAP       = 1 << 7;
        /// Symlinks are not followed during path resolution.
        const NOSYMFOLLOW = 1 << 8;
    }
}

bitflags! {
    /// Superblock options decoded from `SB_*` flags.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct SuperOptions: u8 {
        /// Superblock is read-only.
        const RO          = 1 << 0;
        /// Superblock is read-write.
        const RW          = 1 << 1;
        /// Writes are synchronous.
        const SYNCHRONOUS = 1 << 2;
        /// Directory changes are synchronous.
        const DIRSYNC     = 1 << 3;
        /// Timestamps are updated lazily.
        const LAZYTIME    = 1 << 4;
    }
}

#[allow(non_upper_case_globals)]
#[rustfmt::skip]
mod kernel {
    pub const MOUNT_ATTR_RDONLY      : u64 = 0x0000_0001;
    pub const MOUNT_ATTR_NOSUID      : u64 = 0x0000_0002;
    pub const MOUNT_ATTR_NODEV       : u64 = 0x0000_0004;
    pub const MOUNT_ATTR_NOEXEC      : u64 = 0x0000_0008;
    pub const MOUNT_ATTR__ATIME      : u64 = 0x0000_0070;
    pub const MOUNT_ATTR_RELATIME    : u64 = 0x0000_0000;
    pub const MOUNT_ATTR_NOATIME     : u64 = 0x0000_0010;
    pub const MOUNT_ATTR_IDMAP       : u64 = 0x0010_0000;
    pub const MOUNT_ATTR_NOSYMFOLLOW : u64 = 0x0020_0000;

    pub const SB_RDONLY              : u32 = 0x0000_0001;
    pub const SB_SYNCHRONOUS         : u32 = 0x0000_0010;
    pub const SB_DIRSYNC             : u32 = 0x0000_0080;
    pub const SB_LAZYTIME            : u32 = 0x0200_0000;
}

impl MountOptions {
    /// Decodes `statmount.mnt_attr`.
    ///
    /// `RW` is the complement of `RO`. Strict-atime mounts carry neither
    /// `NOATIME` nor `RELATIME`.
    #[must_use]
    pub fn from_mount_attr(attr: u64) -> Self {
        let mut options = if attr & kernel::MOUNT_ATTR_RDONLY != 0 {
            Self::RO
        } else {
            Self::RW
        };
        match attr & kernel::MOUNT_ATTR__ATIME {
            kernel::MOUNT_ATTR_RELATIME => options |= Self::RELATIME,
            kernel::MOUNT_ATTR_NOATIME => options |= Self::NOATIME,
            _ => {}
        }
        for (bit, flag) in [
            (kernel::MOUNT_ATTR_NOSUID, Self::NOSUID),
            (kernel::MOUNT_ATTR_NODEV, Self::NODEV),
            (kernel::MOUNT_ATTR_NOEXEC, Self::NOEXEC),
            (kernel::MOUNT_ATTR_IDMAP, Self::IDMAP),
            (kernel::MOUNT_ATTR_NOSYMFOLLOW, Self::NOSYMFOLLOW),
        ] {
            if attr & bit != 0 {
                options |= flag;
            }
        }
        options
    }
}

impl SuperOptions {
    /// Decodes `statmount.sb_flags`.
    #[must_use]
    pub fn from_sb_flags(flags: u32) -> Self {
        let mut options = if flags & kernel::SB_RDONLY != 0 {
            Self::RO
        } else {
            Self::RW
        };
        if flags & kernel::SB_SYNCHRONOUS != 0 {
            options |= Self::SYNCHRONOUS;
        }
        if flags & kernel::SB_DIRSYNC != 0 {
            options |= Self::DIRSYNC;
        }
        if flags & kernel::SB_LAZYTIME != 0 {
            options |= Self::LAZYTIME;
        }
        options
    }
}

/// Snapshot of one mount.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MountRecord {
    /// This mount.
    pub mount_id: MountId,
    /// The mount this one is attached to.
    pub parent_id: MountId,
    /// Superblock device.
    pub device_id: DeviceId,
    /// Subtree of the source filesystem exposed at the mountpoint.
    pub root: PathBuf,
    /// Where the mount is attached.
    pub mountpoint: PathBuf,
    /// Per-mount options.
    pub mount_options: MountOptions,
    /// Kernel filesystem type, e.g. `zfs` or `tmpfs`.
    pub fs_type: String,
    /// Filesystem source. For `zfs` this is the dataset name.
    pub source: String,
    /// Superblock options.
    pub super_options: SuperOptions,
    /// Filesystem-specific options, uppercased (`XATTR=SA`, `POSIXACL`, ...).
    pub fs_options: Vec<String>,
}

impl MountRecord {
    /// Decodes a `statmount` reply. Fields the kernel did not answer are empty.
    #[must_use]
    pub fn from_statmount(buf: &StatmountBuf) -> Self {
        let header = buf.header();
        let answered = |bit: u64| header.mask & bit != 0;

        let text = |bit, offset| {
            buf.string(bit, offset)
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                .unwrap_or_default()
        };
        let path = |bit, offset| {
            buf.string(bit, offset)
                .map(|bytes| PathBuf::from(OsStr::from_bytes(bytes)))
                .unwrap_or_default()
        };

        let (mount_id, parent_id, mount_options) = if answered(mask::STATMOUNT_MNT_BASIC) {
            (
                MountId(header.mnt_id),
                MountId(header.mnt_parent_id),
                MountOptions::from_mount_attr(header.mnt_attr),
            )
        } else {
            (MountId(0), MountId(0), MountOptions::empty())
        };

        let (device_id, super_options) = if answered(mask::STATMOUNT_SB_BASIC) {
            (
                DeviceId {
                    major: header.sb_dev_major,
                    minor: header.sb_dev_minor,
                },
                SuperOptions::from_sb_flags(header.sb_flags),
            )
        } else {
            (DeviceId::default(), SuperOptions::empty())
        };

        Self {
            mount_id,
            parent_id,
            device_id,
            root: path(mask::STATMOUNT_MNT_ROOT, header.mnt_root),
            mountpoint: path(mask::STATMOUNT_MNT_POINT, header.mnt_point),
            mount_options,
            fs_type: text(mask::STATMOUNT_FS_TYPE, header.fs_type),
            source: text(mask::STATMOUNT_SB_SOURCE, header.sb_source),
            super_options,
            fs_options: buf
                .string(mask::STATMOUNT_MNT_OPTS, header.mnt_opts)
                .map(split_fs_options)
                .unwrap_or_default(),
        }
    }
}

fn split_fs_options(raw: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(raw)
        .split(',')
        .map(str::trim)
        .filter(|option| !option.is_empty())
        .map(str::to_uppercase)
        .collect()
}
