//! crates/platform/src/statx.rs
//!
//! Raw `statx(2)` wrapper exposing the mount-id and attribute fields that
//! `std::fs::Metadata` hides.

#![allow(unsafe_code)]

use std::ffi::CString;
use std::io;
use std::mem::MaybeUninit;
use std::os::fd::{AsRawFd, BorrowedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

/// `statx` request-mask bits (`include/uapi/linux/stat.h`).
#[allow(missing_docs)]
#[rustfmt::skip]
pub mod mask {
    pub const STATX_TYPE          : u32 = 0x0000_0001;
    pub const STATX_MODE          : u32 = 0x0000_0002;
    pub const STATX_NLINK         : u32 = 0x0000_0004;
    pub const STATX_UID           : u32 = 0x0000_0008;
    pub const STATX_GID           : u32 = 0x0000_0010;
    pub const STATX_ATIME         : u32 = 0x0000_0020;
    pub const STATX_MTIME         : u32 = 0x0000_0040;
    pub const STATX_CTIME         : u32 = 0x0000_0080;
    pub const STATX_INO           : u32 = 0x0000_0100;
    pub const STATX_SIZE          : u32 = 0x0000_0200;
    pub const STATX_BLOCKS        : u32 = 0x0000_0400;
    pub const STATX_BASIC_STATS   : u32 = 0x0000_07ff;
    pub const STATX_BTIME         : u32 = 0x0000_0800;
    pub const STATX_MNT_ID        : u32 = 0x0000_1000;
    pub const STATX_MNT_ID_UNIQUE : u32 = 0x0000_4000;
}

/// `statx` attribute bits reported in `stx_attributes`.
#[allow(missing_docs)]
#[rustfmt::skip]
pub mod attr {
    pub const STATX_ATTR_COMPRESSED : u64 = 0x0000_0004;
    pub const STATX_ATTR_IMMUTABLE  : u64 = 0x0000_0010;
    pub const STATX_ATTR_APPEND     : u64 = 0x0000_0020;
    pub const STATX_ATTR_NODUMP     : u64 = 0x0000_0040;
    pub const STATX_ATTR_ENCRYPTED  : u64 = 0x0000_0800;
    pub const STATX_ATTR_AUTOMOUNT  : u64 = 0x0000_1000;
    pub const STATX_ATTR_MOUNT_ROOT : u64 = 0x0000_2000;
    pub const STATX_ATTR_VERITY     : u64 = 0x0010_0000;
    pub const STATX_ATTR_DAX        : u64 = 0x0020_0000;
}

/// Kernel `struct statx_timestamp`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct StatxTimestamp {
    /// Seconds since the epoch.
    pub tv_sec: i64,
    /// Nanoseconds within the second.
    pub tv_nsec: u32,
    __reserved: i32,
}

/// Kernel `struct statx` (256 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct Statx {
    /// Fields the kernel filled in.
    pub stx_mask: u32,
    /// Preferred I/O block size.
    pub stx_blksize: u32,
    /// `STATX_ATTR_*` bits.
    pub stx_attributes: u64,
    /// Hard link count.
    pub stx_nlink: u32,
    /// Owner uid.
    pub stx_uid: u32,
    /// Owner gid.
    pub stx_gid: u32,
    /// File type and mode.
    pub stx_mode: u16,
    __spare0: u16,
    /// Inode number.
    pub stx_ino: u64,
    /// Size in bytes.
    pub stx_size: u64,
    /// Allocated 512-byte blocks.
    pub stx_blocks: u64,
    /// Attribute bits the filesystem supports.
    pub stx_attributes_mask: u64,
    /// Last access.
    pub stx_atime: StatxTimestamp,
    /// Creation.
    pub stx_btime: StatxTimestamp,
    /// Last status change.
    pub stx_ctime: StatxTimestamp,
    /// Last modification.
    pub stx_mtime: StatxTimestamp,
    /// Device major (device files).
    pub stx_rdev_major: u32,
    /// Device minor (device files).
    pub stx_rdev_minor: u32,
    /// Major of the containing device.
    pub stx_dev_major: u32,
    /// Minor of the containing device.
    pub stx_dev_minor: u32,
    /// Mount id, legacy or unique depending on `stx_mask`.
    pub stx_mnt_id: u64,
    __dio: [u32; 2],
    __spare3: [u64; 12],
}

const _: () = assert!(std::mem::size_of::<Statx>() == 256);

impl Statx {
    /// Returns `true` if every bit of `attribute` is set.
    #[must_use]
    pub const fn has_attribute(&self, attribute: u64) -> bool {
        self.stx_attributes & attribute == attribute
    }

    /// Returns `true` if the kernel reported a unique (64-bit) mount id.
    #[must_use]
    pub const fn has_unique_mount_id(&self) -> bool {
        self.stx_mask & mask::STATX_MNT_ID_UNIQUE != 0
    }

    /// Returns `true` if the kernel reported any mount id.
    #[must_use]
    pub const fn has_mount_id(&self) -> bool {
        self.stx_mask & (mask::STATX_MNT_ID_UNIQUE | mask::STATX_MNT_ID) != 0
    }
}

/// Runs `statx` on a path relative to the current directory.
pub fn statx_path(path: &Path, follow_symlinks: bool, request: u32) -> io::Result<Statx> {
    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL byte"))?;
    let flags = if follow_symlinks {
        0
    } else {
        libc::AT_SYMLINK_NOFOLLOW
    };
    raw_statx(libc::AT_FDCWD, &c_path, flags, request)
}

/// Runs `statx` on an open descriptor using the empty-path idiom.
pub fn statx_fd(fd: BorrowedFd<'_>, request: u32) -> io::Result<Statx> {
    raw_statx(fd.as_raw_fd(), c"", libc::AT_EMPTY_PATH, request)
}

fn raw_statx(dirfd: i32, path: &std::ffi::CStr, flags: i32, request: u32) -> io::Result<Statx> {
    let mut buf = MaybeUninit::<Statx>::zeroed();
    // SAFETY: `path` is NUL-terminated, `buf` is a writable 256-byte region with
    // the kernel's `struct statx` layout.
    let ret = unsafe {
        libc::syscall(
            libc::SYS_statx,
            dirfd,
            path.as_ptr(),
            flags,
            request,
            buf.as_mut_ptr(),
        )
    };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: the kernel filled the structure; zeroed padding is a valid bit pattern.
    Ok(unsafe { buf.assume_init() })
}
