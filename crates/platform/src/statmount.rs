//! crates/platform/src/statmount.rs
//!
//! Raw `statmount(2)` and `listmount(2)` wrappers (Linux 6.8+).
//!
//! Neither syscall has a libc wrapper yet, so the numbers and structures are
//! declared here. Both use the asm-generic syscall table, which is shared by
//! every architecture since the 6.x unification.

#![allow(unsafe_code)]

use std::ffi::CStr;
use std::io;
use std::mem::size_of;

#[allow(non_upper_case_globals)]
#[rustfmt::skip]
mod syscalls {
    use std::os::raw::c_long;

    /// statmount(2)
    pub const SYS_statmount : c_long = 457;

    /// listmount(2)
    pub const SYS_listmount : c_long = 458;
}

/// `statmount` request-mask bits.
#[allow(missing_docs)]
#[rustfmt::skip]
pub mod mask {
    pub const STATMOUNT_SB_BASIC       : u64 = 0x0000_0001;
    pub const STATMOUNT_MNT_BASIC      : u64 = 0x0000_0002;
    pub const STATMOUNT_PROPAGATE_FROM : u64 = 0x0000_0004;
    pub const STATMOUNT_MNT_ROOT       : u64 = 0x0000_0008;
    pub const STATMOUNT_MNT_POINT      : u64 = 0x0000_0010;
    pub const STATMOUNT_FS_TYPE        : u64 = 0x0000_0020;
    pub const STATMOUNT_MNT_NS_ID      : u64 = 0x0000_0040;
    pub const STATMOUNT_MNT_OPTS       : u64 = 0x0000_0080;
    pub const STATMOUNT_FS_SUBTYPE     : u64 = 0x0000_0100;
    pub const STATMOUNT_SB_SOURCE      : u64 = 0x0000_0200;

    /// Everything the mount introspector decodes.
    pub const STATMOUNT_ALL: u64 = STATMOUNT_SB_BASIC
        | STATMOUNT_MNT_BASIC
        | STATMOUNT_MNT_ROOT
        | STATMOUNT_MNT_POINT
        | STATMOUNT_FS_TYPE
        | STATMOUNT_MNT_OPTS
        | STATMOUNT_SB_SOURCE;
}

/// `listmount` id that designates the root of the caller's mount namespace.
pub const LSMT_ROOT: u64 = u64::MAX;

const MNT_ID_REQ_SIZE_VER0: u32 = 24;
const INITIAL_BUFFER_BYTES: usize = 4096;
const MAX_BUFFER_BYTES: usize = 1024 * 1024;

#[repr(C)]
struct MntIdReq {
    size: u32,
    spare: u32,
    mnt_id: u64,
    param: u64,
}

/// Fixed-size head of the kernel `struct statmount`.
///
/// String fields are byte offsets into the variable-length area that follows
/// the header; they are only meaningful when the matching mask bit is set.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct StatmountHeader {
    /// Total bytes the kernel filled, header included.
    pub size: u32,
    /// Offset of the filesystem-specific option string.
    pub mnt_opts: u32,
    /// Mask bits the kernel answered.
    pub mask: u64,
    /// Superblock device major.
    pub sb_dev_major: u32,
    /// Superblock device minor.
    pub sb_dev_minor: u32,
    /// Superblock magic.
    pub sb_magic: u64,
    /// `SB_*` flags.
    pub sb_flags: u32,
    /// Offset of the filesystem type string.
    pub fs_type: u32,
    /// Unique mount id.
    pub mnt_id: u64,
    /// Unique id of the parent mount.
    pub mnt_parent_id: u64,
    /// Legacy (reused) mount id.
    pub mnt_id_old: u32,
    /// Legacy (reused) parent mount id.
    pub mnt_parent_id_old: u32,
    /// `MOUNT_ATTR_*` flags.
    pub mnt_attr: u64,
    /// `MS_SHARED` and friends.
    pub mnt_propagation: u64,
    /// Peer group id.
    pub mnt_peer_group: u64,
    /// Master peer group id.
    pub mnt_master: u64,
    /// Propagation source.
    pub propagate_from: u64,
    /// Offset of the mount root string.
    pub mnt_root: u32,
    /// Offset of the mountpoint string.
    pub mnt_point: u32,
    /// Mount namespace id.
    pub mnt_ns_id: u64,
    /// Offset of the filesystem subtype string.
    pub fs_subtype: u32,
    /// Offset of the superblock source string.
    pub sb_source: u32,
    __opt: [u32; 4],
    __spare2: [u64; 46],
}

const _: () = assert!(size_of::<StatmountHeader>() == 512);

/// Owned result buffer of one `statmount` call.
pub struct StatmountBuf {
    words: Vec<u64>,
}

impl StatmountBuf {
    /// Wraps a pre-filled buffer. Used by tests to build synthetic replies.
    #[must_use]
    pub fn from_words(words: Vec<u64>) -> Option<Self> {
        (words.len() * size_of::<u64>() >= size_of::<StatmountHeader>()).then_some(Self { words })
    }

    /// Returns the fixed header.
    #[must_use]
    pub fn header(&self) -> &StatmountHeader {
        // SAFETY: `from_words`/`statmount` guarantee at least 512 bytes, and a
        // `Vec<u64>` is 8-byte aligned which satisfies the header's alignment.
        unsafe { &*self.words.as_ptr().cast::<StatmountHeader>() }
    }

    fn bytes(&self) -> &[u8] {
        // SAFETY: reinterpreting initialised u64 storage as bytes.
        unsafe {
            std::slice::from_raw_parts(
                self.words.as_ptr().cast::<u8>(),
                self.words.len() * size_of::<u64>(),
            )
        }
    }

    /// Returns the NUL-terminated string at `offset` if `bit` was answered.
    #[must_use]
    pub fn string(&self, bit: u64, offset: u32) -> Option<&[u8]> {
        if self.header().mask & bit == 0 {
            return None;
        }
        let start = size_of::<StatmountHeader>().checked_add(offset as usize)?;
        let bytes = self.bytes();
        let tail = bytes.get(start..)?;
        CStr::from_bytes_until_nul(tail).ok().map(CStr::to_bytes)
    }
}

/// Runs `statmount` for a unique mount id, growing the buffer as needed.
pub fn statmount(mnt_id: u64, request: u64) -> io::Result<StatmountBuf> {
    let req = MntIdReq {
        size: MNT_ID_REQ_SIZE_VER0,
        spare: 0,
        mnt_id,
        param: request,
    };
    let mut bytes = INITIAL_BUFFER_BYTES;
    loop {
        let mut words = vec![0u64; bytes / size_of::<u64>()];
        // SAFETY: `req` matches `struct mnt_id_req` (ver0) and `words` is a
        // writable buffer of `bytes` bytes.
        let ret = unsafe {
            libc::syscall(
                syscalls::SYS_statmount,
                &raw const req,
                words.as_mut_ptr(),
                bytes,
                0,
            )
        };
        if ret == 0 {
            return Ok(StatmountBuf { words });
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EOVERFLOW) && bytes < MAX_BUFFER_BYTES {
            bytes *= 2;
            continue;
        }
        return Err(err);
    }
}

/// Runs one `listmount` call.
///
/// Lists mounts below `mnt_id` (or the whole namespace for [`LSMT_ROOT`]) whose
/// id is greater than `last_mnt_id`, writing at most `out.len()` ids. Returns
/// the number of ids written; zero means the listing is exhausted.
pub fn listmount(mnt_id: u64, last_mnt_id: u64, out: &mut [u64]) -> io::Result<usize> {
    let req = MntIdReq {
        size: MNT_ID_REQ_SIZE_VER0,
        spare: 0,
        mnt_id,
        param: last_mnt_id,
    };
    // SAFETY: `req` matches `struct mnt_id_req` (ver0); `out` has room for
    // `out.len()` u64 ids.
    let ret = unsafe {
        libc::syscall(
            syscalls::SYS_listmount,
            &raw const req,
            out.as_mut_ptr(),
            out.len(),
            0,
        )
    };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(ret as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic(mask: u64, strings: &[(usize, &[u8])]) -> StatmountBuf {
        let mut bytes = vec![0u8; 1024];
        // `mask` sits right after `size` and `mnt_opts`
        bytes[8..16].copy_from_slice(&mask.to_ne_bytes());
        for (offset, text) in strings {
            let start = 512 + offset;
            bytes[start..start + text.len()].copy_from_slice(text);
        }
        let words = bytes
            .chunks_exact(8)
            .map(|chunk| u64::from_ne_bytes(chunk.try_into().expect("8 bytes")))
            .collect();
        StatmountBuf::from_words(words).expect("buffer large enough")
    }

    #[test]
    fn rejects_short_buffer() {
        assert!(StatmountBuf::from_words(vec![0; 8]).is_none());
    }

    #[test]
    fn reads_strings_when_mask_answered() {
        let buf = synthetic(mask::STATMOUNT_FS_TYPE, &[(0, b"zfs\0")]);
        assert_eq!(buf.string(mask::STATMOUNT_FS_TYPE, 0), Some(&b"zfs"[..]));
    }

    #[test]
    fn ignores_strings_when_mask_missing() {
        let buf = synthetic(0, &[(0, b"zfs\0")]);
        assert_eq!(buf.string(mask::STATMOUNT_FS_TYPE, 0), None);
    }

    #[test]
    fn unterminated_string_is_none() {
        let mut words = vec![u64::from_ne_bytes(*b"AAAAAAAA"); 128];
        words[1] = mask::STATMOUNT_SB_SOURCE;
        let buf = StatmountBuf::from_words(words).expect("buffer");
        assert_eq!(buf.string(mask::STATMOUNT_SB_SOURCE, 0), None);
    }

    #[test]
    fn statmount_on_bogus_id_fails() {
        match statmount(u64::MAX - 1, mask::STATMOUNT_MNT_BASIC) {
            Ok(_) => panic!("bogus mount id must not resolve"),
            Err(err) => assert!(matches!(
                err.raw_os_error(),
                Some(libc::ENOENT | libc::ENOSYS | libc::EINVAL | libc::EPERM)
            )),
        }
    }
}
