//! crates/mount/src/introspect.rs
//!
//! Path and descriptor to mount-id lookups, and single-record `statmount`.

use std::os::fd::BorrowedFd;
use std::path::Path;

use logging::trace_mount;
use platform::statmount::mask::STATMOUNT_ALL;
use platform::statx::{self, Statx, mask};
use platform::{FsError, FsErrorKind, FsResult, IoResultExt};

use crate::record::{MountId, MountRecord};

const MOUNT_ID_REQUEST: u32 = mask::STATX_MNT_ID_UNIQUE | mask::STATX_MNT_ID;

/// Returns the mount id of the mount containing `path`.
///
/// Symlinks are followed. The unique 64-bit id is returned when the kernel
/// supports it, otherwise the legacy id.
pub fn mount_id_of_path(path: &Path) -> FsResult<MountId> {
    let stx = statx::statx_path(path, true, MOUNT_ID_REQUEST).fs_context("statx", path)?;
    mount_id_from(&stx).map_err(|err| err.at(path))
}

/// Returns the mount id of the mount containing the open descriptor `fd`.
pub fn mount_id_of_fd(fd: BorrowedFd<'_>) -> FsResult<MountId> {
    let stx = statx::statx_fd(fd, MOUNT_ID_REQUEST).fs_action("statx")?;
    mount_id_from(&stx)
}

fn mount_id_from(stx: &Statx) -> FsResult<MountId> {
    if stx.has_mount_id() {
        Ok(MountId(stx.stx_mnt_id))
    } else {
        Err(FsError::with_message(
            FsErrorKind::NotSupported,
            "statx",
            None,
            "kernel did not report a mount id",
        ))
    }
}

/// Reads the full record of a mount.
///
/// Fails with [`FsErrorKind::Gone`] when the mount was detached after its id
/// was obtained.
pub fn statmount(mount_id: MountId) -> FsResult<MountRecord> {
    statmount_with_mask(mount_id, STATMOUNT_ALL)
}

/// Reads the subset of a mount record selected by `request`
/// (`platform::statmount::mask` bits). Unanswered fields are empty.
pub fn statmount_with_mask(mount_id: MountId, request: u64) -> FsResult<MountRecord> {
    let buf = platform::statmount::statmount(mount_id.get(), request)
        .map_err(|err| gone_if_missing(FsError::from_io_unpathed("statmount", err)))?;
    let record = MountRecord::from_statmount(&buf);
    trace_mount!(
        "statmount {}: {} on {}",
        mount_id,
        record.fs_type,
        record.mountpoint.display()
    );
    Ok(record)
}

pub(crate) fn gone_if_missing(err: FsError) -> FsError {
    if err.kind() == FsErrorKind::NotFound {
        err.reclassify(FsErrorKind::Gone)
    } else {
        err
    }
}
