//! crates/mount/src/unmount.rs
//!
//! Single and recursive unmount.

use std::path::Path;

use logging::trace_mount;
use platform::statx::{self, attr, mask};
use platform::umount::{MntFlags, umount2};
use platform::{FsError, FsErrorKind, FsResult, IoResultExt};

use crate::iter::iter_mounts;
use crate::record::MountId;

/// Options for [`unmount`].
///
/// # Examples
///
/// ```
/// use mount::UnmountOptions;
///
/// let options = UnmountOptions::new().recursive(true).detach(true);
/// assert!(options.is_recursive());
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UnmountOptions {
    force: bool,
    detach: bool,
    expire: bool,
    follow_symlinks: bool,
    recursive: bool,
}

impl Default for UnmountOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl UnmountOptions {
    /// Plain unmount that follows symlinks in the target path.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            force: false,
            detach: false,
            expire: false,
            follow_symlinks: true,
            recursive: false,
        }
    }

    /// Requests `MNT_FORCE`. ZFS ignores it but the flag is still passed.
    #[must_use]
    pub const fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Requests a lazy `MNT_DETACH` unmount.
    #[must_use]
    pub const fn detach(mut self, detach: bool) -> Self {
        self.detach = detach;
        self
    }

    /// Requests `MNT_EXPIRE`. Cannot be combined with force or detach.
    #[must_use]
    pub const fn expire(mut self, expire: bool) -> Self {
        self.expire = expire;
        self
    }

    /// When false, passes `UMOUNT_NOFOLLOW`.
    #[must_use]
    pub const fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Unmounts every mount below the target first.
    #[must_use]
    pub const fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Returns whether the unmount descends into child mounts.
    #[must_use]
    pub const fn is_recursive(&self) -> bool {
        self.recursive
    }

    fn kernel_flags(&self) -> FsResult<MntFlags> {
        if self.expire && (self.force || self.detach) {
            return Err(FsError::with_message(
                FsErrorKind::InvalidArgument,
                "unmount",
                None,
                "expire cannot be combined with force or detach",
            ));
        }
        let mut flags = MntFlags::empty();
        flags.set(MntFlags::MNT_FORCE, self.force);
        flags.set(MntFlags::MNT_DETACH, self.detach);
        flags.set(MntFlags::MNT_EXPIRE, self.expire);
        flags.set(MntFlags::UMOUNT_NOFOLLOW, !self.follow_symlinks);
        Ok(flags)
    }
}

/// Unmounts `path`.
///
/// A recursive unmount requires `path` to be a mount root and fails with
/// [`FsErrorKind::NotAMount`] otherwise. Children are unmounted before their
/// parents, depth first. The first failure stops the sweep and leaves the
/// remaining mounts, including the target, in place.
pub fn unmount(path: &Path, options: &UnmountOptions) -> FsResult<()> {
    let flags = options.kernel_flags().map_err(|err| err.at(path))?;

    if options.recursive {
        let stx = statx::statx_path(
            path,
            options.follow_symlinks,
            mask::STATX_MNT_ID_UNIQUE | mask::STATX_MNT_ID,
        )
        .fs_context("statx", path)?;
        if !stx.has_attribute(attr::STATX_ATTR_MOUNT_ROOT) {
            return Err(FsError::with_message(
                FsErrorKind::NotAMount,
                "unmount",
                Some(path),
                "recursive unmount target is not a mount root",
            ));
        }
        unmount_children(MountId(stx.stx_mnt_id), flags)?;
    }

    unmount_one(path, flags)
}

fn unmount_children(parent: MountId, flags: MntFlags) -> FsResult<()> {
    let children = iter_mounts(Some(parent), true).collect::<FsResult<Vec<_>>>()?;
    for child in children {
        unmount_children(child.mount_id, flags)?;
        unmount_one(&child.mountpoint, flags)?;
    }
    Ok(())
}

fn unmount_one(path: &Path, flags: MntFlags) -> FsResult<()> {
    trace_mount!("unmounting {} ({:?})", path.display(), flags);
    umount2(path, flags).map_err(|err| {
        let err = FsError::from_io("unmount", path, err);
        // flags were validated above, so EINVAL means the target is not mounted
        if err.kind() == FsErrorKind::InvalidArgument {
            err.reclassify(FsErrorKind::NotAMount)
        } else {
            err
        }
    })
}
