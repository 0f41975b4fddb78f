//! crates/metadata/src/apply.rs
//!
//! Applies source attributes to a destination, by path or relative to an
//! open directory.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::os::fd::BorrowedFd;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use logging::{trace_meta, warn_meta};
use platform::{FsError, FsResult, IoResultExt};
use rustix::fs::{self as unix_fs, AtFlags, CWD, Mode, Timespec, Timestamps};

use crate::flags::{CopyFlags, FileKind};
use crate::ownership::{gid_from_raw, uid_from_raw};
use crate::report::{Attribute, PropagationReport};
use crate::xattr::copy_user_xattrs_at;

/// Applies the attributes selected by `flags` from `source` to `destination`.
///
/// Only a failure to stat `source` is returned as an error. Failures of
/// individual attributes are logged and collected in the report.
pub fn propagate(
    source: &Path,
    destination: &Path,
    flags: CopyFlags,
) -> FsResult<PropagationReport> {
    let metadata = fs::symlink_metadata(source).fs_context("stat source", source)?;
    Ok(propagate_with_metadata(source, &metadata, destination, flags))
}

/// Like [`propagate`] with source metadata the caller already holds.
///
/// `metadata` must come from `lstat(source)`.
pub fn propagate_with_metadata(
    source: &Path,
    metadata: &fs::Metadata,
    destination: &Path,
    flags: CopyFlags,
) -> PropagationReport {
    let mut report = PropagationReport::new();
    let kind = FileKind::from_file_type(metadata.file_type());
    if flags.contains(CopyFlags::XATTRS) && matches!(kind, FileKind::Regular | FileKind::Directory)
    {
        let result = copy_user_xattrs_at(source, destination).map(drop);
        record(&mut report, Attribute::Xattrs, destination, result);
    }
    report.merge(propagate_at(
        metadata,
        CWD,
        destination.as_os_str(),
        destination,
        flags,
    ));
    report
}

/// Applies owner, permissions and timestamps to the entry `name` of the open
/// `directory`.
///
/// `metadata` describes the source entry and decides the rules by kind.
/// `display` names the destination in logs and errors only; no lookup goes
/// through it. Ownership and timestamps never follow a final symlink;
/// permissions do, as `chmod(2)` does. [`CopyFlags::XATTRS`] is ignored
/// here; copy extended attributes through open descriptors with
/// [`copy_user_xattrs`](crate::copy_user_xattrs) before calling this.
pub fn propagate_at(
    metadata: &fs::Metadata,
    directory: BorrowedFd<'_>,
    name: &OsStr,
    display: &Path,
    flags: CopyFlags,
) -> PropagationReport {
    let mut report = PropagationReport::new();
    let kind = FileKind::from_file_type(metadata.file_type());

    match kind {
        FileKind::Other => {}
        FileKind::Symlink => {
            if flags.contains(CopyFlags::OWNER) {
                let result = set_owner_like(metadata, directory, name, display);
                record(&mut report, Attribute::Owner, display, result);
            }
        }
        FileKind::Regular | FileKind::Directory => {
            if flags.contains(CopyFlags::OWNER) {
                let result = set_owner_like(metadata, directory, name, display);
                record(&mut report, Attribute::Owner, display, result);
            }
            if flags.contains(CopyFlags::PERMISSIONS) {
                let result = set_permissions_like(metadata, directory, name, display);
                record(&mut report, Attribute::Permissions, display, result);
            }
            if flags.contains(CopyFlags::TIMESTAMPS) {
                let result = set_timestamp_like(metadata, directory, name, display);
                record(&mut report, Attribute::Timestamps, display, result);
            }
        }
    }

    let destination = display;
    trace_meta!(
        "propagated {:?} to {} {} ({} failures)",
        flags,
        kind.as_str(),
        destination.display(),
        report.failure_count()
    );
    report
}

fn record(
    report: &mut PropagationReport,
    attribute: Attribute,
    destination: &Path,
    result: FsResult<()>,
) {
    if let Err(error) = result {
        warn_meta!(
            "could not preserve {} on {}: {}",
            attribute,
            destination.display(),
            error
        );
        report.push(attribute, error);
    }
}

fn set_owner_like(
    metadata: &fs::Metadata,
    directory: BorrowedFd<'_>,
    name: &OsStr,
    display: &Path,
) -> FsResult<()> {
    unix_fs::chownat(
        directory,
        name,
        Some(uid_from_raw(metadata.uid())),
        Some(gid_from_raw(metadata.gid())),
        AtFlags::SYMLINK_NOFOLLOW,
    )
    .map_err(|error| FsError::from_io("preserve ownership", display, io::Error::from(error)))
}

fn set_permissions_like(
    metadata: &fs::Metadata,
    directory: BorrowedFd<'_>,
    name: &OsStr,
    display: &Path,
) -> FsResult<()> {
    let mode = Mode::from_raw_mode(metadata.mode() & 0o7777);
    unix_fs::chmodat(directory, name, mode, AtFlags::empty())
        .map_err(|error| FsError::from_io("preserve permissions", display, io::Error::from(error)))
}

fn set_timestamp_like(
    metadata: &fs::Metadata,
    directory: BorrowedFd<'_>,
    name: &OsStr,
    display: &Path,
) -> FsResult<()> {
    let times = Timestamps {
        last_access: Timespec {
            tv_sec: metadata.atime(),
            tv_nsec: metadata.atime_nsec(),
        },
        last_modification: Timespec {
            tv_sec: metadata.mtime(),
            tv_nsec: metadata.mtime_nsec(),
        },
    };
    unix_fs::utimensat(directory, name, &times, AtFlags::SYMLINK_NOFOLLOW)
        .map_err(|error| FsError::from_io("preserve timestamps", display, io::Error::from(error)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;
    use platform::FsErrorKind;
    use std::os::fd::AsFd;
    use std::os::unix::fs::{PermissionsExt, symlink};
    use tempfile::tempdir;

    fn mtime_ns(path: &Path) -> (i64, i64) {
        let meta = fs::metadata(path).expect("stat");
        (meta.mtime(), meta.mtime_nsec())
    }

    #[test]
    fn permissions_only_leaves_times_alone() {
        let dir = tempdir().expect("tempdir");
        let source = dir.path().join("source");
        let destination = dir.path().join("destination");
        fs::write(&source, b"s").expect("write");
        fs::write(&destination, b"d").expect("write");
        fs::set_permissions(&source, fs::Permissions::from_mode(0o640)).expect("chmod");
        filetime::set_file_mtime(&source, FileTime::from_unix_time(0, 8_675_310))
            .expect("mtime");

        let report = propagate(&source, &destination, CopyFlags::PERMISSIONS).expect("propagate");
        assert!(report.is_clean());
        assert_eq!(fs::metadata(&destination).expect("stat").mode() & 0o7777, 0o640);
        assert_ne!(mtime_ns(&destination), (0, 8_675_310));
    }

    #[test]
    fn timestamps_are_copied_with_nanoseconds() {
        let dir = tempdir().expect("tempdir");
        let source = dir.path().join("source");
        let destination = dir.path().join("destination");
        fs::write(&source, b"s").expect("write");
        fs::write(&destination, b"d").expect("write");
        filetime::set_file_times(
            &source,
            FileTime::from_unix_time(1_000, 42),
            FileTime::from_unix_time(0, 8_675_310),
        )
        .expect("times");

        let report = propagate(&source, &destination, CopyFlags::TIMESTAMPS).expect("propagate");
        assert!(report.is_clean());
        assert_eq!(mtime_ns(&destination), (0, 8_675_310));
        let meta = fs::metadata(&destination).expect("stat");
        assert_eq!((meta.atime(), meta.atime_nsec()), (1_000, 42));
    }

    #[test]
    fn directories_receive_mode_and_times() {
        let dir = tempdir().expect("tempdir");
        let source = dir.path().join("srcdir");
        let destination = dir.path().join("dstdir");
        fs::create_dir(&source).expect("mkdir");
        fs::create_dir(&destination).expect("mkdir");
        fs::set_permissions(&source, fs::Permissions::from_mode(0o1777)).expect("chmod");
        filetime::set_file_mtime(&source, FileTime::from_unix_time(123, 456)).expect("mtime");

        let report = propagate(
            &source,
            &destination,
            CopyFlags::PERMISSIONS | CopyFlags::TIMESTAMPS,
        )
        .expect("propagate");
        assert!(report.is_clean());
        assert_eq!(fs::metadata(&destination).expect("stat").mode() & 0o7777, 0o1777);
        assert_eq!(mtime_ns(&destination), (123, 456));
    }

    #[test]
    fn symlinks_only_take_ownership() {
        let dir = tempdir().expect("tempdir");
        let target = dir.path().join("target");
        fs::write(&target, b"t").expect("write");
        fs::set_permissions(&target, fs::Permissions::from_mode(0o600)).expect("chmod");
        let source = dir.path().join("source-link");
        let destination = dir.path().join("destination-link");
        symlink(&target, &source).expect("symlink");
        symlink(&target, &destination).expect("symlink");
        let before = mtime_ns(&target);

        let report = propagate(&source, &destination, CopyFlags::all()).expect("propagate");
        // lchown to our own ids always succeeds
        assert!(report.is_clean(), "{:?}", report.failures());
        // the link target is untouched
        assert_eq!(fs::metadata(&target).expect("stat").mode() & 0o7777, 0o600);
        assert_eq!(mtime_ns(&target), before);
    }

    #[test]
    fn ownership_change_without_privilege_is_recorded() {
        if test_support::is_root() {
            eprintln!("running as root, skipping test");
            return;
        }
        let dir = tempdir().expect("tempdir");
        let destination = dir.path().join("destination");
        fs::write(&destination, b"d").expect("write");
        // root-owned source
        let source = Path::new("/");

        let report = propagate(source, &destination, CopyFlags::OWNER | CopyFlags::PERMISSIONS)
            .expect("propagate");
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.failures()[0].attribute, Attribute::Owner);
        assert_eq!(report.failures()[0].error.kind(), FsErrorKind::Denied);
    }

    #[test]
    fn missing_source_is_fatal() {
        let dir = tempdir().expect("tempdir");
        let err = propagate(&dir.path().join("missing"), dir.path(), CopyFlags::all())
            .expect_err("missing");
        assert_eq!(err.kind(), FsErrorKind::NotFound);
    }

    #[test]
    fn empty_flags_change_nothing() {
        let dir = tempdir().expect("tempdir");
        let source = dir.path().join("source");
        let destination = dir.path().join("destination");
        fs::write(&source, b"s").expect("write");
        fs::write(&destination, b"d").expect("write");
        fs::set_permissions(&source, fs::Permissions::from_mode(0o600)).expect("chmod");
        fs::set_permissions(&destination, fs::Permissions::from_mode(0o644)).expect("chmod");

        let report = propagate(&source, &destination, CopyFlags::empty()).expect("propagate");
        assert!(report.is_clean());
        assert_eq!(fs::metadata(&destination).expect("stat").mode() & 0o7777, 0o644);
    }

    #[test]
    fn relative_to_open_directory() {
        let dir = tempdir().expect("tempdir");
        let source = dir.path().join("source");
        fs::write(&source, b"s").expect("write");
        fs::set_permissions(&source, fs::Permissions::from_mode(0o604)).expect("chmod");
        filetime::set_file_mtime(&source, FileTime::from_unix_time(77, 99)).expect("mtime");
        let parent = dir.path().join("parent");
        fs::create_dir(&parent).expect("mkdir");
        fs::write(parent.join("entry"), b"d").expect("write");

        let handle = fs::File::open(&parent).expect("open parent");
        let metadata = fs::symlink_metadata(&source).expect("lstat");
        let report = propagate_at(
            &metadata,
            handle.as_fd(),
            OsStr::new("entry"),
            &parent.join("entry"),
            CopyFlags::PERMISSIONS | CopyFlags::TIMESTAMPS,
        );
        assert!(report.is_clean(), "{:?}", report.failures());
        let entry = parent.join("entry");
        assert_eq!(fs::metadata(&entry).expect("stat").mode() & 0o7777, 0o604);
        assert_eq!(mtime_ns(&entry), (77, 99));
    }

    #[test]
    fn relative_form_does_not_follow_a_final_symlink() {
        let dir = tempdir().expect("tempdir");
        let target = dir.path().join("target");
        fs::write(&target, b"t").expect("write");
        fs::set_permissions(&target, fs::Permissions::from_mode(0o600)).expect("chmod");
        symlink("target", dir.path().join("link")).expect("symlink");
        let source = dir.path().join("source");
        fs::write(&source, b"s").expect("write");
        fs::set_permissions(&source, fs::Permissions::from_mode(0o644)).expect("chmod");
        filetime::set_file_mtime(&source, FileTime::from_unix_time(5, 0)).expect("mtime");
        let before = mtime_ns(&target);

        let handle = fs::File::open(dir.path()).expect("open dir");
        let metadata = fs::symlink_metadata(&source).expect("lstat");
        let report = propagate_at(
            &metadata,
            handle.as_fd(),
            OsStr::new("link"),
            &dir.path().join("link"),
            CopyFlags::TIMESTAMPS,
        );
        // the link itself takes the times, its target does not
        assert!(report.is_clean(), "{:?}", report.failures());
        assert_eq!(mtime_ns(&target), before);
    }
}
