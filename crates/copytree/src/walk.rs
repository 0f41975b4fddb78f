//! crates/copytree/src/walk.rs
//!
//! Depth-first tree walk driving the file copier and metadata propagation.
//!
//! Below the two roots every lookup is relative to an open directory
//! descriptor and refuses to follow a final symlink, so entries swapped for
//! links during the walk are never traversed and path length is bounded
//! only by a single name.

use std::ffi::{OsStr, OsString};
use std::fs::{self, File, Metadata};
use std::io;
use std::os::fd::{AsFd, BorrowedFd};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use fast_io::{KernelPrimitives, copy_file_with};
use logging::{trace_copy, warn_copy, warn_meta};
use metadata::{Attribute, CopyFlags, FileKind, PropagationReport, copy_user_xattrs, propagate_at};
use mount::{MountId, mount_id_of_fd};
use platform::{FsError, FsErrorKind, FsResult, IoResultExt};
use rustix::fs::{self as unix_fs, AtFlags, CWD, Dir, FileType, Mode, OFlags};
use rustix::io::Errno;

use crate::config::CopyTreeConfig;
use crate::progress::Progress;
use crate::sentinel::ControlDirSentinel;
use crate::stats::CopyTreeStats;

const DIR_FLAGS: OFlags = OFlags::RDONLY
    .union(OFlags::DIRECTORY)
    .union(OFlags::NOFOLLOW)
    .union(OFlags::CLOEXEC);

/// Copies the directory tree at `source` into `destination`.
///
/// Both paths must be absolute. `destination` is created if missing; an
/// existing destination is accepted only when
/// [`CopyTreeConfig::exist_ok`] is set. Entries already copied stay in
/// place when an error aborts the walk.
///
/// # Errors
///
/// - [`FsErrorKind::InvalidArgument`] for relative paths, a source that is
///   not a directory, or a destination that is the source itself.
/// - [`FsErrorKind::Exists`] when the destination root, a directory, a
///   file or a symlink already exists and `exist_ok` is false.
/// - [`FsErrorKind::Cancelled`] when the progress sink asks to stop.
/// - The first attribute failure when [`CopyTreeConfig::raise_error`] is set.
/// - Any failure to read the source or create destination entries,
///   including a source directory replaced by a symlink mid-walk.
pub fn copy_tree(
    source: &Path,
    destination: &Path,
    config: &CopyTreeConfig,
) -> FsResult<CopyTreeStats> {
    for path in [source, destination] {
        if !path.is_absolute() {
            return Err(FsError::with_message(
                FsErrorKind::InvalidArgument,
                "copy tree",
                Some(path),
                "absolute path is required",
            ));
        }
    }

    let found = fs::metadata(source).fs_context("stat source", source)?;
    if !found.is_dir() {
        return Err(FsError::with_message(
            FsErrorKind::InvalidArgument,
            "copy tree",
            Some(source),
            "source is not a directory",
        ));
    }
    let src_root = OpenDir::root(source)?;
    let root = src_root.metadata()?;

    make_dir(destination, config.allows_existing())?;
    let target = fs::metadata(destination).fs_context("stat destination", destination)?;
    if !target.is_dir() {
        return Err(FsError::with_message(
            FsErrorKind::InvalidArgument,
            "copy tree",
            Some(destination),
            "destination is not a directory",
        ));
    }
    let dst_root = OpenDir::root(destination)?;
    let target = dst_root.metadata()?;
    let guard = (target.dev(), target.ino());
    if guard == (root.dev(), root.ino()) {
        return Err(FsError::with_message(
            FsErrorKind::InvalidArgument,
            "copy tree",
            Some(destination),
            "source and destination are the same directory",
        ));
    }

    let mut copier = TreeCopier {
        config,
        sentinel: config
            .control_dir_sentinel()
            .unwrap_or_else(ControlDirSentinel::probe),
        root_dev: root.dev(),
        root_mount: mount_id_of_fd(src_root.fd()).ok(),
        guard,
        progress: None,
        stats: CopyTreeStats::default(),
    };

    if let Some(sink) = config.progress_sink() {
        let total = copier.count_files(&src_root, &root)?;
        copier.progress = Some(Progress::new(
            sink,
            config.msg_prefix(),
            config.msg_interval(),
            total,
        ));
    }

    trace_copy!(
        "copying {} -> {} with {:?}",
        source.display(),
        destination.display(),
        config.operation()
    );
    copier.copy_dir(&src_root, &root, &dst_root)?;

    let flags = config.copy_flags();
    let mut report = PropagationReport::new();
    copier.copy_xattrs(&src_root.handle, &dst_root.handle, &dst_root.path, &mut report);
    drop(dst_root);
    report.merge(propagate_at(
        &root,
        CWD,
        destination.as_os_str(),
        destination,
        flags - CopyFlags::XATTRS,
    ));
    copier.absorb(report)?;

    if let Some(progress) = &copier.progress {
        let stats = &copier.stats;
        progress.finished(stats.files, stats.dirs, stats.symlinks);
    }
    trace_copy!("finished {}: {}", destination.display(), copier.stats);
    Ok(copier.stats)
}

/// An open directory and the path it was reached by.
///
/// `path` appears in logs and errors only.
#[derive(Debug)]
struct OpenDir {
    handle: File,
    path: PathBuf,
}

impl OpenDir {
    /// Opens a walk root. A symlink naming the root is followed.
    fn root(path: &Path) -> FsResult<Self> {
        let fd = unix_fs::open(
            path,
            OFlags::RDONLY | OFlags::DIRECTORY | OFlags::CLOEXEC,
            Mode::empty(),
        )
        .map_err(|errno| os_error("open directory", path, errno))?;
        Ok(Self {
            handle: File::from(fd),
            path: path.to_path_buf(),
        })
    }

    /// Opens the subdirectory `name`, or returns `None` when it vanished
    /// since listing. A symlink in its place is an error.
    fn child(&self, name: &OsStr) -> FsResult<Option<Self>> {
        let path = self.path.join(name);
        match unix_fs::openat(self.fd(), name, DIR_FLAGS, Mode::empty()) {
            Ok(fd) => Ok(Some(Self {
                handle: File::from(fd),
                path,
            })),
            Err(Errno::NOENT) => {
                trace_copy!("{} vanished during the walk", path.display());
                Ok(None)
            }
            Err(errno) => Err(os_error("open directory", &path, errno)),
        }
    }

    /// Creates the subdirectory `name` and opens it.
    fn make_child(&self, name: &OsStr, exist_ok: bool) -> FsResult<Self> {
        let path = self.path.join(name);
        match unix_fs::mkdirat(self.fd(), name, Mode::from_raw_mode(0o777)) {
            Ok(()) => {}
            Err(Errno::EXIST) if exist_ok => {}
            Err(errno) => return Err(os_error("create directory", &path, errno)),
        }
        let fd = unix_fs::openat(self.fd(), name, DIR_FLAGS, Mode::empty())
            .map_err(|errno| os_error("open directory", &path, errno))?;
        Ok(Self {
            handle: File::from(fd),
            path,
        })
    }

    /// Entry names in byte order, without `.` and `..`.
    fn entries(&self) -> FsResult<Vec<OsString>> {
        let dir = Dir::read_from(self.fd())
            .map_err(|errno| os_error("read directory", &self.path, errno))?;
        let mut names = Vec::new();
        for entry in dir {
            let entry = entry.map_err(|errno| os_error("read directory", &self.path, errno))?;
            let name = OsStr::from_bytes(entry.file_name().to_bytes());
            if name != "." && name != ".." {
                names.push(name.to_os_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Classifies `name` without following a symlink; `None` when it
    /// vanished since listing.
    fn kind_of(&self, name: &OsStr) -> FsResult<Option<FileKind>> {
        match unix_fs::statat(self.fd(), name, AtFlags::SYMLINK_NOFOLLOW) {
            Ok(stat) => Ok(Some(kind_from_mode(stat.st_mode))),
            Err(Errno::NOENT) => {
                trace_copy!("{} vanished during the walk", self.path.join(name).display());
                Ok(None)
            }
            Err(errno) => Err(os_error("stat source entry", &self.path.join(name), errno)),
        }
    }

    fn metadata(&self) -> FsResult<Metadata> {
        self.handle.metadata().fs_context("stat directory", &self.path)
    }

    fn fd(&self) -> BorrowedFd<'_> {
        self.handle.as_fd()
    }
}

fn kind_from_mode(mode: u32) -> FileKind {
    match FileType::from_raw_mode(mode) {
        FileType::Directory => FileKind::Directory,
        FileType::RegularFile => FileKind::Regular,
        FileType::Symlink => FileKind::Symlink,
        _ => FileKind::Other,
    }
}

fn os_error(action: &'static str, path: &Path, errno: Errno) -> FsError {
    FsError::from_io(action, path, io::Error::from(errno))
}

/// Why a source directory is or is not entered.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Descent {
    Enter,
    ControlDir,
    Destination,
    OtherMount,
}

struct TreeCopier<'a> {
    config: &'a CopyTreeConfig,
    sentinel: ControlDirSentinel,
    root_dev: u64,
    root_mount: Option<MountId>,
    /// `(dev, ino)` of the destination root.
    guard: (u64, u64),
    progress: Option<Progress<'a>>,
    stats: CopyTreeStats,
}

impl TreeCopier<'_> {
    fn copy_dir(
        &mut self,
        source: &OpenDir,
        source_meta: &Metadata,
        destination: &OpenDir,
    ) -> FsResult<()> {
        for name in source.entries()? {
            if self.progress.as_ref().is_some_and(Progress::is_cancelled) {
                return Err(FsError::with_message(
                    FsErrorKind::Cancelled,
                    "copy tree",
                    Some(&source.path),
                    "cancelled by caller",
                ));
            }

            let Some(kind) = source.kind_of(&name)? else {
                continue;
            };
            match kind {
                FileKind::Directory => {
                    let Some(child) = source.child(&name)? else {
                        continue;
                    };
                    let metadata = child.metadata()?;
                    let descent = self.descent(&name, &child, &metadata, source_meta);
                    if descent != Descent::Enter {
                        trace_copy!("not entering {} ({:?})", child.path.display(), descent);
                        continue;
                    }
                    let target = destination.make_child(&name, self.config.allows_existing())?;
                    self.copy_dir(&child, &metadata, &target)?;

                    let mut report = PropagationReport::new();
                    self.copy_xattrs(&child.handle, &target.handle, &target.path, &mut report);
                    let display = target.path.clone();
                    drop(target);
                    report.merge(propagate_at(
                        &metadata,
                        destination.fd(),
                        &name,
                        &display,
                        self.config.copy_flags() - CopyFlags::XATTRS,
                    ));
                    self.absorb(report)?;
                    self.stats.dirs += 1;
                }
                FileKind::Regular => self.copy_file(source, &name, destination)?,
                FileKind::Symlink => self.copy_symlink(source, &name, destination)?,
                FileKind::Other => {
                    warn_copy!("skipping special file {}", source.path.join(&name).display());
                    self.stats.skipped += 1;
                }
            }
        }
        Ok(())
    }

    fn copy_file(
        &mut self,
        source: &OpenDir,
        name: &OsStr,
        destination: &OpenDir,
    ) -> FsResult<()> {
        let src_path = source.path.join(name);
        let dst_path = destination.path.join(name);
        let src_file = match unix_fs::openat(
            source.fd(),
            name,
            OFlags::RDONLY | OFlags::NOFOLLOW | OFlags::NONBLOCK | OFlags::CLOEXEC,
            Mode::empty(),
        ) {
            Ok(fd) => File::from(fd),
            Err(Errno::NOENT) => {
                trace_copy!("{} vanished during the walk", src_path.display());
                return Ok(());
            }
            Err(errno) => return Err(os_error("open source file", &src_path, errno)),
        };
        let metadata = src_file.metadata().fs_context("stat source file", &src_path)?;
        if !metadata.is_file() {
            warn_copy!("{} changed type during the walk, skipping", src_path.display());
            self.stats.skipped += 1;
            return Ok(());
        }

        let create = if self.config.allows_existing() {
            OFlags::TRUNC
        } else {
            OFlags::EXCL
        };
        let dst_file = unix_fs::openat(
            destination.fd(),
            name,
            OFlags::WRONLY | OFlags::CREATE | OFlags::NOFOLLOW | OFlags::CLOEXEC | create,
            Mode::from_raw_mode(0o666),
        )
        .map(File::from)
        .map_err(|errno| os_error("create destination file", &dst_path, errno))?;

        let flags = self.config.copy_flags();
        let mut report = PropagationReport::new();
        self.copy_xattrs(&src_file, &dst_file, &dst_path, &mut report);

        let bytes =
            copy_file_with(self.config.operation(), &KernelPrimitives, &src_file, &dst_file)
                .map_err(|err| err.at(&src_path))?;
        drop(dst_file);
        drop(src_file);

        report.merge(propagate_at(
            &metadata,
            destination.fd(),
            name,
            &dst_path,
            flags - CopyFlags::XATTRS,
        ));
        self.absorb(report)?;

        self.stats.files += 1;
        self.stats.bytes += bytes;
        if let Some(progress) = &self.progress {
            progress.file_copied(self.stats.files);
        }
        Ok(())
    }

    fn copy_symlink(
        &mut self,
        source: &OpenDir,
        name: &OsStr,
        destination: &OpenDir,
    ) -> FsResult<()> {
        let src_path = source.path.join(name);
        let dst_path = destination.path.join(name);
        let target = match unix_fs::readlinkat(source.fd(), name, Vec::new()) {
            Ok(target) => target,
            Err(Errno::NOENT) => {
                trace_copy!("{} vanished during the walk", src_path.display());
                return Ok(());
            }
            Err(errno) => return Err(os_error("read symlink", &src_path, errno)),
        };
        match unix_fs::symlinkat(target.as_c_str(), destination.fd(), name) {
            Ok(()) => {
                let link = unix_fs::openat(
                    source.fd(),
                    name,
                    OFlags::PATH | OFlags::NOFOLLOW | OFlags::CLOEXEC,
                    Mode::empty(),
                )
                .map(File::from)
                .map_err(|errno| os_error("open symlink", &src_path, errno))?;
                let metadata = link.metadata().fs_context("stat symlink", &src_path)?;
                let report = propagate_at(
                    &metadata,
                    destination.fd(),
                    name,
                    &dst_path,
                    self.config.copy_flags(),
                );
                self.absorb(report)?;
            }
            Err(Errno::EXIST) if self.config.allows_existing() => {
                trace_copy!("keeping existing symlink {}", dst_path.display());
            }
            Err(errno) => return Err(os_error("create symlink", &dst_path, errno)),
        }
        self.stats.symlinks += 1;
        Ok(())
    }

    fn copy_xattrs(
        &self,
        source: &File,
        destination: &File,
        display: &Path,
        report: &mut PropagationReport,
    ) {
        if !self.config.copy_flags().contains(CopyFlags::XATTRS) {
            return;
        }
        if let Err(err) = copy_user_xattrs(source, destination) {
            let err = err.at(display);
            warn_meta!("{}: {}", Attribute::Xattrs, err);
            report.push(Attribute::Xattrs, err);
        }
    }

    fn descent(
        &self,
        name: &OsStr,
        dir: &OpenDir,
        entry: &Metadata,
        parent: &Metadata,
    ) -> Descent {
        if self.sentinel.matches(name, entry, parent) {
            return Descent::ControlDir;
        }
        if (entry.dev(), entry.ino()) == self.guard {
            return Descent::Destination;
        }
        if !self.config.traverses_mounts() && self.on_other_mount(dir, entry) {
            return Descent::OtherMount;
        }
        Descent::Enter
    }

    fn on_other_mount(&self, dir: &OpenDir, entry: &Metadata) -> bool {
        if entry.dev() != self.root_dev {
            return true;
        }
        match (self.root_mount, mount_id_of_fd(dir.fd())) {
            (Some(root), Ok(id)) => id != root,
            _ => false,
        }
    }

    /// Counts the regular files the walk will copy.
    fn count_files(&self, source: &OpenDir, source_meta: &Metadata) -> FsResult<u64> {
        let mut total = 0;
        for name in source.entries()? {
            match source.kind_of(&name)? {
                Some(FileKind::Regular) => total += 1,
                Some(FileKind::Directory) => {
                    let Some(child) = source.child(&name)? else {
                        continue;
                    };
                    let metadata = child.metadata()?;
                    if self.descent(&name, &child, &metadata, source_meta) == Descent::Enter {
                        total += self.count_files(&child, &metadata)?;
                    }
                }
                Some(FileKind::Symlink | FileKind::Other) | None => {}
            }
        }
        Ok(total)
    }

    fn absorb(&mut self, report: PropagationReport) -> FsResult<()> {
        self.stats.metadata_failures += report.failure_count() as u64;
        if self.config.raises_errors() {
            report.into_result()?;
        }
        Ok(())
    }
}

fn make_dir(path: &Path, exist_ok: bool) -> FsResult<()> {
    match fs::create_dir(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists && exist_ok => Ok(()),
        Err(err) => Err(FsError::from_io("create directory", path, err)),
    }
}
