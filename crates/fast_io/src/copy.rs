//! Mechanism selection and the clone → sendfile → userspace cascade.

use std::fs::File;
use std::io;

use logging::trace_io;
use platform::{FsError, FsErrorKind, FsResult, IoResultExt};

use crate::RangeEnd;
use crate::copy_file_range::clone_range;
use crate::primitives::{CopyPrimitives, KernelPrimitives};
use crate::sendfile::sendfile_range;
use crate::userspace::userspace_range;

/// How file contents are moved.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum CopyOperation {
    /// Clone, then sendfile, then userspace, falling back on
    /// cross-device, unsupported, or stalled transfers.
    #[default]
    Auto,
    /// Block clone only.
    Clone,
    /// `sendfile` only.
    Sendfile,
    /// Buffered read/write only.
    Userspace,
}

/// Copies the contents of `source` into `destination` with the best
/// available mechanism. Returns the number of bytes copied.
///
/// # Examples
///
/// ```no_run
/// use std::fs::File;
///
/// let source = File::open("/mnt/tank/a/big.img")?;
/// let destination = File::create("/mnt/tank/b/big.img")?;
/// let copied = fast_io::clone_or_copy_file(&source, &destination)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn clone_or_copy_file(source: &File, destination: &File) -> FsResult<u64> {
    copy_file_with(CopyOperation::Auto, &KernelPrimitives, source, destination)
}

/// Clones `source` into `destination`; no fallback.
pub fn clone_file(source: &File, destination: &File) -> FsResult<u64> {
    copy_file_with(CopyOperation::Clone, &KernelPrimitives, source, destination)
}

/// Copies through `sendfile`; no fallback.
pub fn copy_sendfile(source: &File, destination: &File) -> FsResult<u64> {
    copy_file_with(CopyOperation::Sendfile, &KernelPrimitives, source, destination)
}

/// Copies through a userspace buffer.
pub fn copy_file_userspace(source: &File, destination: &File) -> FsResult<u64> {
    copy_file_with(CopyOperation::Userspace, &KernelPrimitives, source, destination)
}

/// Copies with an explicit mechanism and primitive set.
///
/// The source length is sampled once; bytes appended later are not copied.
/// Explicit modes fail on the first error, and a mechanism that stops
/// before the sampled length fails with [`FsErrorKind::NotSupported`].
/// The destination is never synced.
pub fn copy_file_with(
    operation: CopyOperation,
    primitives: &dyn CopyPrimitives,
    source: &File,
    destination: &File,
) -> FsResult<u64> {
    let end = source.metadata().fs_action("stat source file")?.len();
    let mut offset = 0;

    match operation {
        CopyOperation::Clone => {
            let stop = clone_range(primitives, source, destination, &mut offset, end)
                .map_err(clone_error)?;
            finish("clone file", stop, offset, end)
        }
        CopyOperation::Sendfile => {
            let stop = sendfile_range(primitives, source, destination, &mut offset, end)
                .fs_action("sendfile")?;
            finish("sendfile", stop, offset, end)
        }
        CopyOperation::Userspace => {
            userspace_range(source, destination, &mut offset, end).fs_action("copy file data")?;
            Ok(offset)
        }
        CopyOperation::Auto => cascade(primitives, source, destination, &mut offset, end),
    }
}

fn cascade(
    primitives: &dyn CopyPrimitives,
    source: &File,
    destination: &File,
    offset: &mut u64,
    end: u64,
) -> FsResult<u64> {
    match clone_range(primitives, source, destination, offset, end) {
        Ok(RangeEnd::Complete) => return Ok(*offset),
        Ok(RangeEnd::Stalled) => {
            trace_io!("clone stalled at {} of {}, trying sendfile", *offset, end);
        }
        Err(err) => {
            let err = clone_error(err);
            if !matches!(err.kind(), FsErrorKind::CrossDevice | FsErrorKind::NotSupported) {
                return Err(err);
            }
            trace_io!("clone unavailable ({}), trying sendfile", err);
        }
    }

    match sendfile_range(primitives, source, destination, offset, end) {
        Ok(RangeEnd::Complete) => return Ok(*offset),
        Ok(RangeEnd::Stalled) => {
            trace_io!("sendfile stalled at {} of {}, copying in userspace", *offset, end);
        }
        Err(err) => {
            let err = FsError::from_io_unpathed("sendfile", err);
            if !matches!(
                err.kind(),
                FsErrorKind::NotSupported | FsErrorKind::InvalidArgument
            ) {
                return Err(err);
            }
            trace_io!("sendfile unavailable ({}), copying in userspace", err);
        }
    }

    userspace_range(source, destination, offset, end).fs_action("copy file data")?;
    Ok(*offset)
}

/// `copy_file_range` reports `EINVAL` when the filesystem cannot clone
/// between these descriptors.
fn clone_error(err: io::Error) -> FsError {
    let err = FsError::from_io_unpathed("clone file", err);
    if err.kind() == FsErrorKind::InvalidArgument {
        err.reclassify(FsErrorKind::NotSupported)
    } else {
        err
    }
}

fn finish(action: &'static str, stop: RangeEnd, offset: u64, end: u64) -> FsResult<u64> {
    match stop {
        RangeEnd::Complete => Ok(offset),
        RangeEnd::Stalled => Err(FsError::with_message(
            FsErrorKind::NotSupported,
            action,
            None,
            format!("transfer stopped at byte {offset} of {end}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_file(content: &[u8]) -> io::Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(content)?;
        file.flush()?;
        Ok(file)
    }

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 % 256) as u8).collect()
    }

    /// Clone fails with `errno`, sendfile moves `sendfile_budget` bytes and
    /// then returns zero.
    struct Injected {
        clone_errno: i32,
        sendfile_budget: Cell<usize>,
    }

    impl Injected {
        fn new(clone_errno: i32, sendfile_budget: usize) -> Self {
            Self {
                clone_errno,
                sendfile_budget: Cell::new(sendfile_budget),
            }
        }
    }

    impl CopyPrimitives for Injected {
        fn copy_file_range(&self, _: &File, _: &File, _: u64, _: usize) -> io::Result<usize> {
            Err(io::Error::from_raw_os_error(self.clone_errno))
        }

        fn sendfile(
            &self,
            destination: &File,
            source: &File,
            offset: u64,
            len: usize,
        ) -> io::Result<usize> {
            let budget = self.sendfile_budget.get().min(len);
            if budget == 0 {
                return Ok(0);
            }
            let moved = KernelPrimitives.sendfile(destination, source, offset, budget)?;
            self.sendfile_budget.set(self.sendfile_budget.get() - moved);
            Ok(moved)
        }
    }

    #[test]
    fn auto_falls_back_from_exdev_through_stalled_sendfile() {
        let content = sample(128 * 1024);
        let source = create_temp_file(&content).expect("source");
        let destination = NamedTempFile::new().expect("destination");
        let primitives = Injected::new(libc::EXDEV, 4096);

        let copied = copy_file_with(
            CopyOperation::Auto,
            &primitives,
            source.as_file(),
            destination.as_file(),
        )
        .expect("auto copy");
        assert_eq!(copied, content.len() as u64);
        assert_eq!(std::fs::read(destination.path()).expect("read"), content);
    }

    #[test]
    fn clone_only_fails_on_exdev() {
        let source = create_temp_file(&sample(1024)).expect("source");
        let destination = NamedTempFile::new().expect("destination");
        let err = copy_file_with(
            CopyOperation::Clone,
            &Injected::new(libc::EXDEV, 0),
            source.as_file(),
            destination.as_file(),
        )
        .expect_err("clone only");
        assert_eq!(err.kind(), FsErrorKind::CrossDevice);
    }

    #[test]
    fn sendfile_only_fails_when_stalled() {
        let source = create_temp_file(&sample(64 * 1024)).expect("source");
        let destination = NamedTempFile::new().expect("destination");
        let err = copy_file_with(
            CopyOperation::Sendfile,
            &Injected::new(libc::EXDEV, 100),
            source.as_file(),
            destination.as_file(),
        )
        .expect_err("sendfile only");
        assert_eq!(err.kind(), FsErrorKind::NotSupported);
    }

    #[test]
    fn userspace_only_succeeds() {
        let content = sample(64 * 1024);
        let source = create_temp_file(&content).expect("source");
        let destination = NamedTempFile::new().expect("destination");
        let copied = copy_file_with(
            CopyOperation::Userspace,
            &Injected::new(libc::EXDEV, 0),
            source.as_file(),
            destination.as_file(),
        )
        .expect("userspace");
        assert_eq!(copied, content.len() as u64);
        assert_eq!(std::fs::read(destination.path()).expect("read"), content);
    }

    #[test]
    fn clone_einval_is_not_supported_and_falls_back() {
        let content = sample(10_000);
        let source = create_temp_file(&content).expect("source");
        let destination = NamedTempFile::new().expect("destination");
        let primitives = Injected::new(libc::EINVAL, usize::MAX);

        let err = copy_file_with(
            CopyOperation::Clone,
            &primitives,
            source.as_file(),
            destination.as_file(),
        )
        .expect_err("clone only");
        assert_eq!(err.kind(), FsErrorKind::NotSupported);

        let copied = copy_file_with(
            CopyOperation::Auto,
            &primitives,
            source.as_file(),
            destination.as_file(),
        )
        .expect("auto");
        assert_eq!(copied, content.len() as u64);
        assert_eq!(std::fs::read(destination.path()).expect("read"), content);
    }

    #[test]
    fn auto_surfaces_hard_clone_errors() {
        let source = create_temp_file(&sample(10)).expect("source");
        let destination = NamedTempFile::new().expect("destination");
        let err = copy_file_with(
            CopyOperation::Auto,
            &Injected::new(libc::ENOSPC, usize::MAX),
            source.as_file(),
            destination.as_file(),
        )
        .expect_err("no space");
        assert_eq!(err.kind(), FsErrorKind::NoSpace);
    }

    #[test]
    fn clone_or_copy_file_real_kernel() {
        let content = sample(300_000);
        let source = create_temp_file(&content).expect("source");
        let destination = NamedTempFile::new().expect("destination");
        let copied = clone_or_copy_file(source.as_file(), destination.as_file()).expect("copy");
        assert_eq!(copied, content.len() as u64);
        assert_eq!(std::fs::read(destination.path()).expect("read"), content);
    }

    #[test]
    fn explicit_wrappers_on_empty_file() {
        let source = create_temp_file(b"").expect("source");
        for copy in [clone_file, copy_sendfile, copy_file_userspace] {
            let destination = NamedTempFile::new().expect("destination");
            assert_eq!(copy(source.as_file(), destination.as_file()).expect("copy"), 0);
        }
    }
}
