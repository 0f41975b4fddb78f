//! Kernel copy primitives behind a seam.
//!
//! [`CopyPrimitives`] is the boundary between the copy loops and the kernel.
//! [`KernelPrimitives`] issues the real `copy_file_range(2)` and `sendfile(2)`
//! calls; tests substitute implementations that inject failures.

#![allow(unsafe_code)]

use std::fs::File;
use std::io;
use std::os::fd::AsRawFd;

/// Positional zero-copy primitives.
///
/// Both methods transfer at most `len` bytes starting at `offset` in the
/// source (and, for `copy_file_range`, at the same offset in the
/// destination). They return the number of bytes moved; zero means the
/// kernel would not move anything more.
pub trait CopyPrimitives {
    /// Reflink-capable range copy (`copy_file_range(2)`).
    fn copy_file_range(
        &self,
        source: &File,
        destination: &File,
        offset: u64,
        len: usize,
    ) -> io::Result<usize>;

    /// In-kernel transfer (`sendfile(2)`). Writes at the destination's
    /// current file position.
    fn sendfile(
        &self,
        destination: &File,
        source: &File,
        offset: u64,
        len: usize,
    ) -> io::Result<usize>;
}

/// The real syscalls.
#[derive(Clone, Copy, Debug, Default)]
pub struct KernelPrimitives;

impl CopyPrimitives for KernelPrimitives {
    #[cfg(target_os = "linux")]
    fn copy_file_range(
        &self,
        source: &File,
        destination: &File,
        offset: u64,
        len: usize,
    ) -> io::Result<usize> {
        let mut off_in = offset_arg(offset)?;
        let mut off_out = off_in;
        // SAFETY: both descriptors are borrowed from live `File`s and the
        // offset pointers reference locals that outlive the call.
        let result = unsafe {
            libc::copy_file_range(
                source.as_raw_fd(),
                &raw mut off_in,
                destination.as_raw_fd(),
                &raw mut off_out,
                len,
                0,
            )
        };
        if result < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(result as usize)
    }

    #[cfg(not(target_os = "linux"))]
    fn copy_file_range(&self, _: &File, _: &File, _: u64, _: usize) -> io::Result<usize> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }

    #[cfg(target_os = "linux")]
    fn sendfile(
        &self,
        destination: &File,
        source: &File,
        offset: u64,
        len: usize,
    ) -> io::Result<usize> {
        let mut off_in = offset_arg(offset)?;
        // SAFETY: both descriptors are borrowed from live `File`s and the
        // offset pointer references a local that outlives the call.
        let result = unsafe {
            libc::sendfile(
                destination.as_raw_fd(),
                source.as_raw_fd(),
                &raw mut off_in,
                len,
            )
        };
        if result < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(result as usize)
    }

    #[cfg(not(target_os = "linux"))]
    fn sendfile(&self, _: &File, _: &File, _: u64, _: usize) -> io::Result<usize> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }
}

#[cfg(target_os = "linux")]
fn offset_arg(offset: u64) -> io::Result<libc::loff_t> {
    libc::loff_t::try_from(offset)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset exceeds loff_t"))
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;
    use std::io::{Read, Seek, SeekFrom, Write};
    use tempfile::NamedTempFile;

    fn create_temp_file(content: &[u8]) -> io::Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(content)?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn copy_file_range_honours_offset() {
        let source = create_temp_file(b"0123456789").expect("source");
        let mut destination = NamedTempFile::new().expect("destination");
        destination.write_all(b"xxxxxxxxxx").expect("prefill");

        let moved = match KernelPrimitives.copy_file_range(
            source.as_file(),
            destination.as_file(),
            4,
            3,
        ) {
            Ok(moved) => moved,
            Err(err) => {
                eprintln!("copy_file_range unavailable ({err}), skipping test");
                return;
            }
        };
        assert_eq!(moved, 3);

        let mut out = String::new();
        destination.seek(SeekFrom::Start(0)).expect("seek");
        destination.read_to_string(&mut out).expect("read");
        assert_eq!(out, "xxxx456xxx");
    }

    #[test]
    fn sendfile_writes_at_destination_position() {
        let source = create_temp_file(b"abcdef").expect("source");
        let mut destination = NamedTempFile::new().expect("destination");

        let moved = KernelPrimitives
            .sendfile(destination.as_file(), source.as_file(), 2, 16)
            .expect("sendfile");
        assert_eq!(moved, 4);

        let mut out = String::new();
        destination.seek(SeekFrom::Start(0)).expect("seek");
        destination.read_to_string(&mut out).expect("read");
        assert_eq!(out, "cdef");
    }

    #[test]
    fn sendfile_at_eof_returns_zero() {
        let source = create_temp_file(b"abc").expect("source");
        let destination = NamedTempFile::new().expect("destination");
        let moved = KernelPrimitives
            .sendfile(destination.as_file(), source.as_file(), 3, 16)
            .expect("sendfile");
        assert_eq!(moved, 0);
    }
}
