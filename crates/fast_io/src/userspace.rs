//! Buffered positional read/write, the mechanism of last resort.

use std::fs::File;
use std::io;
use std::os::unix::fs::FileExt;

use logging::trace_io;

use crate::USERSPACE_BUFFER_SIZE;

/// Copies `source` into `destination` from `*offset` up to `end` through a
/// 1 MiB buffer.
///
/// A short source (truncated after its length was observed) ends the copy
/// at the new end of file; what was read is written.
pub(crate) fn userspace_range(
    source: &File,
    destination: &File,
    offset: &mut u64,
    end: u64,
) -> io::Result<()> {
    let remaining = end.saturating_sub(*offset);
    let capacity = usize::try_from(remaining)
        .map_or(USERSPACE_BUFFER_SIZE, |remaining| remaining.min(USERSPACE_BUFFER_SIZE));
    let mut buffer = vec![0u8; capacity];

    while *offset < end {
        let want = (end - *offset).min(buffer.len() as u64) as usize;
        let read = match source.read_at(&mut buffer[..want], *offset) {
            Ok(0) => {
                trace_io!("source ended at offset {} before {}", *offset, end);
                break;
            }
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        destination.write_all_at(&buffer[..read], *offset)?;
        *offset += read as u64;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_file(content: &[u8]) -> io::Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(content)?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn userspace_range_spans_multiple_buffers() {
        let len = USERSPACE_BUFFER_SIZE * 2 + 12_345;
        let content: Vec<u8> = (0..len).map(|i| (i % 253) as u8).collect();
        let source = create_temp_file(&content).expect("source");
        let destination = NamedTempFile::new().expect("destination");
        let mut offset = 0;
        userspace_range(source.as_file(), destination.as_file(), &mut offset, len as u64)
            .expect("copy");
        assert_eq!(offset, len as u64);
        assert_eq!(std::fs::read(destination.path()).expect("read"), content);
    }

    #[test]
    fn userspace_range_stops_at_short_source() {
        let source = create_temp_file(b"short").expect("source");
        let destination = NamedTempFile::new().expect("destination");
        let mut offset = 0;
        userspace_range(source.as_file(), destination.as_file(), &mut offset, 100).expect("copy");
        assert_eq!(offset, 5);
        assert_eq!(std::fs::read(destination.path()).expect("read"), b"short");
    }

    #[test]
    fn userspace_range_empty() {
        let source = create_temp_file(b"").expect("source");
        let destination = NamedTempFile::new().expect("destination");
        let mut offset = 0;
        userspace_range(source.as_file(), destination.as_file(), &mut offset, 0).expect("copy");
        assert_eq!(offset, 0);
    }
}
