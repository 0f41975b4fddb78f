//! In-kernel transfer through `sendfile(2)`.

use std::fs::File;
use std::io::{self, Seek, SeekFrom};

use crate::primitives::CopyPrimitives;
use crate::{MAX_CHUNK, RangeEnd};

/// Transfers `source` into `destination` from `*offset` up to `end`.
///
/// `sendfile` reads at an explicit offset but writes at the destination's
/// file position, so the destination is first positioned at `*offset`.
/// A zero return before `end` means the kernel cannot serve this pair of
/// files and is reported as [`RangeEnd::Stalled`].
pub(crate) fn sendfile_range(
    primitives: &dyn CopyPrimitives,
    source: &File,
    destination: &File,
    offset: &mut u64,
    end: u64,
) -> io::Result<RangeEnd> {
    let mut positioned = destination;
    positioned.seek(SeekFrom::Start(*offset))?;

    while *offset < end {
        let chunk = (end - *offset).min(MAX_CHUNK as u64) as usize;
        let sent = primitives.sendfile(destination, source, *offset, chunk)?;
        if sent == 0 {
            return Ok(RangeEnd::Stalled);
        }
        *offset += sent as u64;
    }
    Ok(RangeEnd::Complete)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::KernelPrimitives;
    use std::io::{Read, Write};
    use tempfile::NamedTempFile;

    fn create_temp_file(content: &[u8]) -> io::Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(content)?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn sendfile_range_copies_whole_file() {
        let content: Vec<u8> = (0..300_000u32).map(|i| (i % 199) as u8).collect();
        let source = create_temp_file(&content).expect("source");
        let destination = NamedTempFile::new().expect("destination");
        let mut offset = 0;
        let end = sendfile_range(
            &KernelPrimitives,
            source.as_file(),
            destination.as_file(),
            &mut offset,
            content.len() as u64,
        )
        .expect("sendfile");
        assert_eq!(end, RangeEnd::Complete);
        assert_eq!(offset, content.len() as u64);
        assert_eq!(std::fs::read(destination.path()).expect("read"), content);
    }

    #[test]
    fn sendfile_range_resumes_at_offset() {
        let source = create_temp_file(b"0123456789").expect("source");
        let mut destination = create_temp_file(b"ABCD").expect("destination");
        let mut offset = 4;
        sendfile_range(
            &KernelPrimitives,
            source.as_file(),
            destination.as_file(),
            &mut offset,
            10,
        )
        .expect("sendfile");

        let mut out = String::new();
        destination.seek(SeekFrom::Start(0)).expect("seek");
        destination.read_to_string(&mut out).expect("read");
        assert_eq!(out, "ABCD456789");
    }

    #[test]
    fn sendfile_range_source_shorter_than_end_stalls() {
        let source = create_temp_file(b"abc").expect("source");
        let destination = NamedTempFile::new().expect("destination");
        let mut offset = 0;
        let end = sendfile_range(
            &KernelPrimitives,
            source.as_file(),
            destination.as_file(),
            &mut offset,
            10,
        )
        .expect("sendfile");
        assert_eq!(end, RangeEnd::Stalled);
        assert_eq!(offset, 3);
    }
}
