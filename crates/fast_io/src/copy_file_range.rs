//! Block cloning through positional `copy_file_range(2)`.
//!
//! On ZFS (with block cloning), btrfs and XFS the kernel shares extents
//! instead of copying data, so a clone of a large file completes in constant
//! time. Other filesystems either copy in kernel or reject the call with
//! `EXDEV`/`EOPNOTSUPP`, which the cascade in [`crate::copy`] turns into a
//! fallback.

use std::fs::File;
use std::io;

use crate::primitives::CopyPrimitives;
use crate::{MAX_CHUNK, RangeEnd};

/// Clones `source` into `destination` from `*offset` up to `end`.
///
/// Both files are addressed with explicit offsets, so neither file position
/// moves. `*offset` is advanced past every byte the kernel accepted even when
/// an error is returned, letting a fallback resume where cloning stopped.
pub(crate) fn clone_range(
    primitives: &dyn CopyPrimitives,
    source: &File,
    destination: &File,
    offset: &mut u64,
    end: u64,
) -> io::Result<RangeEnd> {
    while *offset < end {
        let chunk = (end - *offset).min(MAX_CHUNK as u64) as usize;
        let copied = primitives.copy_file_range(source, destination, *offset, chunk)?;
        if copied == 0 {
            return Ok(RangeEnd::Stalled);
        }
        *offset += copied as u64;
    }
    Ok(RangeEnd::Complete)
}
