//! crates/copytree/src/stats.rs

use std::fmt;

/// Counters of one [`copy_tree`](crate::copy_tree) run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CopyTreeStats {
    /// Regular files copied.
    pub files: u64,
    /// Directories created below the root.
    pub dirs: u64,
    /// Symlinks recreated.
    pub symlinks: u64,
    /// Bytes of file data written.
    pub bytes: u64,
    /// Devices, sockets and FIFOs left out.
    pub skipped: u64,
    /// Attributes that could not be applied.
    pub metadata_failures: u64,
}

impl fmt::Display for CopyTreeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files, {} dirs, {} symlinks, {} bytes",
            self.files, self.dirs, self.symlinks, self.bytes
        )?;
        if self.skipped > 0 {
            write!(f, ", {} skipped", self.skipped)?;
        }
        if self.metadata_failures > 0 {
            write!(f, ", {} metadata failures", self.metadata_failures)?;
        }
        Ok(())
    }
}
