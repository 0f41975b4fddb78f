//! crates/platform/src/umount.rs
//!
//! `umount2(2)` wrapper.

use std::io;
use std::path::Path;

pub use nix::mount::MntFlags;

/// Detaches the mount at `target` with the given flags.
pub fn umount2(target: &Path, flags: MntFlags) -> io::Result<()> {
    nix::mount::umount2(target, flags).map_err(io::Error::from)
}
