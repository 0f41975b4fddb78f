//! Shared helpers for tests across the workspace.
//!
//! Capability checks let tests skip themselves (with a note on stderr) when
//! the sandbox lacks root, xattr support, or a recent kernel.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Returns `true` when running with effective uid 0.
pub fn is_root() -> bool {
    rustix::process::geteuid().is_root()
}

/// Returns `true` if `user.*` extended attributes can be set on `path`.
pub fn xattrs_supported(path: &Path) -> bool {
    let marker = OsStr::new("user.test_support");
    match xattr::set(path, marker, b"test") {
        Ok(()) => {
            let _ = xattr::remove(path, marker);
            true
        }
        Err(_) => false,
    }
}

/// Deterministic pseudo-random bytes from a seeded [`StdRng`], stable across
/// runs of the same build.
pub fn pseudo_random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut out = vec![0; len];
    StdRng::seed_from_u64(seed).fill_bytes(&mut out);
    out
}

/// Writes `len` pseudo-random bytes to `path`.
pub fn write_random_file(path: &Path, len: usize, seed: u64) -> io::Result<Vec<u8>> {
    let data = pseudo_random_bytes(len, seed);
    fs::write(path, &data)?;
    Ok(data)
}

/// Records progress updates for later inspection.
#[derive(Debug, Default)]
pub struct ProgressLog {
    entries: Mutex<Vec<(u8, String)>>,
}

impl ProgressLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one update.
    pub fn record(&self, percent: u8, message: &str) {
        self.lock().push((percent, message.to_owned()));
    }

    /// Snapshot of all updates so far.
    pub fn entries(&self) -> Vec<(u8, String)> {
        self.lock().clone()
    }

    /// The most recent update.
    pub fn last(&self) -> Option<(u8, String)> {
        self.lock().last().cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(u8, String)>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
