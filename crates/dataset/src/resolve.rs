//! crates/dataset/src/resolve.rs
//!
//! Path to dataset resolution.

use std::path::{Component, Path, PathBuf};

use logging::trace_resolve;
use mount::{MountId, MountRecord};
use platform::statx::{attr, mask};
use platform::{FsResult, IoResultExt};

use crate::locator::DatasetLocator;

/// A dataset and a path inside it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DatasetReference {
    /// Full dataset name, `pool/.../ds`.
    pub dataset_name: String,
    /// Path relative to the dataset mountpoint; empty for the mountpoint itself.
    pub relative_path: PathBuf,
}

impl DatasetReference {
    /// Builds a reference.
    pub fn new(dataset_name: impl Into<String>, relative_path: impl Into<PathBuf>) -> Self {
        Self {
            dataset_name: dataset_name.into(),
            relative_path: relative_path.into(),
        }
    }
}

/// Outcome of [`resolve_dataset_path`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Resolution {
    /// The path authoritatively belongs to this dataset.
    Resolved(DatasetReference),
    /// The answer is not available now; retry later.
    Deferred,
}

impl Resolution {
    /// Returns the reference when resolved.
    #[must_use]
    pub fn reference(&self) -> Option<&DatasetReference> {
        match self {
            Self::Resolved(reference) => Some(reference),
            Self::Deferred => None,
        }
    }

    /// Returns `true` for [`Resolution::Deferred`].
    #[must_use]
    pub const fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred)
    }
}

/// What the resolver needs to know about a path.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PathFacts {
    pub(crate) mount_id: MountId,
    pub(crate) immutable: bool,
    pub(crate) mount_root: bool,
}

/// Kernel queries used by the resolver.
pub(crate) trait Introspect {
    fn path_facts(&self, path: &Path) -> FsResult<PathFacts>;
    fn mount_record(&self, mount_id: MountId) -> FsResult<MountRecord>;
}

struct Kernel;

impl Introspect for Kernel {
    fn path_facts(&self, path: &Path) -> FsResult<PathFacts> {
        let stx = platform::statx::statx_path(
            path,
            true,
            mask::STATX_MNT_ID_UNIQUE | mask::STATX_MNT_ID,
        )
        .fs_context("statx", path)?;
        Ok(PathFacts {
            mount_id: MountId(stx.stx_mnt_id),
            immutable: stx.has_attribute(attr::STATX_ATTR_IMMUTABLE),
            mount_root: stx.has_attribute(attr::STATX_ATTR_MOUNT_ROOT),
        })
    }

    fn mount_record(&self, mount_id: MountId) -> FsResult<MountRecord> {
        mount::statmount(mount_id)
    }
}

/// Maps an absolute path to its dataset.
///
/// 1. A mutable path on a mounted `zfs` filesystem resolves from the mount
///    record: the mount source is the dataset, and the path relative to the
///    mountpoint is the relative path.
/// 2. An immutable mount root is the placeholder ZFS leaves at the mountpoint
///    of an unmounted dataset; `locator` decides which dataset that is.
/// 3. Anything else, including every lookup failure, is deferred.
pub fn resolve_dataset_path(path: &Path, locator: &dyn DatasetLocator) -> Resolution {
    resolve_with(&Kernel, path, locator)
}

pub(crate) fn resolve_with(
    kernel: &dyn Introspect,
    path: &Path,
    locator: &dyn DatasetLocator,
) -> Resolution {
    if !path.is_absolute() {
        trace_resolve!("deferring {}: path is not absolute", path.display());
        return Resolution::Deferred;
    }

    let facts = match kernel.path_facts(path) {
        Ok(facts) => facts,
        Err(err) => {
            trace_resolve!("deferring {}: {}", path.display(), err);
            return Resolution::Deferred;
        }
    };

    if !facts.immutable {
        return match kernel.mount_record(facts.mount_id) {
            Ok(record) if record.fs_type == "zfs" && !record.source.is_empty() => {
                from_mount_record(path, &record)
            }
            Ok(record) => {
                trace_resolve!(
                    "deferring {}: {} mount '{}' is not a dataset",
                    path.display(),
                    record.fs_type,
                    record.source
                );
                Resolution::Deferred
            }
            Err(err) => {
                trace_resolve!("deferring {}: {}", path.display(), err);
                Resolution::Deferred
            }
        };
    }

    if facts.mount_root {
        return match locator.dataset_by_mountpoint(path) {
            Some(found) => {
                trace_resolve!(
                    "{} is the placeholder of unmounted dataset {}",
                    path.display(),
                    found.dataset_name
                );
                Resolution::Resolved(DatasetReference::new(found.dataset_name, PathBuf::new()))
            }
            None => {
                trace_resolve!("deferring {}: no dataset claims placeholder", path.display());
                Resolution::Deferred
            }
        };
    }

    trace_resolve!("deferring {}: immutable but not a mount root", path.display());
    Resolution::Deferred
}

fn from_mount_record(path: &Path, record: &MountRecord) -> Resolution {
    let normalized = normalize_lexically(path);
    match normalized.strip_prefix(&record.mountpoint) {
        Ok(relative) => Resolution::Resolved(DatasetReference::new(
            record.source.clone(),
            relative.to_path_buf(),
        )),
        Err(_) => {
            trace_resolve!(
                "deferring {}: outside mountpoint {}",
                path.display(),
                record.mountpoint.display()
            );
            Resolution::Deferred
        }
    }
}

/// Drops `.` components and lets `..` remove the component before it.
///
/// `..` at the root stays at the root, as it does in the kernel.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}
