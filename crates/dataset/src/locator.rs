//! crates/dataset/src/locator.rs
//!
//! Lookup of datasets that are not mounted.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::resolve::DatasetReference;

/// Finds a dataset by its configured mountpoint.
///
/// Implementations query the ZFS layer directly; the resolver only calls
/// this for immutable mount-root placeholders.
pub trait DatasetLocator {
    /// Returns the dataset whose mountpoint is `path`, if any.
    fn dataset_by_mountpoint(&self, path: &Path) -> Option<DatasetReference>;
}

impl<F> DatasetLocator for F
where
    F: Fn(&Path) -> Option<DatasetReference>,
{
    fn dataset_by_mountpoint(&self, path: &Path) -> Option<DatasetReference> {
        self(path)
    }
}

/// In-memory mountpoint to dataset map.
#[derive(Clone, Debug, Default)]
pub struct StaticLocator {
    datasets: HashMap<PathBuf, String>,
}

impl StaticLocator {
    /// Creates an empty locator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a mapping, builder style.
    #[must_use]
    pub fn with(mut self, mountpoint: impl Into<PathBuf>, dataset: impl Into<String>) -> Self {
        self.insert(mountpoint, dataset);
        self
    }

    /// Adds or replaces a mapping.
    pub fn insert(&mut self, mountpoint: impl Into<PathBuf>, dataset: impl Into<String>) {
        self.datasets.insert(mountpoint.into(), dataset.into());
    }

    /// Number of mappings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    /// Returns `true` when no mapping is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

impl DatasetLocator for StaticLocator {
    fn dataset_by_mountpoint(&self, path: &Path) -> Option<DatasetReference> {
        self.datasets
            .get(path)
            .map(|name| DatasetReference::new(name.clone(), PathBuf::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_locator_matches_exact_mountpoint() {
        let locator = StaticLocator::new().with("/mnt/tank/ds", "tank/ds");
        let found = locator
            .dataset_by_mountpoint(Path::new("/mnt/tank/ds"))
            .expect("mapped");
        assert_eq!(found.dataset_name, "tank/ds");
        assert!(found.relative_path.as_os_str().is_empty());
        assert!(locator.dataset_by_mountpoint(Path::new("/mnt/tank/ds/sub")).is_none());
        assert_eq!(locator.len(), 1);
    }

    #[test]
    fn closures_are_locators() {
        let locator = |_: &Path| Some(DatasetReference::new("pool/x", ""));
        assert_eq!(
            locator.dataset_by_mountpoint(Path::new("/anything")).map(|r| r.dataset_name),
            Some("pool/x".to_owned())
        );
    }
}
