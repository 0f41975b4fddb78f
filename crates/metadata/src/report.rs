//! crates/metadata/src/report.rs
//!
//! Outcome of one propagation: which attributes could not be applied.

use std::fmt;

use platform::{FsError, FsResult};

/// One attribute class.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Attribute {
    /// Extended attributes.
    Xattrs,
    /// Owner and group.
    Owner,
    /// Permission bits.
    Permissions,
    /// Access and modification times.
    Timestamps,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Xattrs => "extended attributes",
            Self::Owner => "ownership",
            Self::Permissions => "permissions",
            Self::Timestamps => "timestamps",
        })
    }
}

/// An attribute that could not be applied.
#[derive(Debug)]
pub struct MetadataFailure {
    /// What was being applied.
    pub attribute: Attribute,
    /// Why it failed.
    pub error: FsError,
}

impl fmt::Display for MetadataFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.attribute, self.error)
    }
}

/// Failures collected while propagating metadata to one entry.
#[derive(Debug, Default)]
pub struct PropagationReport {
    failures: Vec<MetadataFailure>,
}

impl PropagationReport {
    /// Creates an empty report.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            failures: Vec::new(),
        }
    }

    /// Returns `true` when every requested attribute was applied.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failed attributes, in application order.
    #[must_use]
    pub fn failures(&self) -> &[MetadataFailure] {
        &self.failures
    }

    /// Number of failed attributes.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Records a failure.
    pub fn push(&mut self, attribute: Attribute, error: FsError) {
        self.failures.push(MetadataFailure { attribute, error });
    }

    /// Appends the failures of another report.
    pub fn merge(&mut self, other: Self) {
        self.failures.extend(other.failures);
    }

    /// Converts the report into a result carrying the first failure.
    pub fn into_result(self) -> FsResult<()> {
        match self.failures.into_iter().next() {
            Some(failure) => Err(failure.error),
            None => Ok(()),
        }
    }
}
