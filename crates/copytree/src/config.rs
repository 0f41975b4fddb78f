//! crates/copytree/src/config.rs

use std::fmt;
use std::sync::Arc;

use fast_io::CopyOperation;
use metadata::CopyFlags;

use crate::progress::ProgressSink;
use crate::sentinel::ControlDirSentinel;

/// Default number of files between progress messages.
pub const DEFAULT_JOB_MSG_INC: u64 = 1000;

/// Options for [`copy_tree`](crate::copy_tree).
///
/// # Examples
///
/// ```
/// use copytree::{CopyOperation, CopyTreeConfig};
///
/// let config = CopyTreeConfig::new()
///     .op(CopyOperation::Userspace)
///     .job_msg_prefix("Replicating: ")
///     .traverse(true);
/// assert!(config.allows_existing());
/// assert_eq!(config.msg_interval(), 1000);
/// ```
#[derive(Clone)]
pub struct CopyTreeConfig {
    flags: CopyFlags,
    exist_ok: bool,
    op: CopyOperation,
    job: Option<Arc<dyn ProgressSink>>,
    job_msg_inc: u64,
    job_msg_prefix: String,
    traverse: bool,
    raise_error: bool,
    control_dir: Option<ControlDirSentinel>,
}

impl Default for CopyTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CopyTreeConfig {
    /// All attributes, existing destinations allowed, automatic mechanism,
    /// no progress sink, mounts not traversed, attribute failures counted.
    #[must_use]
    pub fn new() -> Self {
        Self {
            flags: CopyFlags::all(),
            exist_ok: true,
            op: CopyOperation::Auto,
            job: None,
            job_msg_inc: DEFAULT_JOB_MSG_INC,
            job_msg_prefix: String::new(),
            traverse: false,
            raise_error: false,
            control_dir: None,
        }
    }

    /// Selects the attributes to preserve.
    #[must_use]
    pub fn flags(mut self, flags: CopyFlags) -> Self {
        self.flags = flags;
        self
    }

    /// When false, an existing destination root, file or symlink is an
    /// error. When true, files are overwritten and symlinks left alone.
    #[must_use]
    pub fn exist_ok(mut self, exist_ok: bool) -> Self {
        self.exist_ok = exist_ok;
        self
    }

    /// Selects the content copy mechanism.
    #[must_use]
    pub fn op(mut self, op: CopyOperation) -> Self {
        self.op = op;
        self
    }

    /// Attaches a progress sink.
    #[must_use]
    pub fn job(mut self, job: Arc<dyn ProgressSink>) -> Self {
        self.job = Some(job);
        self
    }

    /// Files between progress messages.
    #[must_use]
    pub fn job_msg_inc(mut self, every: u64) -> Self {
        self.job_msg_inc = every;
        self
    }

    /// Text prepended to every progress message.
    #[must_use]
    pub fn job_msg_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.job_msg_prefix = prefix.into();
        self
    }

    /// Descends into directories that are mounts of their own.
    #[must_use]
    pub fn traverse(mut self, traverse: bool) -> Self {
        self.traverse = traverse;
        self
    }

    /// Turns the first attribute failure into an error.
    #[must_use]
    pub fn raise_error(mut self, raise_error: bool) -> Self {
        self.raise_error = raise_error;
        self
    }

    /// Uses `sentinel` instead of probing the mounted ZFS datasets.
    #[must_use]
    pub fn control_dir(mut self, sentinel: ControlDirSentinel) -> Self {
        self.control_dir = Some(sentinel);
        self
    }

    /// Returns the attributes to preserve.
    #[must_use]
    pub const fn copy_flags(&self) -> CopyFlags {
        self.flags
    }

    /// Returns whether existing destinations are accepted.
    #[must_use]
    pub const fn allows_existing(&self) -> bool {
        self.exist_ok
    }

    /// Returns the content copy mechanism.
    #[must_use]
    pub const fn operation(&self) -> CopyOperation {
        self.op
    }

    /// Returns the progress sink, if any.
    #[must_use]
    pub fn progress_sink(&self) -> Option<&dyn ProgressSink> {
        self.job.as_deref()
    }

    /// Returns the number of files between progress messages.
    #[must_use]
    pub const fn msg_interval(&self) -> u64 {
        self.job_msg_inc
    }

    /// Returns the progress message prefix.
    #[must_use]
    pub fn msg_prefix(&self) -> &str {
        &self.job_msg_prefix
    }

    /// Returns whether mounts are traversed.
    #[must_use]
    pub const fn traverses_mounts(&self) -> bool {
        self.traverse
    }

    /// Returns whether attribute failures are fatal.
    #[must_use]
    pub const fn raises_errors(&self) -> bool {
        self.raise_error
    }

    /// Returns the configured sentinel, if overridden.
    #[must_use]
    pub const fn control_dir_sentinel(&self) -> Option<ControlDirSentinel> {
        self.control_dir
    }
}

impl fmt::Debug for CopyTreeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopyTreeConfig")
            .field("flags", &self.flags)
            .field("exist_ok", &self.exist_ok)
            .field("op", &self.op)
            .field("job", &self.job.is_some())
            .field("job_msg_inc", &self.job_msg_inc)
            .field("job_msg_prefix", &self.job_msg_prefix)
            .field("traverse", &self.traverse)
            .field("raise_error", &self.raise_error)
            .field("control_dir", &self.control_dir)
            .finish()
    }
}
