//! crates/copytree/src/progress.rs
//!
//! Progress reporting to a caller-owned job.

/// Receives progress updates from a running copy.
///
/// The sink belongs to the caller and is shared with exactly one copy.
/// Closures `Fn(u8, &str)` are sinks that never cancel.
pub trait ProgressSink: Send + Sync {
    /// Reports `percent` (0..=100) complete with a human-readable message.
    fn set_progress(&self, percent: u8, message: &str);

    /// Polled between entries; returning `true` aborts the copy.
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl<F> ProgressSink for F
where
    F: Fn(u8, &str) + Send + Sync,
{
    fn set_progress(&self, percent: u8, message: &str) {
        self(percent, message);
    }
}

/// Emits periodic and final messages for one copy.
pub(crate) struct Progress<'a> {
    sink: &'a dyn ProgressSink,
    prefix: &'a str,
    every: u64,
    total: u64,
}

impl<'a> Progress<'a> {
    pub(crate) fn new(sink: &'a dyn ProgressSink, prefix: &'a str, every: u64, total: u64) -> Self {
        Self {
            sink,
            prefix,
            every: every.max(1),
            total,
        }
    }

    /// Called after each regular file.
    pub(crate) fn file_copied(&self, files: u64) {
        if files % self.every != 0 {
            return;
        }
        let percent = if self.total == 0 {
            0
        } else {
            u8::try_from((files.saturating_mul(100) / self.total).min(99)).unwrap_or(99)
        };
        self.sink.set_progress(
            percent,
            &format!("{}Copied {} of {} files", self.prefix, files, self.total),
        );
    }

    pub(crate) fn finished(&self, files: u64, dirs: u64, symlinks: u64) {
        self.sink.set_progress(
            100,
            &format!(
                "{}Successfully copied {files} files, {dirs} dirs, {symlinks} symlinks",
                self.prefix
            ),
        );
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.sink.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_support::ProgressLog;

    #[test]
    fn reports_every_nth_file() {
        let log = ProgressLog::new();
        let sink = |percent: u8, message: &str| log.record(percent, message);
        let progress = Progress::new(&sink, "job: ", 2, 4);
        for files in 1..=4 {
            progress.file_copied(files);
        }
        progress.finished(4, 1, 0);
        assert_eq!(
            log.entries(),
            vec![
                (50, "job: Copied 2 of 4 files".to_owned()),
                (99, "job: Copied 4 of 4 files".to_owned()),
                (100, "job: Successfully copied 4 files, 1 dirs, 0 symlinks".to_owned()),
            ]
        );
    }

    #[test]
    fn zero_increment_reports_every_file() {
        let log = ProgressLog::new();
        let sink = |percent: u8, message: &str| log.record(percent, message);
        let progress = Progress::new(&sink, "", 0, 0);
        progress.file_copied(1);
        assert_eq!(log.entries(), vec![(0, "Copied 1 of 0 files".to_owned())]);
    }

    #[test]
    fn closures_never_cancel() {
        let sink = |_: u8, _: &str| {};
        assert!(!Progress::new(&sink, "", 1, 1).is_cancelled());
    }
}
