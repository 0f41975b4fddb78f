//! crates/logging/src/config.rs
//! Verbosity configuration and subscriber initialisation.

use std::fmt::Write as _;

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::targets;

/// Logging configuration for the subsystem targets.
///
/// A `LogConfig` is rendered into an [`EnvFilter`] directive string. When the
/// `RUST_LOG` environment variable is set it takes precedence, so operators can
/// always override the programmatic defaults.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LogConfig {
    /// Level applied to every target without an explicit override.
    #[cfg_attr(feature = "serde", serde(with = "level_name"))]
    pub default_level: Level,
    /// Per-target overrides, e.g. `("nasfs::io", Level::TRACE)`.
    #[cfg_attr(feature = "serde", serde(with = "target_levels"))]
    pub targets: Vec<(String, Level)>,
    /// Emit ANSI colour codes.
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: Level::WARN,
            targets: Vec::new(),
            ansi: false,
        }
    }
}

impl LogConfig {
    /// Builds a configuration from a verbosity count (`-v` repetitions).
    ///
    /// | level | copy  | meta  | mount | resolve | io    |
    /// |-------|-------|-------|-------|---------|-------|
    /// | 0     | warn  | warn  | warn  | warn    | warn  |
    /// | 1     | info  | info  | info  | info    | warn  |
    /// | 2     | debug | debug | debug | debug   | warn  |
    /// | 3+    | debug | debug | debug | debug   | trace |
    #[must_use]
    pub fn from_verbose_level(level: u8) -> Self {
        let subsystem = match level {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        };
        let io = if level >= 3 { Level::TRACE } else { Level::WARN };

        let mut overrides: Vec<(String, Level)> = [
            targets::COPY,
            targets::META,
            targets::MOUNT,
            targets::RESOLVE,
        ]
        .iter()
        .map(|target| ((*target).to_owned(), subsystem))
        .collect();
        overrides.push((targets::IO.to_owned(), io));

        Self {
            targets: overrides,
            ..Self::default()
        }
    }

    /// Overrides the level of a single target.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>, level: Level) -> Self {
        let target = target.into();
        self.targets.retain(|(existing, _)| *existing != target);
        self.targets.push((target, level));
        self
    }

    /// Enables or disables ANSI colour codes.
    #[must_use]
    pub const fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// Renders the `EnvFilter` directive string.
    #[must_use]
    pub fn directives(&self) -> String {
        let mut out = level_directive(self.default_level).to_owned();
        for (target, level) in &self.targets {
            let _ = write!(out, ",{target}={}", level_directive(*level));
        }
        out
    }

    /// Builds the filter, preferring `RUST_LOG` when it is set and valid.
    #[must_use]
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.directives()))
    }
}

fn level_directive(level: Level) -> &'static str {
    if level == Level::TRACE {
        "trace"
    } else if level == Level::DEBUG {
        "debug"
    } else if level == Level::INFO {
        "info"
    } else if level == Level::WARN {
        "warn"
    } else {
        "error"
    }
}

/// Installs a global fmt subscriber filtered by `config`.
///
/// Returns `false` when a global subscriber was already installed, which makes
/// the call safe to repeat from tests and embedding applications.
pub fn init_tracing(config: &LogConfig) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_ansi(config.ansi)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(feature = "serde")]
mod level_name {
    use serde::{Deserialize, Deserializer, Serializer};
    use tracing::Level;

    pub(super) fn serialize<S: Serializer>(level: &Level, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(super::level_directive(*level))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Level, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "serde")]
mod target_levels {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use tracing::Level;

    pub(super) fn serialize<S: Serializer>(
        targets: &[(String, Level)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        targets
            .iter()
            .map(|(target, level)| (target.as_str(), super::level_directive(*level)))
            .collect::<Vec<_>>()
            .serialize(serializer)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(String, Level)>, D::Error> {
        let raw = Vec::<(String, String)>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(target, level)| {
                level
                    .parse()
                    .map(|level| (target, level))
                    .map_err(serde::de::Error::custom)
            })
            .collect()
    }
}
