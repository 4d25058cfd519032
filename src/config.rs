//! Layered configuration.
//!
//! Settings are resolved from lowest to highest priority:
//!
//! 1. built-in defaults
//! 2. a TOML file (`--config <FILE>`, or `config.toml` in the platform
//!    configuration directory when present)
//! 3. `BYTEDUPE_*` environment variables
//! 4. command line flags (applied by the caller)
//!
//! Every value is validated before a single file is opened; a bad thread
//! count or regex is a [`ConfigError`].
//!
//! ```toml
//! threads = 0
//! follow_symlinks = false
//! ignore_patterns = ["target/", "*.tmp"]
//! exclude_patterns = ['\.bak$']
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::duplicates::Concurrency;

/// Prefix of environment variables read by [`Config::load`].
pub const ENV_PREFIX: &str = "BYTEDUPE_";

/// Configuration errors, all fatal and raised before any processing.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The thread count is negative.
    #[error("Invalid thread count {0}: expected 0 (all cores), 1 (sequential) or a positive worker count")]
    InvalidThreads(i64),

    /// A file name pattern is not a valid regular expression.
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Why it did not compile
        #[source]
        source: regex::Error,
    },

    /// An explicitly requested configuration file does not exist.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// A source could not be parsed or had a value of the wrong type.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
}

/// Resolved settings that may come from a file or the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Worker threads: 0 = all cores, 1 = sequential, N = bounded pool
    pub threads: i64,
    /// Follow symbolic links during discovery
    pub follow_symlinks: bool,
    /// Include `.ccdup` manifests in discovery
    pub include_manifests: bool,
    /// Gitignore-style glob patterns to skip
    pub ignore_patterns: Vec<String>,
    /// File name regexes that exclude a file
    pub exclude_patterns: Vec<String>,
    /// File name regexes a file must match (all files when empty)
    pub include_patterns: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threads: 1,
            follow_symlinks: false,
            include_manifests: false,
            ignore_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            include_patterns: Vec::new(),
        }
    }
}

impl Config {
    /// Load from defaults, a TOML file and the environment.
    ///
    /// With `path` set the file must exist; otherwise the platform default
    /// file is merged when present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is missing or malformed, or if a
    /// value fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let toml = match path {
            Some(path) if !path.is_file() => {
                return Err(ConfigError::FileNotFound(path.to_path_buf()));
            }
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|p| p.is_file()),
        };

        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(ref toml) = toml {
            log::debug!("Reading configuration from {}", toml.display());
            figment = figment.merge(Toml::file(toml));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        Self::from_figment(&figment)
    }

    /// Extract and validate a configuration from an assembled figment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on extraction or validation failure.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Platform configuration file, e.g. `~/.config/bytedupe/config.toml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "bytedupe", "bytedupe")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Check every value that could otherwise fail mid-run.
    ///
    /// # Errors
    ///
    /// Returns the first invalid thread count or pattern.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.concurrency()?;
        compile_patterns(&self.include_patterns)?;
        compile_patterns(&self.exclude_patterns)?;
        Ok(())
    }

    /// The thread setting as a [`Concurrency`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidThreads`] for negative counts.
    pub fn concurrency(&self) -> Result<Concurrency, ConfigError> {
        usize::try_from(self.threads)
            .map(Concurrency::from_threads)
            .map_err(|_| ConfigError::InvalidThreads(self.threads))
    }
}

/// Compile file name patterns.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidPattern`] for the first pattern that is not
/// a valid regex.
pub fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;

    #[test]
    fn test_defaults() {
        let config = Config::from_figment(&Figment::from(Serialized::defaults(Config::default())))
            .unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.concurrency().unwrap(), Concurrency::Sequential);
    }

    #[test]
    fn test_concurrency_mapping() {
        let with = |threads| Config {
            threads,
            ..Default::default()
        };
        assert_eq!(with(0).concurrency().unwrap(), Concurrency::Available);
        assert_eq!(with(1).concurrency().unwrap(), Concurrency::Sequential);
        assert_eq!(
            with(4).concurrency().unwrap(),
            Concurrency::Bounded(NonZeroUsize::new(4).unwrap())
        );
        assert!(matches!(
            with(-2).concurrency(),
            Err(ConfigError::InvalidThreads(-2))
        ));
    }

    #[test]
    fn test_compile_patterns() {
        let compiled = compile_patterns(&[r"\.txt$".to_string(), "^a".to_string()]).unwrap();
        assert_eq!(compiled.len(), 2);
        assert!(compiled[0].is_match("notes.txt"));

        let err = compile_patterns(&["(unclosed".to_string()]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { ref pattern, .. } if pattern == "(unclosed"));
    }

    #[test]
    fn test_validate_rejects_bad_regex() {
        let config = Config {
            exclude_patterns: vec!["[".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/no/such/bytedupe.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_default_path_is_toml() {
        if let Some(path) = Config::default_path() {
            assert_eq!(path.file_name().unwrap(), "config.toml");
        }
    }
}
