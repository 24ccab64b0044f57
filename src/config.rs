//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//! built-in defaults, a TOML file, `BLOCKDUPE_*` environment variables and
//! finally command-line flags. The merged [`Config`] is validated and turned
//! into a [`FinderConfig`] before any file is touched.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Deserializer, Serialize};

use crate::duplicates::FinderConfig;
use crate::scanner::{Checksum, HashSettings, WalkerConfig, DEFAULT_BLOCK_SIZE};

/// Prefix of environment variables read into the configuration.
pub const ENV_PREFIX: &str = "BLOCKDUPE_";

/// Configuration errors. All of them are fatal at startup.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Block size of zero.
    #[error("Block size must be at least 1 byte")]
    InvalidBlockSize,

    /// No include directory after merging every layer.
    #[error("No include directories given (use --include or the `include` config key)")]
    NoIncludeDirs,

    /// The name filter is not a valid glob.
    #[error("Invalid name filter '{pattern}': {source}")]
    InvalidFilter {
        /// Offending pattern
        pattern: String,
        /// Underlying parse error
        #[source]
        source: glob::PatternError,
    },

    /// An explicitly requested config file is missing.
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    /// A layer could not be parsed or extracted.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
}

/// Merged application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directories to scan.
    #[serde(deserialize_with = "path_list")]
    pub include: Vec<PathBuf>,
    /// Directories whose subtrees are skipped.
    #[serde(deserialize_with = "path_list")]
    pub exclude: Vec<PathBuf>,
    /// Subdirectory levels to descend (0 = top level only).
    pub depth: usize,
    /// Smallest file size considered, in bytes.
    pub min_size: u64,
    /// Case-insensitive glob matched against file names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Bytes read per refinement pass.
    pub block_size: usize,
    /// Checksum name; unknown names fall back to md5.
    pub checksum: String,
    /// Threads reading blocks within a pass.
    pub io_threads: usize,
    /// Follow symbolic links while walking.
    pub follow_symlinks: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            depth: 0,
            min_size: 1,
            filter: None,
            block_size: DEFAULT_BLOCK_SIZE,
            checksum: Checksum::default().name().to_string(),
            io_threads: 4,
            follow_symlinks: false,
        }
    }
}

/// Values given on the command line. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub io_threads: Option<usize>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub follow_symlinks: bool,
}

impl Config {
    /// Default config file location (`<config dir>/blockdupe/config.toml`).
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "blockdupe", "blockdupe")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Build the layered figment.
    ///
    /// An explicit `config_file` must exist; the default location is
    /// optional.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileNotFound`] if `config_file` is missing.
    pub fn figment(config_file: Option<&Path>, overrides: &Overrides) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        match config_file {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::FileNotFound(path.to_path_buf()));
                }
                log::debug!("Loading config from {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(path) = Self::default_path() {
                    log::trace!("Looking for config at {}", path.display());
                    figment = figment.merge(Toml::file(path));
                }
            }
        }

        Ok(figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(overrides)))
    }

    /// Load and validate the merged configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a layer cannot be parsed or the result is
    /// invalid.
    pub fn load(config_file: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let config: Config = Self::figment(config_file, overrides)?
            .extract()
            .map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the constraints every run depends on.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.include.is_empty() {
            return Err(ConfigError::NoIncludeDirs);
        }
        if self.block_size == 0 {
            return Err(ConfigError::InvalidBlockSize);
        }
        self.name_filter()?;
        Ok(())
    }

    /// Parse the name filter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidFilter`] for a malformed glob.
    pub fn name_filter(&self) -> Result<Option<glob::Pattern>, ConfigError> {
        self.filter
            .as_deref()
            .map(|pattern| {
                glob::Pattern::new(pattern).map_err(|source| ConfigError::InvalidFilter {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// Resolve the checksum, warning on unknown names.
    #[must_use]
    pub fn checksum(&self) -> Checksum {
        Checksum::from_name_or_default(&self.checksum)
    }

    /// Build the finder configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for an invalid block size or filter.
    pub fn finder_config(&self) -> Result<FinderConfig, ConfigError> {
        let hash_settings = HashSettings::new(self.block_size, self.checksum())?;
        let walker_config = WalkerConfig::default()
            .with_max_depth(self.depth)
            .with_min_size(self.min_size)
            .with_name_filter(self.name_filter()?)
            .with_exclude_dirs(self.exclude.clone())
            .with_follow_symlinks(self.follow_symlinks);

        Ok(FinderConfig::default()
            .with_io_threads(self.io_threads)
            .with_hash_settings(hash_settings)
            .with_walker_config(walker_config))
    }
}

/// Split a semicolon-separated list, dropping empty segments.
#[must_use]
pub fn split_path_list(raw: &str) -> Vec<PathBuf> {
    raw.split(';')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Accept a path list either as a sequence or as one `a;b;c` string.
fn path_list<'de, D>(deserializer: D) -> Result<Vec<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Joined(String),
        Many(Vec<String>),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Joined(raw) => split_path_list(&raw),
        Raw::Many(items) => items.iter().flat_map(|item| split_path_list(item)).collect(),
    })
}
