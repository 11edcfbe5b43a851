use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

/// Default name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "housekeeping.toml";

const DAY: i64 = 24 * 3600;

/// How two sub-policies of a combined retention rule are composed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Remove only what both the age and the count cutoff select.
    And,
    /// Remove what either the age or the count cutoff selects.
    Or,
}

/// Parameters of a combined age/count retention rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedParameters {
    pub strategy: Strategy,
    /// Maximum age in seconds.
    pub file_age: i64,
    /// Number of newest history entries to keep.
    pub number_of_history_entries: usize,
}

/// Retention parameters as configured: a `(kind, params)` pair.
///
/// ```toml
/// parameters = { kind = "file_age", params = 2592000 }
/// parameters = { kind = "number_of_history_entries", params = 10 }
/// parameters = { kind = "combined", params = { strategy = "or", file_age = 2592000, number_of_history_entries = 10 } }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params", rename_all = "snake_case")]
pub enum PolicyParameters {
    FileAge(i64),
    NumberOfHistoryEntries(usize),
    Combined(CombinedParameters),
}

impl From<CombinedParameters> for PolicyParameters {
    fn from(params: CombinedParameters) -> Self {
        PolicyParameters::Combined(params)
    }
}

/// A per-host retention override.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRule {
    /// Literal host names, or regular expressions prefixed with `~`.
    pub match_patterns: Vec<String>,
    pub parameters: PolicyParameters,
}

/// The `inventory_housekeeping` section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryHousekeepingConfig {
    /// Per-host rules, first match wins.
    #[serde(default)]
    pub for_hosts: Vec<HostRule>,

    /// Policy for hosts no rule matches. Hosts are skipped when unset.
    #[serde(default)]
    pub default: Option<CombinedParameters>,

    /// Maximum age in seconds of files that belong to no known host.
    #[serde(default = "default_abandoned_file_age")]
    pub abandoned_file_age: i64,
}

fn default_abandoned_file_age() -> i64 {
    30 * DAY
}

impl Default for InventoryHousekeepingConfig {
    fn default() -> Self {
        Self {
            for_hosts: Vec::new(),
            default: None,
            abandoned_file_age: default_abandoned_file_age(),
        }
    }
}

/// Where the list of currently known host names comes from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum HostSourceConfig {
    /// Host names listed in the configuration itself.
    Static {
        #[serde(default)]
        names: Vec<String>,
    },
    /// A text file with one host name per line.
    File { path: PathBuf },
    /// A command printing one host name per line on stdout.
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

impl Default for HostSourceConfig {
    fn default() -> Self {
        HostSourceConfig::Static { names: Vec::new() }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Configuration {
    /// Site root all inventory directories are resolved against.
    ///
    /// Env: OMD_ROOT or HOUSEKEEPING__OMD_ROOT
    pub omd_root: PathBuf,
    /// Retention rules.
    #[serde(default)]
    pub inventory_housekeeping: InventoryHousekeepingConfig,
    /// Host name enumeration.
    #[serde(default)]
    pub hosts: HostSourceConfig,
    /// Log deletions without touching the filesystem.
    ///
    /// Env: HOUSEKEEPING__DRY_RUN
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            omd_root: PathBuf::from("."),
            inventory_housekeeping: InventoryHousekeepingConfig::default(),
            hosts: HostSourceConfig::default(),
            dry_run: false,
        }
    }
}

/// Errors raised while loading or validating the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid file age for {context}: {value} must not be negative")]
    NegativeFileAge { context: String, value: i64 },

    #[error("Host rule #{index} has no match patterns")]
    EmptyMatchPatterns { index: usize },

    #[error("Invalid host pattern '{pattern}': {source}")]
    InvalidHostPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl Configuration {
    /// Load from defaults, `housekeeping.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::extract(Self::figment(Path::new(DEFAULT_CONFIG_FILE)))
    }

    /// Load from defaults, the given TOML file and the environment.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        Self::extract(Self::figment(path))
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Configuration::default()))
            .merge(Toml::file(path))
            .merge(Env::raw().only(&["OMD_ROOT"]))
            .merge(Env::prefixed("HOUSEKEEPING__").split("__"))
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Configuration = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Check rule parameters and host patterns.
    ///
    /// Regular expressions are compiled here so that a broken pattern fails
    /// the run before any file is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let housekeeping = &self.inventory_housekeeping;

        check_file_age("abandoned_file_age", housekeeping.abandoned_file_age)?;

        if let Some(default) = &housekeeping.default {
            check_file_age("default", default.file_age)?;
        }

        for (index, rule) in housekeeping.for_hosts.iter().enumerate() {
            if rule.match_patterns.is_empty() {
                return Err(ConfigError::EmptyMatchPatterns { index });
            }
            crate::hosts::HostMatcher::new(&rule.match_patterns)?;

            let context = format!("host rule #{index}");
            match &rule.parameters {
                PolicyParameters::FileAge(age) => check_file_age(&context, *age)?,
                PolicyParameters::NumberOfHistoryEntries(_) => {}
                PolicyParameters::Combined(params) => check_file_age(&context, params.file_age)?,
            }
        }

        Ok(())
    }
}

fn check_file_age(context: &str, value: i64) -> Result<(), ConfigError> {
    if value < 0 {
        return Err(ConfigError::NegativeFileAge {
            context: context.to_string(),
            value,
        });
    }
    Ok(())
}
