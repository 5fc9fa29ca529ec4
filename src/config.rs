//! Catalog configuration, loadable from the `[catalog]` table of a TOML file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SqlsetError};
use crate::source::DEFAULT_DEFINITION_SUFFIX;
use crate::statement::DEFAULT_TEXT_CACHE_CAPACITY;

/// What to do when a qualified id is registered twice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The later definition replaces the earlier one.
    #[default]
    LastWriteWins,
    /// The later definition is logged and skipped.
    Reject,
}

/// Options applied to every statement a catalog loads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogOptions {
    /// Per-statement text cache capacity; 0 disables caching.
    pub text_cache_capacity: usize,
    /// Duplicate id handling.
    pub duplicate_policy: DuplicatePolicy,
    /// Timeout hint for statements that declare none, in seconds.
    pub default_statement_timeout: i64,
    /// Use the declared `statementType` instead of always preparing.
    pub honor_declared_kind: bool,
    /// File name prefix a directory scan requires.
    pub definition_prefix: String,
    /// File name suffix a directory scan requires.
    pub definition_suffix: String,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            text_cache_capacity: DEFAULT_TEXT_CACHE_CAPACITY,
            duplicate_policy: DuplicatePolicy::LastWriteWins,
            default_statement_timeout: 0,
            honor_declared_kind: false,
            definition_prefix: String::new(),
            definition_suffix: DEFAULT_DEFINITION_SUFFIX.to_owned(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    catalog: CatalogOptions,
}

impl CatalogOptions {
    /// Rejects duplicate ids and honors declared statement kinds.
    pub fn strict() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Reject,
            honor_declared_kind: true,
            ..Self::default()
        }
    }

    /// Sets the text cache capacity.
    pub fn with_text_cache_capacity(mut self, capacity: usize) -> Self {
        self.text_cache_capacity = capacity;
        self
    }

    /// Sets the duplicate policy.
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Sets the fallback statement timeout.
    pub fn with_default_statement_timeout(mut self, seconds: i64) -> Self {
        self.default_statement_timeout = seconds;
        self
    }

    /// Sets whether declared statement kinds are honored.
    pub fn with_honor_declared_kind(mut self, honor: bool) -> Self {
        self.honor_declared_kind = honor;
        self
    }

    /// Sets the file name prefix used by directory loads.
    pub fn with_definition_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.definition_prefix = prefix.into();
        self
    }

    /// Sets the file name suffix used by directory loads.
    pub fn with_definition_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.definition_suffix = suffix.into();
        self
    }

    /// Parses the `[catalog]` table of a TOML document. A missing table yields defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|err| SqlsetError::Config(err.to_string()))?;
        Ok(file.catalog)
    }

    /// Reads and parses a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|err| {
            SqlsetError::Config(format!("failed to read {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }
}
