//! Rewrite rules configuration
//!
//! ```toml
//! [[rewrites]]
//! from = "^servers\\.(\\w+)\\.cpu"
//! to = "hosts.$1.cpu"
//! copy = true
//! ```

use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{ConfigError, Result, read_file};
use crate::validation;

/// One rewrite rule
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RewriteConfig {
    /// Regex matched against the path; required
    pub from: Option<String>,

    /// Replacement template with `$1`-style backreferences; required
    pub to: Option<String>,

    /// Emit a rewritten copy instead of changing the record in place
    /// Default: false
    pub copy: bool,
}

/// The rewrites file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RewritesConfig {
    pub rewrites: Vec<RewriteConfig>,
}

impl RewritesConfig {
    /// Load and validate the rewrites file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_str(&read_file(path.as_ref())?)
    }
}

impl FromStr for RewritesConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let config: RewritesConfig = toml::from_str(s)?;
        validation::validate_rewrites(&config)?;
        Ok(config)
    }
}
