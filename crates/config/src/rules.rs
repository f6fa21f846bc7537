//! Routing rules configuration
//!
//! ```toml
//! [[rules]]
//! regexs = ["^servers\\..*"]
//! prefixes = ["apps.checkout."]
//! clusters = ["graphite-main"]
//! continue = true
//!
//! [[rules]]
//! regexs = [".*"]
//! clusters = ["devnull"]
//! ```

use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{ConfigError, Result, read_file};
use crate::validation;

/// One routing rule
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RuleConfig {
    /// Regexes matched anywhere in the path
    pub regexs: Vec<String>,

    /// Literal path prefixes
    pub prefixes: Vec<String>,

    /// Target cluster names
    pub clusters: Vec<String>,

    /// Keep evaluating later rules after a match
    /// Default: false
    #[serde(rename = "continue")]
    pub continue_matching: bool,
}

/// The rules file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub rules: Vec<RuleConfig>,
}

impl RulesConfig {
    /// Load and validate the rules file
    ///
    /// Cluster references are checked separately with
    /// [`validate_rules_against`](crate::validate_rules_against) once the
    /// clusters file is known.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_str(&read_file(path.as_ref())?)
    }
}

impl FromStr for RulesConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let config: RulesConfig = toml::from_str(s)?;
        validation::validate_rules(&config)?;
        Ok(config)
    }
}
