//! Clusters configuration
//!
//! Downstream clusters and their hosts, loaded from their own TOML file.
//!
//! ```toml
//! [[clusters]]
//! name = "graphite-main"
//! type = "jump"
//!
//! [[clusters.hosts]]
//! name = "carbon-0.example.com"
//! index = 0
//!
//! [[clusters.hosts]]
//! name = "carbon-1.example.com"
//! index = 1
//! port = 2103
//! mtcp = 4
//!
//! [[clusters]]
//! name = "devnull"
//! type = "blackhole"
//! ```

use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{ConfigError, Result, read_file};
use crate::validation;

/// How a cluster picks hosts for a record
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ClusterType {
    /// Jump consistent hash over the fixed, indexed host ring
    Jump,
    /// Hash modulo the currently available hosts
    Lb,
    /// Every host gets every record
    #[serde(alias = "toAll")]
    Toall,
    /// Records are counted and discarded
    Blackhole,
}

impl ClusterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jump => "jump",
            Self::Lb => "lb",
            Self::Toall => "toall",
            Self::Blackhole => "blackhole",
        }
    }
}

impl std::fmt::Display for ClusterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One downstream host
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HostConfig {
    /// Host name or IP
    pub name: String,

    /// Position in the ring, required for `jump` clusters
    pub index: Option<usize>,

    /// Port, falls back to `sender.default_port`
    pub port: Option<u16>,

    /// Speak the streaming RPC instead of plaintext
    pub grpc: bool,

    /// Number of parallel TCP connections
    /// Default: 1
    pub mtcp: Option<usize>,
}

impl HostConfig {
    /// Effective connection count
    #[inline]
    pub fn connections(&self) -> usize {
        self.mtcp.unwrap_or(1)
    }

    /// Effective port
    #[inline]
    pub fn port_or(&self, default_port: u16) -> u16 {
        self.port.unwrap_or(default_port)
    }
}

/// One named cluster
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClusterConfig {
    pub name: String,

    /// Routing type; required
    #[serde(rename = "type")]
    pub cluster_type: Option<ClusterType>,

    pub hosts: Vec<HostConfig>,
}

impl ClusterConfig {
    /// Hosts in ring order
    ///
    /// For `jump` clusters the hosts are sorted by their `index`, which
    /// validation guarantees to be dense and unique. Other types keep the
    /// declared order.
    pub fn ordered_hosts(&self) -> Vec<&HostConfig> {
        let mut hosts: Vec<&HostConfig> = self.hosts.iter().collect();
        if self.cluster_type == Some(ClusterType::Jump) {
            hosts.sort_by_key(|h| h.index.unwrap_or(usize::MAX));
        }
        hosts
    }
}

/// The clusters file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClustersConfig {
    pub clusters: Vec<ClusterConfig>,
}

impl ClustersConfig {
    /// Load and validate the clusters file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_str(&read_file(path.as_ref())?)
    }

    /// Look up a cluster by name
    pub fn get(&self, name: &str) -> Option<&ClusterConfig> {
        self.clusters.iter().find(|c| c.name == name)
    }

    /// Whether a cluster with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Cluster names in declared order
    pub fn names(&self) -> Vec<&str> {
        self.clusters.iter().map(|c| c.name.as_str()).collect()
    }
}

impl FromStr for ClustersConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let config: ClustersConfig = toml::from_str(s)?;
        validation::validate_clusters(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clusters() {
        let toml = r#"
[[clusters]]
name = "main"
type = "jump"

[[clusters.hosts]]
name = "h1"
index = 1
port = 2103

[[clusters.hosts]]
name = "h0"
index = 0
mtcp = 3

[[clusters]]
name = "bh"
type = "blackhole"
"#;
        let config = ClustersConfig::from_str(toml).unwrap();
        assert_eq!(config.names(), vec!["main", "bh"]);

        let main = config.get("main").unwrap();
        assert_eq!(main.cluster_type, Some(ClusterType::Jump));
        let ordered: Vec<_> = main.ordered_hosts().iter().map(|h| h.name.as_str()).collect();
        assert_eq!(ordered, vec!["h0", "h1"]);

        assert_eq!(main.hosts[0].port_or(2003), 2103);
        assert_eq!(main.hosts[1].port_or(2003), 2003);
        assert_eq!(main.hosts[0].connections(), 1);
        assert_eq!(main.hosts[1].connections(), 3);

        assert!(config.contains("bh"));
        assert!(!config.contains("nope"));
    }

    #[test]
    fn test_parse_all_types() {
        for (s, expected) in [
            ("jump", ClusterType::Jump),
            ("lb", ClusterType::Lb),
            ("toall", ClusterType::Toall),
            ("toAll", ClusterType::Toall),
            ("blackhole", ClusterType::Blackhole),
        ] {
            let toml = format!(
                "[[clusters]]\nname = \"c\"\ntype = \"{s}\"\n[[clusters.hosts]]\nname = \"h\"\nindex = 0\n"
            );
            let config = ClustersConfig::from_str(&toml).unwrap();
            assert_eq!(config.clusters[0].cluster_type, Some(expected));
        }
    }

    #[test]
    fn test_unknown_type_rejected() {
        let toml = "[[clusters]]\nname = \"c\"\ntype = \"random\"\n";
        assert!(matches!(
            ClustersConfig::from_str(toml),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clusters.toml");
        std::fs::write(&path, "[[clusters]]\nname = \"bh\"\ntype = \"blackhole\"\n").unwrap();

        let config = ClustersConfig::from_file(&path).unwrap();
        assert_eq!(config.clusters.len(), 1);
    }
}
