//! Configuration validation
//!
//! Validates config consistency:
//! - At least one of the TCP and UDP listeners is set
//! - pprof and metrics ports differ
//! - Queue sizes, worker count and timeouts are non-zero
//! - Clusters have a name and a type, and non-blackhole clusters have hosts
//! - `jump` hosts carry dense, unique indices
//! - Rules have a match section and target clusters that exist
//! - Rewrites have both `from` and `to`
//!
//! Regex syntax is checked later, when the rule engine and rewriter compile
//! their patterns.

use std::collections::HashSet;

use crate::Config;
use crate::clusters::{ClusterType, ClustersConfig};
use crate::error::{ConfigError, Result};
use crate::rewrites::RewritesConfig;
use crate::rules::RulesConfig;

/// Validate the main configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_listen(config)?;
    validate_global(config)?;
    validate_sender(config)?;
    Ok(())
}

fn validate_listen(config: &Config) -> Result<()> {
    if config.listen.tcp.is_none() && config.listen.udp.is_none() {
        return Err(ConfigError::NoListenersEnabled);
    }

    if config.listen.max_line_len == 0 {
        return Err(ConfigError::invalid_value(
            "listen",
            "listen",
            "max_line_len",
            "must be greater than 0",
        ));
    }

    let batching = &config.listen.batching;
    if batching.enabled && batching.batch_size == 0 {
        return Err(ConfigError::invalid_value(
            "listen",
            "batching",
            "batch_size",
            "must be greater than 0",
        ));
    }

    Ok(())
}

fn validate_global(config: &Config) -> Result<()> {
    let global = &config.global;

    if let (Some(pprof), Some(prom)) = (global.pprof_port, global.prom_port)
        && pprof == prom
    {
        return Err(ConfigError::PortConflict(pprof));
    }

    for (field, value) in [
        ("workers", global.workers),
        ("main_queue_size", global.main_queue_size),
        ("host_queue_size", global.host_queue_size),
    ] {
        if value == 0 {
            return Err(ConfigError::invalid_value(
                "global",
                "global",
                field,
                "must be greater than 0",
            ));
        }
    }

    Ok(())
}

fn validate_sender(config: &Config) -> Result<()> {
    let sender = &config.sender;

    for (field, value) in [
        ("send_timeout", sender.send_timeout),
        ("out_conn_timeout", sender.out_conn_timeout),
    ] {
        if value.is_zero() {
            return Err(ConfigError::invalid_value(
                "sender",
                "sender",
                field,
                "must be greater than 0",
            ));
        }
    }

    Ok(())
}

/// Validate the clusters file on its own
pub fn validate_clusters(config: &ClustersConfig) -> Result<()> {
    let mut names = HashSet::new();

    for (i, cluster) in config.clusters.iter().enumerate() {
        if cluster.name.is_empty() {
            return Err(ConfigError::missing_field("cluster", format!("#{i}"), "name"));
        }
        if !names.insert(cluster.name.as_str()) {
            return Err(ConfigError::DuplicateCluster(cluster.name.clone()));
        }

        let Some(cluster_type) = cluster.cluster_type else {
            return Err(ConfigError::missing_field("cluster", &cluster.name, "type"));
        };

        if cluster_type != ClusterType::Blackhole && cluster.hosts.is_empty() {
            return Err(ConfigError::missing_field("cluster", &cluster.name, "hosts"));
        }

        for host in &cluster.hosts {
            if host.name.is_empty() {
                return Err(ConfigError::missing_field("host", &cluster.name, "name"));
            }
            if host.mtcp == Some(0) {
                return Err(ConfigError::invalid_value(
                    "host",
                    &host.name,
                    "mtcp",
                    "must be at least 1",
                ));
            }
        }

        if cluster_type == ClusterType::Jump {
            validate_jump_indices(cluster)?;
        }
    }

    Ok(())
}

/// `jump` needs every host indexed, with indices forming exactly 0..N
fn validate_jump_indices(cluster: &crate::ClusterConfig) -> Result<()> {
    let count = cluster.hosts.len();
    let mut seen = vec![false; count];

    for host in &cluster.hosts {
        let Some(index) = host.index else {
            return Err(ConfigError::missing_field("host", &host.name, "index"));
        };
        if index >= count {
            return Err(ConfigError::invalid_value(
                "host",
                &host.name,
                "index",
                format!("{index} is out of range for {count} hosts in '{}'", cluster.name),
            ));
        }
        if seen[index] {
            return Err(ConfigError::invalid_value(
                "host",
                &host.name,
                "index",
                format!("{index} is used twice in '{}'", cluster.name),
            ));
        }
        seen[index] = true;
    }

    Ok(())
}

/// Validate the rules file on its own
pub fn validate_rules(config: &RulesConfig) -> Result<()> {
    for (i, rule) in config.rules.iter().enumerate() {
        if rule.regexs.is_empty() && rule.prefixes.is_empty() {
            return Err(ConfigError::missing_field("rule", format!("#{i}"), "regexs"));
        }
        if rule.clusters.is_empty() {
            return Err(ConfigError::missing_field("rule", format!("#{i}"), "clusters"));
        }
    }
    Ok(())
}

/// Check that every cluster a rule targets is declared
pub fn validate_rules_against(rules: &RulesConfig, clusters: &ClustersConfig) -> Result<()> {
    for (i, rule) in rules.rules.iter().enumerate() {
        for name in &rule.clusters {
            if !clusters.contains(name) {
                return Err(ConfigError::unknown_cluster(i, name));
            }
        }
    }
    Ok(())
}

/// Validate the rewrites file on its own
pub fn validate_rewrites(config: &RewritesConfig) -> Result<()> {
    for (i, rewrite) in config.rewrites.iter().enumerate() {
        if rewrite.from.is_none() {
            return Err(ConfigError::missing_field("rewrite", format!("#{i}"), "from"));
        }
        if rewrite.to.is_none() {
            return Err(ConfigError::missing_field("rewrite", format!("#{i}"), "to"));
        }
    }
    Ok(())
}
