//! The four configuration documents, loaded and cross-checked together

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use relay_config::{ClustersConfig, Config, RewritesConfig, RulesConfig, validate_rules_against};
use relay_routing::Rules;
use relay_sinks::{ClusterSet, HostOptions};
use relay_transform::Rewriter;

/// Main config, clusters, rules and optional rewrites
#[derive(Debug, Clone, Default)]
pub struct Configs {
    pub main: Config,
    pub clusters: ClustersConfig,
    pub rules: RulesConfig,
    pub rewrites: RewritesConfig,
}

impl Configs {
    /// Read and validate every file
    ///
    /// Each document is validated while parsing; rules are then checked
    /// against the declared cluster names.
    pub fn load(
        config: &Path,
        clusters: &Path,
        rules: &Path,
        rewrites: Option<&Path>,
    ) -> Result<Self> {
        let main = Config::from_file(config)
            .with_context(|| format!("failed to load config {}", config.display()))?;
        let clusters_config = ClustersConfig::from_file(clusters)
            .with_context(|| format!("failed to load clusters {}", clusters.display()))?;
        let rules_config = RulesConfig::from_file(rules)
            .with_context(|| format!("failed to load rules {}", rules.display()))?;
        let rewrites_config = match rewrites {
            Some(path) => RewritesConfig::from_file(path)
                .with_context(|| format!("failed to load rewrites {}", path.display()))?,
            None => RewritesConfig::default(),
        };

        validate_rules_against(&rules_config, &clusters_config)
            .context("rules reference an unknown cluster")?;

        Ok(Self {
            main,
            clusters: clusters_config,
            rules: rules_config,
            rewrites: rewrites_config,
        })
    }

    /// Host sender tuning from `[sender]` and `[global]`
    pub fn host_options(&self) -> HostOptions {
        HostOptions::from_config(&self.main.sender, self.main.global.host_queue_size)
            .with_sample_interval(self.main.log.error_sample_interval)
    }

    /// Compile clusters, rules and rewrites without starting anything
    ///
    /// Surfaces regex compile errors that parsing alone does not catch.
    pub fn check(&self) -> Result<()> {
        let (clusters, _streamers) =
            ClusterSet::from_config(&self.clusters, Arc::new(self.host_options()))
                .context("invalid clusters")?;
        Rules::from_config(&self.rules, &clusters.names()).context("invalid rules")?;
        Rewriter::from_config(&self.rewrites).context("invalid rewrites")?;
        Ok(())
    }
}
