//! Ordered rule engine
//!
//! Rules are compiled once at startup. For each record the engine walks the
//! rules in declared order:
//!
//! - a rule matches if any of its regexes matches the path, or any of its
//!   prefixes is a prefix of the path
//! - on a match the record is handed to each target cluster not already
//!   served during this invocation
//! - `continue = false` stops evaluation after the first match
//!
//! Records no rule matches are left alone; the caller counts them.

use regex::RegexSet;
use relay_config::RulesConfig;

use crate::ClusterId;
use crate::error::{Result, RoutingError};
use crate::trie::PrefixTrie;

/// One compiled rule
#[derive(Debug, Clone)]
pub struct Rule {
    regexes: RegexSet,
    prefixes: PrefixTrie,
    targets: Vec<ClusterId>,
    continue_matching: bool,
}

impl Rule {
    /// Whether this rule matches `path`
    #[inline]
    pub fn matches(&self, path: &str) -> bool {
        self.prefixes.matches(path.as_bytes()) || self.regexes.is_match(path)
    }

    /// Target clusters in declared order
    #[inline]
    pub fn targets(&self) -> &[ClusterId] {
        &self.targets
    }

    #[inline]
    pub fn continue_matching(&self) -> bool {
        self.continue_matching
    }
}

/// Clusters already served for one record
///
/// Fits in a register for up to 128 clusters, which covers real deployments;
/// larger sets fall back to a heap bitmap.
enum Seen {
    Small(u128),
    Large(Vec<bool>),
}

impl Seen {
    #[inline]
    fn for_clusters(count: usize) -> Self {
        if count <= 128 {
            Self::Small(0)
        } else {
            Self::Large(vec![false; count])
        }
    }

    /// Mark `id`, returning true if it was not marked yet
    #[inline]
    fn insert(&mut self, id: ClusterId) -> bool {
        match self {
            Self::Small(bits) => {
                let mask = 1u128 << id.as_usize();
                let fresh = *bits & mask == 0;
                *bits |= mask;
                fresh
            }
            Self::Large(flags) => !std::mem::replace(&mut flags[id.as_usize()], true),
        }
    }
}

/// Compiled, ordered rule list
///
/// Immutable after construction and shared by all workers.
#[derive(Debug, Clone)]
pub struct Rules {
    rules: Vec<Rule>,
    /// Cluster names indexed by `ClusterId`
    cluster_names: Vec<String>,
}

impl Rules {
    /// Builder for assembling rules by hand (tests, tools)
    pub fn builder<S: AsRef<str>>(cluster_names: &[S]) -> RulesBuilder {
        RulesBuilder::new(cluster_names)
    }

    /// Compile a rules file against the cluster set
    ///
    /// `cluster_names` fixes the `ClusterId` of each cluster: the id is the
    /// name's position in the slice.
    pub fn from_config<S: AsRef<str>>(config: &RulesConfig, cluster_names: &[S]) -> Result<Self> {
        let mut builder = RulesBuilder::new(cluster_names);
        for rule in &config.rules {
            builder = builder.rule(&rule.regexs, &rule.prefixes, &rule.clusters, rule.continue_matching);
        }
        builder.build()
    }

    /// Number of rules
    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of clusters rules may target
    #[inline]
    pub fn cluster_count(&self) -> usize {
        self.cluster_names.len()
    }

    /// Name of a cluster, for logs
    pub fn cluster_name(&self, id: ClusterId) -> Option<&str> {
        self.cluster_names.get(id.as_usize()).map(String::as_str)
    }

    /// Rules in evaluation order
    #[inline]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Route one path, calling `push` once per distinct target cluster
    ///
    /// Returns the number of clusters the record was handed to; 0 means no
    /// rule matched.
    pub fn route(&self, path: &str, mut push: impl FnMut(ClusterId)) -> usize {
        let mut seen = Seen::for_clusters(self.cluster_names.len());
        let mut pushed = 0;

        for rule in &self.rules {
            if !rule.matches(path) {
                continue;
            }

            for &target in &rule.targets {
                if seen.insert(target) {
                    push(target);
                    pushed += 1;
                }
            }

            if !rule.continue_matching {
                break;
            }
        }

        pushed
    }

    /// Distinct target clusters for `path`, in push order
    pub fn targets_for(&self, path: &str) -> Vec<ClusterId> {
        let mut targets = Vec::new();
        self.route(path, |id| targets.push(id));
        targets
    }
}

/// Builder for [`Rules`]
///
/// Collects rule definitions and compiles them in `build()`, reporting the
/// first invalid pattern or unknown cluster.
pub struct RulesBuilder {
    cluster_names: Vec<String>,
    pending: Vec<PendingRule>,
}

struct PendingRule {
    regexes: Vec<String>,
    prefixes: Vec<String>,
    clusters: Vec<String>,
    continue_matching: bool,
}

impl RulesBuilder {
    fn new<S: AsRef<str>>(cluster_names: &[S]) -> Self {
        Self {
            cluster_names: cluster_names.iter().map(|s| s.as_ref().to_owned()).collect(),
            pending: Vec::new(),
        }
    }

    /// Append a rule
    pub fn rule<R, P, C>(mut self, regexes: &[R], prefixes: &[P], clusters: &[C], continue_matching: bool) -> Self
    where
        R: AsRef<str>,
        P: AsRef<str>,
        C: AsRef<str>,
    {
        self.pending.push(PendingRule {
            regexes: regexes.iter().map(|s| s.as_ref().to_owned()).collect(),
            prefixes: prefixes.iter().map(|s| s.as_ref().to_owned()).collect(),
            clusters: clusters.iter().map(|s| s.as_ref().to_owned()).collect(),
            continue_matching,
        });
        self
    }

    /// Compile all rules
    pub fn build(self) -> Result<Rules> {
        if self.cluster_names.len() > ClusterId::MAX as usize {
            return Err(RoutingError::TooManyClusters(self.cluster_names.len()));
        }

        let mut rules = Vec::with_capacity(self.pending.len());

        for (index, pending) in self.pending.into_iter().enumerate() {
            if pending.regexes.is_empty() && pending.prefixes.is_empty() {
                return Err(RoutingError::EmptyMatch { rule: index });
            }
            if pending.clusters.is_empty() {
                return Err(RoutingError::EmptyTargets { rule: index });
            }

            // Compile one by one first so the error names the bad pattern
            for pattern in &pending.regexes {
                regex::Regex::new(pattern)
                    .map_err(|e| RoutingError::invalid_regex(index, pattern, e))?;
            }
            let regexes = RegexSet::new(&pending.regexes)
                .map_err(|e| RoutingError::invalid_regex(index, pending.regexes.join(" | "), e))?;

            let mut targets = Vec::with_capacity(pending.clusters.len());
            for name in &pending.clusters {
                let position = self
                    .cluster_names
                    .iter()
                    .position(|c| c == name)
                    .ok_or_else(|| RoutingError::unknown_cluster(index, name))?;
                targets.push(ClusterId::new(position as u16));
            }

            rules.push(Rule {
                regexes,
                prefixes: PrefixTrie::from_prefixes(&pending.prefixes),
                targets,
                continue_matching: pending.continue_matching,
            });
        }

        tracing::debug!(
            rules = rules.len(),
            clusters = self.cluster_names.len(),
            "rule engine compiled"
        );

        Ok(Rules {
            rules,
            cluster_names: self.cluster_names,
        })
    }
}
