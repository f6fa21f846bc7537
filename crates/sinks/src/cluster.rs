//! Clusters and host selection
//!
//! | type        | hosts that get a record                               |
//! |-------------|-------------------------------------------------------|
//! | `blackhole` | none; the record is counted and dropped               |
//! | `jump`      | `ring[jump(fnv1a(path), ring.len())]`, fixed ring     |
//! | `lb`        | `fnv1a(path) % available` over the hosts now up       |
//! | `toall`     | every host                                            |
//!
//! Hashing uses the path without tags, so all series of one metric land on
//! the same host.

use std::fmt;
use std::sync::Arc;

use relay_config::{ClusterConfig, ClusterType, ClustersConfig};
use relay_protocol::Record;
use relay_routing::ClusterId;

use crate::error::{HostError, Result};
use crate::hash::{fnv1a_64, jump_hash};
use crate::host::{Endpoint, Host, HostOptions, HostStreamer};
use crate::metrics::HostMetricsHandle;

/// What happened to one record handed to a cluster
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Host queues that accepted the record
    pub queued: usize,
    /// Host queues that were full or closed
    pub throttled: usize,
    /// Dropped by a blackhole cluster
    pub blackholed: bool,
}

impl Delivery {
    fn from_push(accepted: bool) -> Self {
        if accepted {
            Self {
                queued: 1,
                ..Self::default()
            }
        } else {
            Self {
                throttled: 1,
                ..Self::default()
            }
        }
    }
}

/// One named cluster
pub enum Cluster {
    Blackhole { name: String },
    Jump { name: String, hosts: Vec<Host> },
    Lb { name: String, hosts: Vec<Host> },
    ToAll { name: String, hosts: Vec<Host> },
}

impl Cluster {
    /// Build a cluster and the streamers of its hosts
    pub fn from_config(
        config: &ClusterConfig,
        options: &Arc<HostOptions>,
    ) -> Result<(Self, Vec<HostStreamer>)> {
        let name = config.name.clone();
        let cluster_type = config
            .cluster_type
            .ok_or_else(|| HostError::invalid_cluster(&name, "missing type"))?;

        if cluster_type == ClusterType::Blackhole {
            return Ok((Self::Blackhole { name }, Vec::new()));
        }

        if config.hosts.is_empty() {
            return Err(HostError::invalid_cluster(&name, "no hosts"));
        }

        let mut hosts = Vec::with_capacity(config.hosts.len());
        let mut streamers = Vec::new();
        for host in config.ordered_hosts() {
            let port = host.port_or(options.default_port);
            let endpoint = if host.grpc {
                Endpoint::grpc(&host.name, port)
            } else {
                Endpoint::plain(&host.name, port)
            };
            let (host, host_streamers) =
                Host::new(&name, endpoint, host.connections(), Arc::clone(options));
            hosts.push(host);
            streamers.extend(host_streamers);
        }

        let cluster = match cluster_type {
            ClusterType::Jump => Self::Jump { name, hosts },
            ClusterType::Lb => Self::Lb { name, hosts },
            ClusterType::Toall => Self::ToAll { name, hosts },
            ClusterType::Blackhole => Self::Blackhole { name },
        };
        Ok((cluster, streamers))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Blackhole { name }
            | Self::Jump { name, .. }
            | Self::Lb { name, .. }
            | Self::ToAll { name, .. } => name,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Blackhole { .. } => "blackhole",
            Self::Jump { .. } => "jump",
            Self::Lb { .. } => "lb",
            Self::ToAll { .. } => "toall",
        }
    }

    /// Hosts in ring order; empty for a blackhole
    pub fn hosts(&self) -> &[Host] {
        match self {
            Self::Blackhole { .. } => &[],
            Self::Jump { hosts, .. } | Self::Lb { hosts, .. } | Self::ToAll { hosts, .. } => hosts,
        }
    }

    /// Index of the host a record with `path` goes to
    ///
    /// `None` for `blackhole` and `toall`, which do not pick a single host.
    pub fn pick(&self, path: &str) -> Option<usize> {
        match self {
            Self::Jump { hosts, .. } => Some(jump_hash(fnv1a_64(path.as_bytes()), hosts.len())),
            Self::Lb { hosts, .. } => Some(pick_available(hosts, fnv1a_64(path.as_bytes()))),
            Self::Blackhole { .. } | Self::ToAll { .. } => None,
        }
    }

    /// Hand a record to the hosts this cluster selects
    pub fn push(&self, record: &Arc<Record>) -> Delivery {
        match self {
            Self::Blackhole { .. } => Delivery {
                blackholed: true,
                ..Delivery::default()
            },
            Self::Jump { hosts, .. } | Self::Lb { hosts, .. } => {
                let index = self.pick(record.path()).unwrap_or(0);
                Delivery::from_push(hosts[index].push(Arc::clone(record)))
            }
            Self::ToAll { hosts, .. } => {
                let mut delivery = Delivery::default();
                for host in hosts {
                    if host.push(Arc::clone(record)) {
                        delivery.queued += 1;
                    } else {
                        delivery.throttled += 1;
                    }
                }
                delivery
            }
        }
    }
}

impl fmt::Debug for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cluster")
            .field("name", &self.name())
            .field("type", &self.type_name())
            .field("hosts", &self.hosts())
            .finish()
    }
}

/// Pick among the hosts currently up; all hosts when none is
///
/// Availability is read once per host, so a host flipping mid-call cannot
/// skew the pick.
fn pick_available(hosts: &[Host], hash: u64) -> usize {
    if hosts.len() <= 64 {
        let mut up = 0u64;
        for (i, host) in hosts.iter().enumerate() {
            if host.is_available() {
                up |= 1u64 << i;
            }
        }
        if up == 0 {
            return (hash % hosts.len() as u64) as usize;
        }
        // Clear the lowest set bits until the chosen one is lowest
        for _ in 0..hash % u64::from(up.count_ones()) {
            up &= up - 1;
        }
        return up.trailing_zeros() as usize;
    }

    let up: Vec<usize> = hosts
        .iter()
        .enumerate()
        .filter(|(_, h)| h.is_available())
        .map(|(i, _)| i)
        .collect();
    if up.is_empty() {
        return (hash % hosts.len() as u64) as usize;
    }
    up[(hash % up.len() as u64) as usize]
}

/// All clusters, indexed by [`ClusterId`]
///
/// Ids follow declaration order in the clusters file, the same order the
/// rule engine resolves names against.
#[derive(Debug, Default)]
pub struct ClusterSet {
    clusters: Vec<Cluster>,
}

impl ClusterSet {
    /// Build every cluster; the returned streamers must be spawned
    pub fn from_config(
        config: &ClustersConfig,
        options: Arc<HostOptions>,
    ) -> Result<(Self, Vec<HostStreamer>)> {
        let mut clusters = Vec::with_capacity(config.clusters.len());
        let mut streamers = Vec::new();

        for cluster_config in &config.clusters {
            let (cluster, cluster_streamers) = Cluster::from_config(cluster_config, &options)?;
            tracing::info!(
                cluster = %cluster.name(),
                cluster_type = cluster.type_name(),
                hosts = cluster.hosts().len(),
                connections = cluster_streamers.len(),
                "cluster configured"
            );
            clusters.push(cluster);
            streamers.extend(cluster_streamers);
        }

        Ok((Self { clusters }, streamers))
    }

    /// Cluster names in id order
    pub fn names(&self) -> Vec<&str> {
        self.clusters.iter().map(Cluster::name).collect()
    }

    #[inline]
    pub fn get(&self, id: ClusterId) -> Option<&Cluster> {
        self.clusters.get(id.as_usize())
    }

    /// Hand a record to cluster `id`; an unknown id delivers nowhere
    #[inline]
    pub fn push(&self, id: ClusterId, record: &Arc<Record>) -> Delivery {
        self.get(id).map(|c| c.push(record)).unwrap_or_default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter()
    }

    /// Metrics handles for every host of every cluster
    pub fn metrics_handles(&self) -> Vec<HostMetricsHandle> {
        self.clusters
            .iter()
            .flat_map(Cluster::hosts)
            .map(Host::metrics_handle)
            .collect()
    }
}
