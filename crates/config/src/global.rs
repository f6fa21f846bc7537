//! Global configuration settings
//!
//! Queue sizes, worker count and process-wide behavior.

use serde::Deserialize;
use std::time::Duration;

/// Global configuration that applies to all components
///
/// All fields have sensible defaults - you only need to specify what you want to change.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Number of workers draining the main queue
    /// Default: number of CPU cores
    pub workers: usize,

    /// Capacity of the main queue (lines)
    /// Default: 10000
    pub main_queue_size: usize,

    /// Capacity of each host queue (records)
    /// Default: 1000
    pub host_queue_size: usize,

    /// Normalize record paths before routing
    /// Default: true
    pub normalize_records: bool,

    /// Log records with fractional timestamps (sampled)
    /// Default: true
    pub log_special_records: bool,

    /// Upper bound for the whole shutdown sequence
    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub term_timeout: Duration,

    /// Port of the external profiling endpoint, if any
    pub pprof_port: Option<u16>,

    /// Port of the external metrics endpoint, if any
    pub prom_port: Option<u16>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus(),
            main_queue_size: 10_000,
            host_queue_size: 1_000,
            normalize_records: true,
            log_special_records: true,
            term_timeout: Duration::from_secs(10),
            pprof_port: None,
            prom_port: None,
        }
    }
}

/// Get the number of available CPUs, defaulting to 4 if detection fails
fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GlobalConfig::default();
        assert!(config.workers > 0);
        assert_eq!(config.main_queue_size, 10_000);
        assert_eq!(config.host_queue_size, 1_000);
        assert!(config.normalize_records);
        assert_eq!(config.term_timeout, Duration::from_secs(10));
        assert_eq!(config.pprof_port, None);
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
workers = 2
term_timeout = "30s"
"#;
        let config: GlobalConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config.term_timeout, Duration::from_secs(30));
        // Defaults still apply
        assert_eq!(config.main_queue_size, 10_000);
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
workers = 8
main_queue_size = 500
host_queue_size = 50
normalize_records = false
log_special_records = false
term_timeout = "1m"
pprof_port = 6060
prom_port = 9090
"#;
        let config: GlobalConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.workers, 8);
        assert_eq!(config.main_queue_size, 500);
        assert_eq!(config.host_queue_size, 50);
        assert!(!config.normalize_records);
        assert!(!config.log_special_records);
        assert_eq!(config.term_timeout, Duration::from_secs(60));
        assert_eq!(config.pprof_port, Some(6060));
        assert_eq!(config.prom_port, Some(9090));
    }
}
