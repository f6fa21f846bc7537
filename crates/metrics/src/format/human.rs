//! Human-readable metrics formatter
//!
//! # Example Output
//!
//! ```text
//! [metrics] workers: 1.2M/s in | 2.4M/s routed | err: 3 | unrouted: 0 | host drops: 0
//! [metrics] listeners: tcp 0.0.0.0:2003 (5 conn, 1.2M/s) | udp 0.0.0.0:2003 (12.0K/s, 4 throttled)
//! [metrics] hosts: main/a:2003 (600.0K/s, p99 1.2ms) | main/b:2003 (down, 12 err)
//! ```

use std::fmt::Write;

use super::{MetricsFormatter, format_bytes_per_sec, format_count, format_micros, format_rate};
use crate::{CollectedMetrics, MetricsRates};

/// Human-readable metrics formatter
#[derive(Debug, Clone, Default)]
pub struct HumanFormatter;

impl HumanFormatter {
    pub fn new() -> Self {
        Self
    }

    fn format_pipeline(&self, rates: &MetricsRates) -> Option<String> {
        let pipeline = rates.pipeline.as_ref()?;

        Some(format!(
            "[metrics] workers: {} in | {} routed | err: {} | unrouted: {} | host drops: {}",
            format_rate(pipeline.lines_per_sec),
            format_rate(pipeline.routed_per_sec),
            pipeline.errors,
            pipeline.unrouted,
            pipeline.throttled_host,
        ))
    }

    fn format_sources(&self, rates: &MetricsRates) -> Option<String> {
        if rates.sources.is_empty() {
            return None;
        }

        let mut output = String::from("[metrics] listeners:");

        for (i, source) in rates.sources.iter().enumerate() {
            if i > 0 {
                output.push_str(" |");
            }

            let _ = write!(output, " {} {} (", source.source_type, source.id);
            if source.source_type != "udp" {
                let _ = write!(output, "{} conn, ", source.active_connections);
            }
            let _ = write!(
                output,
                "{}, {}",
                format_rate(source.recs_per_sec),
                format_bytes_per_sec(source.bytes_per_sec)
            );

            if source.throttled > 0 {
                let _ = write!(output, ", {} throttled", source.throttled);
            }
            if source.errors > 0 {
                let _ = write!(output, ", {} err", source.errors);
            }

            output.push(')');
        }

        Some(output)
    }

    fn format_hosts(&self, rates: &MetricsRates) -> Option<String> {
        if rates.hosts.is_empty() {
            return None;
        }

        let mut output = String::from("[metrics] hosts:");

        for (i, host) in rates.hosts.iter().enumerate() {
            if i > 0 {
                output.push_str(" |");
            }

            let _ = write!(output, " {}/{} (", host.cluster, host.id);
            if host.available {
                let _ = write!(
                    output,
                    "{}, p99 {}",
                    format_rate(host.recs_per_sec),
                    format_micros(host.p99_us)
                );
            } else {
                output.push_str("down");
            }

            if host.throttled > 0 {
                let _ = write!(output, ", {} throttled", host.throttled);
            }
            if host.errors > 0 {
                let _ = write!(output, ", {} err", host.errors);
            }

            output.push(')');
        }

        Some(output)
    }
}

impl MetricsFormatter for HumanFormatter {
    fn format_report(&self, _metrics: &CollectedMetrics, rates: Option<&MetricsRates>) -> String {
        let Some(rates) = rates else {
            return "[metrics] collecting baseline...".to_string();
        };

        let lines: Vec<String> = [
            self.format_pipeline(rates),
            self.format_sources(rates),
            self.format_hosts(rates),
        ]
        .into_iter()
        .flatten()
        .collect();

        if lines.is_empty() {
            "[metrics] no activity".to_string()
        } else {
            lines.join("\n")
        }
    }

    fn format_totals(&self, metrics: &CollectedMetrics) -> String {
        let mut output = format!(
            "[totals] in: {} | throttled: {} | out: {}",
            format_count(metrics.total_in()),
            format_count(metrics.total_throttled()),
            format_count(metrics.total_out()),
        );

        if let Some(pipeline) = &metrics.pipeline {
            let _ = write!(
                output,
                " | errors: {} | special: {} | unrouted: {} | blackholed: {} | host drops: {}",
                pipeline.error_recs,
                pipeline.special_recs,
                pipeline.unrouted_recs,
                pipeline.blackholed_recs,
                pipeline.throttled_host,
            );
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        CollectedSource, HostRates, PipelineRates, PipelineSnapshot, SourceMetricsSnapshot,
        SourceRates,
    };

    fn make_test_rates() -> MetricsRates {
        MetricsRates {
            elapsed: Duration::from_secs(10),
            pipeline: Some(PipelineRates {
                lines_per_sec: 1_200_000.0,
                routed_per_sec: 2_400_000.0,
                errors: 3,
                unrouted: 0,
                throttled_host: 0,
            }),
            sources: vec![
                SourceRates {
                    id: "0.0.0.0:2003".into(),
                    source_type: "tcp".into(),
                    recs_per_sec: 1_200_000.0,
                    bytes_per_sec: 40_000_000.0,
                    active_connections: 5,
                    throttled: 0,
                    errors: 0,
                },
                SourceRates {
                    id: "0.0.0.0:2003".into(),
                    source_type: "udp".into(),
                    recs_per_sec: 12_000.0,
                    bytes_per_sec: 400_000.0,
                    active_connections: 0,
                    throttled: 4,
                    errors: 0,
                },
            ],
            hosts: vec![
                HostRates {
                    id: "a:2003".into(),
                    cluster: "main".into(),
                    recs_per_sec: 600_000.0,
                    available: true,
                    throttled: 0,
                    errors: 0,
                    p99_us: 1_200,
                },
                HostRates {
                    id: "b:2003".into(),
                    cluster: "main".into(),
                    recs_per_sec: 0.0,
                    available: false,
                    throttled: 0,
                    errors: 12,
                    p99_us: 0,
                },
            ],
        }
    }

    #[test]
    fn test_format_report_with_rates() {
        let formatter = HumanFormatter::new();
        let output = formatter.format_report(&CollectedMetrics::default(), Some(&make_test_rates()));

        assert!(output.contains("[metrics] workers: 1.2M/s in | 2.4M/s routed | err: 3"));
        assert!(output.contains("tcp 0.0.0.0:2003 (5 conn, 1.2M/s"));
        assert!(output.contains("udp 0.0.0.0:2003 (12.0K/s"));
        assert!(output.contains("4 throttled"));
        assert!(output.contains("main/a:2003 (600.0K/s, p99 1.2ms)"));
        assert!(output.contains("main/b:2003 (down, 12 err)"));
        assert_eq!(output.lines().count(), 3);
    }

    #[test]
    fn test_format_report_no_rates() {
        let formatter = HumanFormatter::new();
        let output = formatter.format_report(&CollectedMetrics::default(), None);
        assert!(output.contains("collecting baseline"));
    }

    #[test]
    fn test_format_report_empty() {
        let formatter = HumanFormatter::new();
        let rates = MetricsRates {
            elapsed: Duration::from_secs(1),
            pipeline: None,
            sources: vec![],
            hosts: vec![],
        };
        let output = formatter.format_report(&CollectedMetrics::default(), Some(&rates));
        assert_eq!(output, "[metrics] no activity");
    }

    #[test]
    fn test_format_totals() {
        let formatter = HumanFormatter::new();
        let metrics = CollectedMetrics {
            pipeline: Some(PipelineSnapshot {
                error_recs: 2,
                blackholed_recs: 10,
                ..Default::default()
            }),
            sources: vec![CollectedSource {
                id: "tcp".into(),
                source_type: "tcp".into(),
                snapshot: SourceMetricsSnapshot {
                    in_recs: 1500,
                    ..Default::default()
                },
            }],
            ..Default::default()
        };

        let output = formatter.format_totals(&metrics);
        assert!(output.starts_with("[totals] in: 1.5K | throttled: 0 | out: 0"));
        assert!(output.contains("errors: 2"));
        assert!(output.contains("blackholed: 10"));
    }
}
