//! JSON metrics formatter
//!
//! Formats metrics as one compact JSON object per report for machine
//! parsing.
//!
//! # Example Output
//!
//! ```json
//! {"type":"report","elapsed_secs":60,"workers":{...},"listeners":[...],"hosts":[...]}
//! ```

use serde::Serialize;

use super::MetricsFormatter;
use crate::{CollectedMetrics, MetricsRates, PipelineSnapshot};

/// JSON metrics formatter
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Serialize)]
struct ReportJson<'a> {
    #[serde(rename = "type")]
    report_type: &'static str,
    elapsed_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    workers: Option<WorkersJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    listeners: Vec<ListenerJson<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    hosts: Vec<HostJson<'a>>,
}

#[derive(Serialize)]
struct WorkersJson {
    lines_per_sec: u64,
    routed_per_sec: u64,
    errors: u64,
    unrouted: u64,
    throttled_host: u64,
}

#[derive(Serialize)]
struct ListenerJson<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    source_type: &'a str,
    active_connections: u64,
    recs_per_sec: u64,
    bytes_per_sec: u64,
    throttled: u64,
    errors: u64,
}

#[derive(Serialize)]
struct HostJson<'a> {
    id: &'a str,
    cluster: &'a str,
    available: bool,
    recs_per_sec: u64,
    throttled: u64,
    errors: u64,
    p99_us: u64,
}

#[derive(Serialize)]
struct TotalsJson<'a> {
    #[serde(rename = "type")]
    report_type: &'static str,
    in_recs: u64,
    throttled_recs: u64,
    out_recs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    workers: Option<&'a PipelineSnapshot>,
}

impl MetricsFormatter for JsonFormatter {
    fn format_report(&self, _metrics: &CollectedMetrics, rates: Option<&MetricsRates>) -> String {
        let Some(rates) = rates else {
            return r#"{"type":"report","status":"collecting_baseline"}"#.to_string();
        };

        let json = ReportJson {
            report_type: "report",
            elapsed_secs: rates.elapsed.as_secs(),
            workers: rates.pipeline.as_ref().map(|p| WorkersJson {
                lines_per_sec: p.lines_per_sec as u64,
                routed_per_sec: p.routed_per_sec as u64,
                errors: p.errors,
                unrouted: p.unrouted,
                throttled_host: p.throttled_host,
            }),
            listeners: rates
                .sources
                .iter()
                .map(|s| ListenerJson {
                    id: &s.id,
                    source_type: &s.source_type,
                    active_connections: s.active_connections,
                    recs_per_sec: s.recs_per_sec as u64,
                    bytes_per_sec: s.bytes_per_sec as u64,
                    throttled: s.throttled,
                    errors: s.errors,
                })
                .collect(),
            hosts: rates
                .hosts
                .iter()
                .map(|h| HostJson {
                    id: &h.id,
                    cluster: &h.cluster,
                    available: h.available,
                    recs_per_sec: h.recs_per_sec as u64,
                    throttled: h.throttled,
                    errors: h.errors,
                    p99_us: h.p99_us,
                })
                .collect(),
        };

        // Compact, one log line per report
        serde_json::to_string(&json).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_totals(&self, metrics: &CollectedMetrics) -> String {
        let json = TotalsJson {
            report_type: "totals",
            in_recs: metrics.total_in(),
            throttled_recs: metrics.total_throttled(),
            out_recs: metrics.total_out(),
            workers: metrics.pipeline.as_ref(),
        };

        serde_json::to_string(&json).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{HostRates, PipelineRates, SourceRates};

    fn make_test_rates() -> MetricsRates {
        MetricsRates {
            elapsed: Duration::from_secs(60),
            pipeline: Some(PipelineRates {
                lines_per_sec: 1_200_000.0,
                routed_per_sec: 1_200_000.0,
                errors: 1,
                unrouted: 2,
                throttled_host: 0,
            }),
            sources: vec![SourceRates {
                id: "0.0.0.0:2003".into(),
                source_type: "tcp".into(),
                recs_per_sec: 1_000_000.0,
                bytes_per_sec: 40_000_000.0,
                active_connections: 5,
                throttled: 0,
                errors: 0,
            }],
            hosts: vec![HostRates {
                id: "a:2003".into(),
                cluster: "main".into(),
                recs_per_sec: 1_100_000.0,
                available: true,
                throttled: 0,
                errors: 0,
                p99_us: 800,
            }],
        }
    }

    #[test]
    fn test_format_report_with_rates() {
        let formatter = JsonFormatter::new();
        let output = formatter.format_report(&CollectedMetrics::default(), Some(&make_test_rates()));

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["type"], "report");
        assert_eq!(parsed["elapsed_secs"], 60);
        assert_eq!(parsed["workers"]["lines_per_sec"], 1_200_000);
        assert_eq!(parsed["workers"]["unrouted"], 2);
        assert_eq!(parsed["listeners"][0]["type"], "tcp");
        assert_eq!(parsed["hosts"][0]["cluster"], "main");
        assert_eq!(parsed["hosts"][0]["p99_us"], 800);
    }

    #[test]
    fn test_format_report_no_rates() {
        let formatter = JsonFormatter::new();
        let output = formatter.format_report(&CollectedMetrics::default(), None);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["status"], "collecting_baseline");
    }

    #[test]
    fn test_empty_collections_omitted() {
        let formatter = JsonFormatter::new();
        let rates = MetricsRates {
            sources: vec![],
            hosts: vec![],
            ..make_test_rates()
        };

        let output = formatter.format_report(&CollectedMetrics::default(), Some(&rates));
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert!(parsed.get("listeners").is_none());
        assert!(parsed.get("hosts").is_none());
        assert!(parsed.get("workers").is_some());
    }

    #[test]
    fn test_format_totals() {
        let formatter = JsonFormatter::new();
        let metrics = CollectedMetrics {
            pipeline: Some(PipelineSnapshot {
                blackholed_recs: 4,
                ..Default::default()
            }),
            ..Default::default()
        };

        let parsed: serde_json::Value =
            serde_json::from_str(&formatter.format_totals(&metrics)).unwrap();
        assert_eq!(parsed["type"], "totals");
        assert_eq!(parsed["in_recs"], 0);
        assert_eq!(parsed["workers"]["blackholed_recs"], 4);
    }
}
