//! Probe outcome types and run statistics.
//!
//! This module provides the per-iteration classification, the accumulator
//! that collects a run's outcomes, and the summary it is finalized into.

use crate::dns::query::TransportMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use trust_dns_resolver::proto::op::ResponseCode;

/// Outcome label of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Timely reply; carries the server's response code
    Response(ResponseCode),
    /// Reply arrived but at or above the latency threshold
    Degraded,
    /// No reply within the query timeout
    Timeout,
    /// Transport failure other than a timeout
    Failed,
}

impl Classification {
    /// Check if the outcome counts against the server.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Degraded | Self::Timeout | Self::Failed)
    }

    /// Text used in reports and as the histogram key.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Response(code) => response_code_text(*code),
            Self::Degraded => "Degraded".to_string(),
            Self::Timeout => "Timeout".to_string(),
            Self::Failed => "Failed".to_string(),
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

/// Classify a reply by its latency.
///
/// Replies faster than `threshold_ms` keep their response code; anything
/// slower is `Degraded` whatever the server answered.
#[must_use]
pub fn classify(code: ResponseCode, elapsed_ms: f64, threshold_ms: u64) -> Classification {
    if elapsed_ms < threshold_ms as f64 {
        Classification::Response(code)
    } else {
        Classification::Degraded
    }
}

/// Protocol mnemonic for a response code, e.g. `NOERROR` or `NXDOMAIN`.
#[must_use]
pub fn response_code_text(code: ResponseCode) -> String {
    let text = match code {
        ResponseCode::NoError => "NOERROR",
        ResponseCode::FormErr => "FORMERR",
        ResponseCode::ServFail => "SERVFAIL",
        ResponseCode::NXDomain => "NXDOMAIN",
        ResponseCode::NotImp => "NOTIMP",
        ResponseCode::Refused => "REFUSED",
        ResponseCode::YXDomain => "YXDOMAIN",
        ResponseCode::YXRRSet => "YXRRSET",
        ResponseCode::NXRRSet => "NXRRSET",
        ResponseCode::NotAuth => "NOTAUTH",
        ResponseCode::NotZone => "NOTZONE",
        other => return format!("RCODE{}", u16::from(other)),
    };
    text.to_string()
}

/// Result of one completed iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    /// 1-based iteration number
    pub iteration: usize,
    pub classification: Classification,
    /// Latency in milliseconds; the timeout ceiling for timeouts
    pub elapsed_ms: f64,
    /// Number of answer records (0 when none or no reply)
    pub record_count: usize,
    /// Answer records rendered as zone-file lines
    pub answers: Vec<String>,
}

impl ProbeResult {
    /// Create a result for a timed out query.
    #[must_use]
    pub fn timeout(iteration: usize, timeout_ms: u64) -> Self {
        Self {
            iteration,
            classification: Classification::Timeout,
            elapsed_ms: timeout_ms as f64,
            record_count: 0,
            answers: Vec::new(),
        }
    }

    /// Create a result for a transport failure.
    #[must_use]
    pub fn failed(iteration: usize, elapsed_ms: f64) -> Self {
        Self {
            iteration,
            classification: Classification::Failed,
            elapsed_ms,
            record_count: 0,
            answers: Vec::new(),
        }
    }
}

/// Outcomes collected during a single run.
///
/// After every [`record`](Self::record) the histogram total, the completed
/// count and the latency series length are equal.
#[derive(Debug, Clone, Default)]
pub struct RunAccumulator {
    histogram: BTreeMap<String, usize>,
    latencies: Vec<f64>,
    completed: usize,
    errors: usize,
}

impl RunAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a completed iteration.
    pub fn record(&mut self, result: &ProbeResult) {
        *self
            .histogram
            .entry(result.classification.label())
            .or_insert(0) += 1;
        self.latencies.push(result.elapsed_ms);
        self.completed += 1;
        if result.classification.is_error() {
            self.errors += 1;
        }
    }

    #[must_use]
    pub fn histogram(&self) -> &BTreeMap<String, usize> {
        &self.histogram
    }

    #[must_use]
    pub fn latencies(&self) -> &[f64] {
        &self.latencies
    }

    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed
    }

    #[must_use]
    pub fn errors(&self) -> usize {
        self.errors
    }

    /// Error rate as a percentage, `None` before any iteration completed.
    #[must_use]
    pub fn error_rate(&self) -> Option<f64> {
        if self.completed == 0 {
            None
        } else {
            Some(self.errors as f64 / self.completed as f64 * 100.0)
        }
    }

    /// Mean latency in milliseconds, `None` before any iteration completed.
    #[must_use]
    pub fn avg_latency(&self) -> Option<f64> {
        if self.latencies.is_empty() {
            None
        } else {
            Some(self.latencies.iter().sum::<f64>() / self.latencies.len() as f64)
        }
    }

    #[must_use]
    pub fn min_latency(&self) -> Option<f64> {
        self.latencies.iter().copied().reduce(f64::min)
    }

    #[must_use]
    pub fn max_latency(&self) -> Option<f64> {
        self.latencies.iter().copied().reduce(f64::max)
    }

    /// Consume the accumulator into the run summary.
    #[must_use]
    pub fn finalize(self, target: RunTarget, interrupted: bool) -> ProbeSummary {
        ProbeSummary {
            error_rate: self.error_rate().map(round2),
            avg_latency_ms: self.avg_latency().map(round2),
            min_latency_ms: self.min_latency().map(round2),
            max_latency_ms: self.max_latency().map(round2),
            server: target.server,
            domain: target.domain,
            record_type: target.record_type,
            transport: target.transport,
            requested: target.requested,
            completed: self.completed,
            errors: self.errors,
            interrupted,
            histogram: self.histogram,
            started_at: target.started_at,
            finished_at: Utc::now(),
        }
    }
}

/// Round to the two decimals the reports show.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// What a run probed, carried into its summary.
#[derive(Debug, Clone)]
pub struct RunTarget {
    pub server: String,
    pub domain: String,
    pub record_type: String,
    pub transport: TransportMode,
    pub requested: usize,
    pub started_at: DateTime<Utc>,
}

/// Final statistics of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeSummary {
    pub server: String,
    pub domain: String,
    pub record_type: String,
    pub transport: TransportMode,
    /// Iterations asked for
    pub requested: usize,
    /// Iterations that finished before the run ended
    pub completed: usize,
    /// Degraded, timed out and failed iterations
    pub errors: usize,
    /// Whether the run was cancelled early
    pub interrupted: bool,
    /// Count per classification label, sorted by label
    pub histogram: BTreeMap<String, usize>,
    /// Error percentage
    pub error_rate: Option<f64>,
    pub avg_latency_ms: Option<f64>,
    pub min_latency_ms: Option<f64>,
    pub max_latency_ms: Option<f64>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ProbeSummary {
    /// Check if every completed iteration was healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.errors == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(iteration: usize, elapsed_ms: f64) -> ProbeResult {
        ProbeResult {
            iteration,
            classification: classify(ResponseCode::NoError, elapsed_ms, 500),
            elapsed_ms,
            record_count: 1,
            answers: vec![],
        }
    }

    fn target() -> RunTarget {
        RunTarget {
            server: "8.8.8.8".into(),
            domain: "google.com".into(),
            record_type: "A".into(),
            transport: TransportMode::Udp,
            requested: 3,
            started_at: Utc::now(),
        }
    }

    #[test]
    fn test_classify_table() {
        let cases = [
            (ResponseCode::NoError, 0.0, Classification::Response(ResponseCode::NoError)),
            (ResponseCode::NoError, 499.99, Classification::Response(ResponseCode::NoError)),
            (ResponseCode::NoError, 500.0, Classification::Degraded),
            (ResponseCode::NXDomain, 12.5, Classification::Response(ResponseCode::NXDomain)),
            (ResponseCode::NXDomain, 750.0, Classification::Degraded),
            (ResponseCode::ServFail, 9_999.0, Classification::Degraded),
        ];
        for (code, elapsed, expected) in cases {
            assert_eq!(classify(code, elapsed, 500), expected, "{code:?} at {elapsed}ms");
        }
    }

    #[test]
    fn test_classify_custom_threshold() {
        assert_eq!(classify(ResponseCode::NoError, 150.0, 100), Classification::Degraded);
        assert_eq!(
            classify(ResponseCode::NoError, 150.0, 200),
            Classification::Response(ResponseCode::NoError)
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(Classification::Response(ResponseCode::NoError).label(), "NOERROR");
        assert_eq!(Classification::Response(ResponseCode::NXDomain).label(), "NXDOMAIN");
        assert_eq!(Classification::Response(ResponseCode::Refused).label(), "REFUSED");
        assert_eq!(Classification::Degraded.to_string(), "Degraded");
        assert_eq!(Classification::Timeout.to_string(), "Timeout");
    }

    #[test]
    fn test_is_error() {
        assert!(!Classification::Response(ResponseCode::ServFail).is_error());
        assert!(Classification::Degraded.is_error());
        assert!(Classification::Timeout.is_error());
        assert!(Classification::Failed.is_error());
    }

    #[test]
    fn test_accumulator_invariant() {
        let mut acc = RunAccumulator::new();
        let results = [ok(1, 20.0), ok(2, 600.0), ProbeResult::timeout(3, 10_000), ok(4, 30.0)];
        for result in &results {
            acc.record(result);
            let total: usize = acc.histogram().values().sum();
            assert_eq!(total, acc.completed());
            assert_eq!(acc.latencies().len(), acc.completed());
        }
        assert_eq!(acc.completed(), 4);
        assert_eq!(acc.errors(), 2);
        assert_eq!(acc.histogram().get("NOERROR"), Some(&2));
        assert_eq!(acc.histogram().get("Degraded"), Some(&1));
        assert_eq!(acc.histogram().get("Timeout"), Some(&1));
    }

    #[test]
    fn test_timeout_pins_latency() {
        let mut acc = RunAccumulator::new();
        acc.record(&ProbeResult::timeout(1, 10_000));
        assert_eq!(acc.latencies(), &[10_000.0]);
        assert_eq!(acc.errors(), 1);
    }

    #[test]
    fn test_error_rate_and_average() {
        let mut acc = RunAccumulator::new();
        acc.record(&ok(1, 10.0));
        acc.record(&ok(2, 20.0));
        acc.record(&ProbeResult::timeout(3, 10_000));

        assert_eq!(format!("{:.2}", acc.error_rate().unwrap()), "33.33");
        assert_eq!(format!("{:.2}", acc.avg_latency().unwrap()), "3343.33");
        assert_eq!(acc.min_latency(), Some(10.0));
        assert_eq!(acc.max_latency(), Some(10_000.0));
    }

    #[test]
    fn test_empty_accumulator() {
        let acc = RunAccumulator::new();
        assert!(acc.error_rate().is_none());
        assert!(acc.avg_latency().is_none());
        assert!(acc.min_latency().is_none());

        let summary = acc.finalize(target(), true);
        assert_eq!(summary.completed, 0);
        assert!(summary.histogram.is_empty());
        assert!(summary.interrupted);
        assert!(summary.is_healthy());
    }

    #[test]
    fn test_finalize() {
        let mut acc = RunAccumulator::new();
        acc.record(&ok(1, 10.0));
        acc.record(&ok(2, 30.0));

        let summary = acc.finalize(target(), false);
        assert_eq!(summary.requested, 3);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.errors, 0);
        assert_eq!(summary.error_rate, Some(0.0));
        assert_eq!(summary.avg_latency_ms, Some(20.0));
        assert!(summary.finished_at >= summary.started_at);

        let json = serde_json::to_string(&summary).unwrap();
        let back: ProbeSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, summary);
    }

    #[test]
    fn test_summary_rounds_to_two_decimals() {
        let mut acc = RunAccumulator::new();
        acc.record(&ok(1, 10.004));
        acc.record(&ok(2, 20.0));
        acc.record(&ProbeResult::timeout(3, 10_000));

        let summary = acc.finalize(target(), false);
        assert_eq!(summary.error_rate, Some(33.33));
        assert_eq!(summary.avg_latency_ms, Some(3343.33));
        assert_eq!(summary.min_latency_ms, Some(10.0));

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"error_rate\":33.33,"));
        assert!(!json.contains("33.333"));
    }
}
