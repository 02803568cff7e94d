//! dnsck - repeated DNS queries for resolver health checks.
//!
//! This crate provides both a library API and a CLI tool that:
//! - Sends the same query to one server a number of times over UDP or TCP
//! - Classifies every reply by response code and latency
//! - Reports a response code breakdown, the error rate and the mean latency
//!
//! # Library Usage
//!
//! ```ignore
//! use dnsck::{OutputFormat, Prober, ProbeSettings, QuerySpec, Reporter, TransportMode};
//!
//! let spec = QuerySpec::new("google.com", "AAAA", TransportMode::Tcp)?;
//! let prober = Prober::new("8.8.8.8".parse()?, spec, ProbeSettings::default());
//! let summary = prober.run(10, &mut Reporter::stdout(OutputFormat::Text)).await;
//! assert_eq!(summary.errors, 0);
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # 30 UDP queries for the A record of google.com against 8.8.8.8
//! dnsck google.com
//!
//! # 5 TCP queries for TXT records against a custom server, no pause
//! dnsck -s 1.1.1.1 -t txt -i 5 --tcp --nosleep example.com
//!
//! # JSON summary
//! dnsck --format json google.com
//! ```
//!
//! A reply slower than the latency threshold (500 ms by default) is counted
//! as `Degraded`, and a query without a reply within the timeout (10 s by
//! default) as `Timeout`. Both count as errors.

pub mod cli;
pub mod config;
pub mod dns;
pub mod error;
pub mod report;

// Re-export commonly used types
pub use cli::{Cli, OutputFormat};
pub use config::{ConfigLoader, ProbeSettings};
pub use dns::probe::run;
pub use dns::types::{classify, Classification, ProbeResult, ProbeSummary, RunAccumulator};
pub use dns::{NetworkTransport, Prober, QuerySpec, Transport, TransportMode};
pub use error::{Error, Result};
pub use report::Reporter;
