//! The probe loop.
//!
//! A [`Prober`] sends the same query to one server a fixed number of times,
//! classifies every reply, and finalizes the collected outcomes into a
//! [`ProbeSummary`]. Runs can be cancelled through a
//! [`CancellationToken`]; a cancelled run still reports its summary.

use crate::cli::OutputFormat;
use crate::config::ProbeSettings;
use crate::dns::query::{build_query, QuerySpec, TransportMode};
use crate::dns::transport::{NetworkTransport, Transport};
use crate::dns::types::{classify, ProbeResult, ProbeSummary, RunAccumulator, RunTarget};
use crate::error::{Error, Result};
use crate::report::Reporter;
use chrono::Utc;
use std::io::Write;
use std::net::{IpAddr, SocketAddr};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use trust_dns_resolver::proto::op::Message;

/// Repeatedly queries one server and aggregates the outcomes.
///
/// # Example
///
/// ```ignore
/// let spec = QuerySpec::new("google.com", "A", TransportMode::Udp)?;
/// let prober = Prober::new("8.8.8.8".parse()?, spec, ProbeSettings::default());
/// let summary = prober.run(30, &mut Reporter::stdout(OutputFormat::Text)).await;
/// println!("errors: {}", summary.errors);
/// ```
pub struct Prober<T: Transport = NetworkTransport> {
    transport: T,
    spec: QuerySpec,
    query: Message,
    server: SocketAddr,
    settings: ProbeSettings,
    shutdown: CancellationToken,
}

impl Prober<NetworkTransport> {
    /// Create a prober that talks to the network.
    #[must_use]
    pub fn new(server: IpAddr, spec: QuerySpec, settings: ProbeSettings) -> Self {
        Self::with_transport(NetworkTransport::new(), server, spec, settings)
    }
}

impl<T: Transport> Prober<T> {
    /// Create a prober over a custom transport.
    pub fn with_transport(
        transport: T,
        server: IpAddr,
        spec: QuerySpec,
        settings: ProbeSettings,
    ) -> Self {
        let query = build_query(&spec, &settings);
        Self {
            transport,
            spec,
            query,
            server: SocketAddr::new(server, settings.port),
            settings,
            shutdown: CancellationToken::new(),
        }
    }

    /// Stop the run when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Send the query once and classify the outcome.
    pub async fn probe_once(&self, iteration: usize) -> ProbeResult {
        let timeout = self.settings.timeout();
        let start = Instant::now();
        let sent = match self.spec.mode() {
            TransportMode::Udp => {
                self.transport
                    .send_udp(&self.query, self.server, timeout)
                    .await
            }
            TransportMode::Tcp => {
                self.transport
                    .send_tcp(&self.query, self.server, timeout)
                    .await
            }
        };

        match sent {
            Ok(response) => {
                let elapsed_ms = response.elapsed.as_secs_f64() * 1000.0;
                let classification = classify(
                    response.response_code,
                    elapsed_ms,
                    self.settings.latency_threshold_ms,
                );
                tracing::debug!(
                    "Query {iteration} to {}: {classification} in {elapsed_ms:.2} ms",
                    self.server
                );
                ProbeResult {
                    iteration,
                    classification,
                    elapsed_ms,
                    record_count: response.answers.len(),
                    answers: response.answers.iter().map(ToString::to_string).collect(),
                }
            }
            Err(Error::Timeout) => {
                tracing::debug!("Query {iteration} to {} timed out", self.server);
                ProbeResult::timeout(iteration, self.settings.timeout_ms)
            }
            Err(e) => {
                tracing::warn!("Query {iteration} to {} failed: {e}", self.server);
                ProbeResult::failed(iteration, start.elapsed().as_secs_f64() * 1000.0)
            }
        }
    }

    /// Run `iterations` probes and report them.
    ///
    /// Cancellation discards the in-flight probe and ends the loop; the
    /// summary of the completed iterations is reported either way.
    pub async fn run<W: Write>(
        &self,
        iterations: usize,
        reporter: &mut Reporter<W>,
    ) -> ProbeSummary {
        let target = RunTarget {
            server: self.server.ip().to_string(),
            domain: self.spec.domain().to_string(),
            record_type: self.spec.record_type().to_string(),
            transport: self.spec.mode(),
            requested: iterations,
            started_at: Utc::now(),
        };
        tracing::info!(
            "Probing {} over {} for {} {} ({iterations} iterations)",
            target.server,
            target.transport,
            target.domain,
            target.record_type
        );
        emit(reporter.header(
            iterations,
            &target.server,
            &target.domain,
            &target.record_type,
        ));

        let mut acc = RunAccumulator::new();
        let mut interrupted = false;
        let delay = self.settings.delay();

        for iteration in 1..=iterations {
            let result = tokio::select! {
                biased;
                () = self.shutdown.cancelled() => {
                    interrupted = true;
                    break;
                }
                result = self.probe_once(iteration) => result,
            };

            acc.record(&result);
            emit(reporter.iteration(&result, iterations));

            if iteration < iterations && !delay.is_zero() {
                tokio::select! {
                    biased;
                    () = self.shutdown.cancelled() => {
                        interrupted = true;
                        break;
                    }
                    () = tokio::time::sleep(delay) => {}
                }
            }
        }

        if interrupted {
            tracing::info!("Run interrupted after {} iterations", acc.completed());
            emit(reporter.interrupted());
        }

        let summary = acc.finalize(target, interrupted);
        tracing::info!(
            "Run finished: {} of {} iterations, {} errors",
            summary.completed,
            summary.requested,
            summary.errors
        );
        emit(reporter.summary(&summary));
        summary
    }
}

/// Report write failures are logged and otherwise ignored.
fn emit(written: Result<()>) {
    if let Err(e) = written {
        tracing::warn!("Failed to write report: {e}");
    }
}

/// Probe `server` with default settings and print text output to stdout.
///
/// Returns the number of errored iterations; 0 means the server was
/// healthy for the whole run.
///
/// # Errors
///
/// Returns `Error::UnknownRecordType` or `Error::InvalidDomain` before any
/// query is sent.
pub async fn run(
    server: IpAddr,
    domain: &str,
    record_type: &str,
    mode: TransportMode,
    iterations: usize,
) -> Result<usize> {
    let spec = QuerySpec::new(domain, record_type, mode)?;
    let prober = Prober::new(server, spec, ProbeSettings::default());
    let summary = prober
        .run(iterations, &mut Reporter::stdout(OutputFormat::Text))
        .await;
    Ok(summary.errors)
}
