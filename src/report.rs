//! Console rendering of probe progress and summaries.
//!
//! Text output prints every iteration as it completes followed by the
//! summary block. JSON output stays silent until the run ends and then
//! prints the summary as one document.

use crate::cli::OutputFormat;
use crate::dns::types::{Classification, ProbeResult, ProbeSummary};
use crate::error::Result;
use std::io::Write;

/// Placeholder for statistics of a run with no completed iterations.
const NO_DATA: &str = "no data";

/// Writes run output in the selected format.
pub struct Reporter<W: Write> {
    out: W,
    format: OutputFormat,
}

impl Reporter<std::io::Stdout> {
    /// Reporter writing to standard output.
    #[must_use]
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(std::io::stdout(), format)
    }
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self { out, format }
    }

    /// Consume the reporter and return the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Announce the run.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn header(
        &mut self,
        iterations: usize,
        server: &str,
        domain: &str,
        record_type: &str,
    ) -> Result<()> {
        if self.format == OutputFormat::Text {
            writeln!(
                self.out,
                "Performing {iterations} queries to server {server} for domain {domain} with record type {record_type}.\n"
            )?;
        }
        Ok(())
    }

    /// Print one completed iteration.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn iteration(&mut self, result: &ProbeResult, total: usize) -> Result<()> {
        if self.format != OutputFormat::Text {
            return Ok(());
        }

        writeln!(self.out, "[Query {} of {}]", result.iteration, total)?;
        match result.classification {
            Classification::Timeout => writeln!(self.out, "Query timeout.")?,
            Classification::Failed => writeln!(self.out, "Query failed.")?,
            _ if result.answers.is_empty() => writeln!(self.out, "No records returned.")?,
            _ => {
                for answer in &result.answers {
                    writeln!(self.out, "{answer}")?;
                }
            }
        }
        writeln!(self.out, "Records returned: {}", result.record_count)?;
        writeln!(self.out, "Response time: {:.2} ms", result.elapsed_ms)?;
        writeln!(self.out, "Response status: {}\n", result.classification)?;
        self.out.flush()?;
        Ok(())
    }

    /// Note that the run was cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn interrupted(&mut self) -> Result<()> {
        if self.format == OutputFormat::Text {
            writeln!(self.out, "Program terminating...")?;
        }
        Ok(())
    }

    /// Print the final statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer or JSON serialization fails.
    pub fn summary(&mut self, summary: &ProbeSummary) -> Result<()> {
        match self.format {
            OutputFormat::Text => self.summary_text(summary)?,
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut self.out, summary)?;
                writeln!(self.out)?;
            }
        }
        self.out.flush()?;
        Ok(())
    }

    fn summary_text(&mut self, summary: &ProbeSummary) -> Result<()> {
        writeln!(self.out, "Response status breakdown:")?;
        for (label, count) in &summary.histogram {
            writeln!(self.out, "{count} {label}")?;
        }
        writeln!(
            self.out,
            "\nSummary: Performed {} queries to server {} for domain {} with record type {}.",
            summary.completed, summary.server, summary.domain, summary.record_type
        )?;
        writeln!(
            self.out,
            "Response errors: {}",
            summary
                .error_rate
                .map(|r| format!("{r:.2}%"))
                .unwrap_or_else(|| NO_DATA.to_string())
        )?;
        writeln!(
            self.out,
            "Average response time: {}",
            format_ms(summary.avg_latency_ms)
        )?;
        if let (Some(min), Some(max)) = (summary.min_latency_ms, summary.max_latency_ms) {
            writeln!(
                self.out,
                "Fastest/slowest response: {:.2} / {:.2} ms",
                min, max
            )?;
        }
        writeln!(self.out)?;
        Ok(())
    }
}

fn format_ms(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.2} ms"))
        .unwrap_or_else(|| NO_DATA.to_string())
}
