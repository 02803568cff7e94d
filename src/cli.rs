//! Command-line interface (CLI) argument parsing module.
//!
//! This module provides CLI argument parsing using `clap`, plus the
//! server address check that runs before any probing.

use crate::config::SettingsOverrides;
use crate::dns::TransportMode;
use crate::error::{Error, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// CLI argument parser using clap derive macro.
///
/// # Example
///
/// ```ignore
/// let cli = Cli::parse();
/// let server = dnsck::cli::parse_server(&cli.server)?;
/// ```
#[derive(Parser, Debug)]
#[command(
    name = "dnsck",
    version,
    about = "Perform automated DNS queries from command-line input",
    long_about = "Repeatedly query a DNS server, measure response times and report \
                  a breakdown of response codes, the error rate and the average latency",
    disable_version_flag = true
)]
pub struct Cli {
    /// Domain name to query
    pub domain: String,

    /// IP address of server
    #[arg(short, long, default_value = "8.8.8.8")]
    pub server: String,

    /// Record type
    #[arg(short = 't', long = "type", default_value = "A")]
    pub record_type: String,

    /// Number of iterations
    #[arg(
        short,
        long = "iter",
        default_value = "30",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub iterations: u32,

    /// Use TCP instead of UDP
    #[arg(long)]
    pub tcp: bool,

    /// Disable the pause between queries
    #[arg(long)]
    pub nosleep: bool,

    /// Server port
    #[arg(long)]
    pub port: Option<u16>,

    /// Query timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Latency in milliseconds at which a reply counts as degraded
    #[arg(long)]
    pub threshold_ms: Option<u64>,

    /// Pause between queries in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Settings file (JSON)
    #[arg(short, long, env = "DNSCK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose logging
    #[arg(long)]
    pub verbose: bool,

    /// Quiet mode (only errors)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print version
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    pub version: Option<bool>,
}

impl Cli {
    #[must_use]
    pub fn transport_mode(&self) -> TransportMode {
        TransportMode::from_tcp_flag(self.tcp)
    }

    /// Settings given on the command line.
    #[must_use]
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            port: self.port,
            timeout_ms: self.timeout_ms,
            latency_threshold_ms: self.threshold_ms,
            delay_ms: self.delay_ms,
            no_sleep: self.nosleep,
        }
    }
}

/// Output format for run reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Per-query lines and a summary block (default, human-readable)
    #[default]
    Text,
    /// Summary only, as JSON
    Json,
}

impl OutputFormat {
    /// Get all available output format names.
    #[must_use]
    pub fn names() -> &'static [&'static str] {
        &["text", "json"]
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "Unknown format: {}. Valid options are: {:?}",
                s,
                Self::names()
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Check that `server` is an IPv4 or IPv6 literal.
///
/// # Errors
///
/// Returns `Error::InvalidServer` for anything else, including host names.
pub fn parse_server(server: &str) -> Result<IpAddr> {
    server
        .trim()
        .parse()
        .map_err(|_| Error::InvalidServer(server.to_string()))
}

/// Parse CLI arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn try_parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("dnsck").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let cli = try_parse(&["google.com"]).unwrap();
        assert_eq!(cli.domain, "google.com");
        assert_eq!(cli.server, "8.8.8.8");
        assert_eq!(cli.record_type, "A");
        assert_eq!(cli.iterations, 30);
        assert_eq!(cli.transport_mode(), TransportMode::Udp);
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(!cli.nosleep);
    }

    #[test]
    fn test_all_flags() {
        let cli = try_parse(&[
            "-s", "::1", "google.com", "-t", "txt", "-i", "2", "--tcp", "--nosleep",
            "--timeout-ms", "2000", "--threshold-ms", "250",
        ])
        .unwrap();
        assert_eq!(cli.server, "::1");
        assert_eq!(cli.record_type, "txt");
        assert_eq!(cli.iterations, 2);
        assert_eq!(cli.transport_mode(), TransportMode::Tcp);

        let overrides = cli.overrides();
        assert!(overrides.no_sleep);
        assert_eq!(overrides.timeout_ms, Some(2000));
        assert_eq!(overrides.latency_threshold_ms, Some(250));
        assert_eq!(overrides.port, None);
    }

    #[test]
    fn test_swapped_type_and_iteration() {
        let cli = try_parse(&["google.com", "-i", "1", "-t", "NS", "--tcp"]).unwrap();
        assert_eq!(cli.iterations, 1);
        assert_eq!(cli.record_type, "NS");
    }

    #[test]
    fn test_usage_errors() {
        assert!(try_parse(&[]).is_err());
        assert!(try_parse(&["-s", "8.8.8.8", "google.com", "-x"]).is_err());
        assert!(try_parse(&["google.com", "-i", "0"]).is_err());
        assert!(try_parse(&["google.com", "--verbose", "--quiet"]).is_err());
    }

    #[test]
    fn test_help_and_version() {
        for flag in ["-h", "--help", "-v", "--version"] {
            let err = try_parse(&[flag]).unwrap_err();
            assert_eq!(err.exit_code(), 0, "{flag}");
        }
    }

    #[test]
    fn test_parse_server() {
        assert!(parse_server("192.168.0.55").unwrap().is_ipv4());
        assert!(parse_server("::1").unwrap().is_ipv6());
        assert!(parse_server("2001:4860:4802:34::a").is_ok());
        assert!(matches!(
            parse_server("192.168.0.256"),
            Err(Error::InvalidServer(_))
        ));
        assert!(parse_server("8.8.8").is_err());
        assert!(parse_server("::Z").is_err());
        assert!(parse_server("2001:4860:4802:34::ag").is_err());
        assert!(parse_server("dns.google").is_err());
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("table".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Text.to_string(), "text");
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }
}
