//! dnsck - automated DNS queries
//!
//! Binary entry point for the dnsck CLI application.

#![warn(clippy::all, warnings)]
#![warn(clippy::pedantic, clippy::nursery)]

use dnsck::cli::{self, Cli};
use dnsck::config::ConfigLoader;
use dnsck::dns::{Prober, QuerySpec};
use dnsck::error::{Error, Result};
use dnsck::report::Reporter;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Set up logging based on verbosity level.
///
/// Logs go to stderr so they never mix with the report on stdout.
///
/// # Arguments
///
/// * `verbose` - Enable debug-level logging
/// * `quiet` - Enable error-level only logging
fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"))
    } else if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().without_time().with_writer(std::io::stderr))
        .init();
}

/// Cancel `token` on Ctrl-C.
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received SIGINT, stopping probe...");
                token.cancel();
            }
            Err(e) => tracing::warn!("Cannot listen for Ctrl-C: {e}"),
        }
    });
}

/// Validate the input, run the probe loop and return the error count.
///
/// # Arguments
///
/// * `cli` - Parsed command-line arguments
async fn run_probe(cli: Cli) -> Result<usize> {
    let server = cli::parse_server(&cli.server)?;
    let spec = QuerySpec::new(&cli.domain, &cli.record_type, cli.transport_mode())?;
    let settings = ConfigLoader::apply(
        ConfigLoader::load(cli.config.as_deref())?,
        cli.overrides(),
    );
    tracing::debug!("Probe settings: {settings:?}");

    let shutdown = CancellationToken::new();
    cancel_on_interrupt(shutdown.clone());

    let prober = Prober::new(server, spec, settings).with_cancellation(shutdown);
    let mut reporter = Reporter::stdout(cli.format);
    let summary = prober.run(cli.iterations as usize, &mut reporter).await;
    Ok(summary.errors)
}

/// Console message for an error that stopped the run before it started.
fn fatal_message(error: &Error) -> String {
    match error {
        Error::InvalidServer(_) => "Invalid IP address, try again.".to_string(),
        Error::UnknownRecordType(_) => "Unknown record type, try again.".to_string(),
        other => format!("Error: {other}"),
    }
}

/// Main entry point for the dnsck CLI application.
#[tokio::main]
async fn main() {
    // Set up panic hook for better error reporting
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("dnsck crashed: {}", panic_info);
    }));

    let cli = cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    tracing::debug!("dnsck starting...");

    match run_probe(cli).await {
        Ok(errors) => tracing::debug!("Probe finished with {errors} errors"),
        Err(e) => {
            tracing::debug!("Fatal: {e}");
            eprintln!("{}", fatal_message(&e));
            std::process::exit(e.exit_code());
        }
    }
}
