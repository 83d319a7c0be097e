//! cmdb CLI binary.

use anyhow::Result;
use cmdb::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the cmdb CLI.
///
/// Uses tokio's current_thread runtime: each invocation runs one command.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr so `--json` output on stdout stays machine-readable.
    // Example: RUST_LOG=cmdb=debug cmdb ci list
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cmdb=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!("Starting cmdb CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("cmdb CLI completed successfully");
    Ok(())
}
