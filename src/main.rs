use anyhow::{Context, Result};
use clap::Parser;
use memcached_profile::config::Cli;
use memcached_profile::profile;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise --verbose turns on the progress lines.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "info" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.into_config().context("Invalid arguments")?;

    let report = profile::run(&config)
        .await
        .with_context(|| format!("Profiling {}:{} failed", config.host, config.port))?;

    if config.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report);
    }

    Ok(())
}
