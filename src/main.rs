use std::path::PathBuf;

use clap::Parser;

/// Detects drift between a Cloud Foundry environment and its declared state.
///
/// Credentials are read from `CF_USER` and `CF_PASS`; log verbosity is
/// controlled with `RUST_LOG`.
///
/// # Examples
///
/// ```bash
/// CF_USER=admin CF_PASS=secret RUST_LOG=info cargo run -- --config config.yaml
/// ```
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(long, env = "WATCHTOWER_CONFIG", default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();
    watchtower::run(&args.config).await?;
    Ok(())
}
