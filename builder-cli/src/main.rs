//! # Surface Builder CLI
//!
//! Check, normalize and prepare surface documents from the command line.

use builder_cli::CliArgs;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "builder_cli=info,builder_core=info,builder_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();
    tracing::debug!(command = ?args.command, "starting");

    let output = builder_cli::run(args).await?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
