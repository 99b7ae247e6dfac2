//! # Layer Composer CLI
//!
//! Command-line host for Layer Composer session documents.

use clap::Parser;
use composer_cli::{commands, CliArgs, LogFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing.
///
/// Set `RUST_LOG` to control log levels; `--log-format json` switches to
/// one JSON object per event.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(
            "layer_composer=info,composer_cli=info,composer_core=info,composer_renderer=info,composer_ai=info",
        )
    });

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.log_format);

    tracing::debug!("Running {:?}", args.command);
    commands::run(args).await
}
