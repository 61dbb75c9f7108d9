//! tunesift - batch song identification
//!
//! Lists the songs folder, runs every file through the fingerprint provider
//! and then the AudD acoustic search for whatever is left, and writes the
//! identified / not identified report.
//!
//! Ctrl-C (or `--timeout`) stops dispatching new items; the report is still
//! written with every item not yet attempted listed as unresolved.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tunesift_common::config::{self, ReportFormat};
use tunesift_ident::models::Item;
use tunesift_ident::services::{
    AcousticSearchProvider, DirectoryItemSource, FallbackOrchestrator, FingerprintProvider,
    ItemSource, JsonReportWriter, RateLimiter, ReportSink, StaticCredentials, TextReportWriter,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for ReportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => ReportFormat::Text,
            FormatArg::Json => ReportFormat::Json,
        }
    }
}

/// Command-line arguments for tunesift
#[derive(Parser, Debug)]
#[command(name = "tunesift")]
#[command(about = "Identify a folder of songs through a chain of recognition services")]
#[command(version)]
struct Args {
    /// Folder containing the songs to identify
    #[arg(short, long)]
    songs_folder: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// AudD API key (an invalid or missing key disables AudD)
    #[arg(long)]
    api_key: Option<String>,

    /// Report file path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Descend into subfolders
    #[arg(short, long)]
    recursive: bool,

    /// Log size and modification time of every song before identifying
    #[arg(long)]
    print_metadata: bool,

    /// Stop dispatching new items after this many seconds
    #[arg(long)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config =
        config::load_toml_config(args.config.as_deref()).context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "tunesift={level},tunesift_ident={level},tunesift_common={level}",
                    level = toml_config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting tunesift {}", env!("CARGO_PKG_VERSION"));

    let songs_folder = config::resolve_songs_folder(args.songs_folder.as_deref(), &toml_config);
    let api_key = config::resolve_api_key(args.api_key.as_deref(), &toml_config);
    let providers_config = &toml_config.providers;

    let source = DirectoryItemSource::new(&songs_folder)
        .recursive(args.recursive || toml_config.recursive);
    let items = source
        .list_items()
        .with_context(|| format!("Failed to list songs in {}", songs_folder.display()))?;

    let selected: Vec<String> = items.iter().map(Item::to_string).collect();
    info!("Selected files: {}", selected.join(" | "));

    if args.print_metadata {
        print_metadata(&items).await;
    }

    let cancel_token = CancellationToken::new();
    spawn_cancellation_triggers(&cancel_token, args.timeout);

    let rate_limiter = Arc::new(
        RateLimiter::new()
            .with_interval(FingerprintProvider::NAME, providers_config.fingerprint.interval())
            .with_interval(
                AcousticSearchProvider::NAME,
                providers_config.acoustic_search.interval(),
            )
            .with_cancellation(cancel_token.clone()),
    );
    let credentials = StaticCredentials::new().with_key(AcousticSearchProvider::NAME, api_key);

    let fingerprint = FingerprintProvider::new(
        providers_config.fingerprint.endpoint.clone(),
        providers_config.fingerprint.timeout(),
        rate_limiter.clone(),
    )
    .context("Failed to initialize fingerprint provider")?;
    let acoustic_search = AcousticSearchProvider::new(
        providers_config.acoustic_search.endpoint.clone(),
        providers_config.acoustic_search.timeout(),
        &credentials,
        rate_limiter,
    )
    .context("Failed to initialize AudD provider")?;

    let orchestrator = FallbackOrchestrator::new()
        .with_provider(Arc::new(fingerprint))
        .with_provider(Arc::new(acoustic_search));

    let outcome = orchestrator
        .run(items, &cancel_token)
        .await
        .context("Identification run aborted")?;

    for pass in &outcome.passes {
        info!("{}", pass.display_string());
    }

    let report_file = args.output.unwrap_or(toml_config.report.file.clone());
    let format = args
        .format
        .map(ReportFormat::from)
        .unwrap_or(toml_config.report.format);
    let sink: Box<dyn ReportSink> = match format {
        ReportFormat::Text => Box::new(TextReportWriter::new(
            report_file,
            toml_config.report.separator.clone(),
            toml_config.report.padding,
        )),
        ReportFormat::Json => Box::new(JsonReportWriter::new(report_file)),
    };
    sink.write(&outcome.report).context("Failed to write report")?;

    info!(
        identified = outcome.report.hits.len(),
        unresolved = outcome.report.unresolved.len(),
        cancelled = outcome.cancelled,
        "Done"
    );
    Ok(())
}

/// Cancel on Ctrl-C, and after `timeout_secs` when given
fn spawn_cancellation_triggers(cancel_token: &CancellationToken, timeout_secs: Option<u64>) {
    let token = cancel_token.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing the current item");
            token.cancel();
        }
    });

    if let Some(secs) = timeout_secs {
        let token = cancel_token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            warn!("Timeout of {}s reached, finishing the current item", secs);
            token.cancel();
        });
    }
}

/// Informational only; metadata never counts as a hit
async fn print_metadata(items: &[Item]) {
    for item in items {
        match item.metadata().await {
            Ok(meta) => info!(
                item = %item,
                size_bytes = meta.size_bytes,
                modified = %meta
                    .modified
                    .map(|m| m.to_rfc3339())
                    .unwrap_or_else(|| "unknown".to_string()),
                "Metadata"
            ),
            Err(e) => warn!(item = %item, "Failed to read metadata: {}", e),
        }
    }
}
