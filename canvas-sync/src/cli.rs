/// # canvas-sync CLI
///
/// Command-line glue: argument parsing, wiring the real HTTP clients into the
/// core orchestrator, and user-visible output. All sync logic lives in
/// `canvas-sync-core`.
///
/// Programmatic and integration-test callers use [`run`] with a constructed [`Cli`].
use crate::load_config::load_config;
use crate::notion::NotionClient;
use crate::telegram::TelegramNotifier;
use anyhow::Result;
use canvas_sync_core::source::CanvasClient;
use canvas_sync_core::synchronise::synchronise;
use clap::Parser;
use std::path::PathBuf;

/// Mirror new Canvas courses, assignments, files and announcements into Notion.
#[derive(Parser)]
#[clap(
    name = "canvas-sync",
    version,
    about = "Mirror new Canvas course content into Notion databases and announce it on Telegram"
)]
pub struct Cli {
    /// Optional YAML file with non-secret settings; secrets always come from the environment
    #[clap(long)]
    pub config: Option<PathBuf>,
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let config = load_config(cli.config.as_deref())?;

    let source = CanvasClient::new(&config.sync.canvas, config.timeout)
        .map_err(|e| anyhow::anyhow!("Failed to construct LMS client: {e}"))?;
    let store = NotionClient::new(config.notion.clone(), config.timeout)
        .map_err(|e| anyhow::anyhow!("Failed to construct Notion client: {e}"))?;
    let notifier = TelegramNotifier::new(config.telegram.clone(), config.timeout)
        .map_err(|e| anyhow::anyhow!("Failed to construct Telegram notifier: {e}"))?;

    println!("Synchronise starting...");
    let report = synchronise(&config.sync, &source, &store, &notifier).await;
    tracing::info!(?report, "Synchronisation complete");

    println!(
        "Synchronise complete: {} courses, {} created, {} skipped, {} failed.",
        report.courses_seen,
        report.total_created(),
        report.courses.skipped
            + report.assignments.skipped
            + report.files.skipped
            + report.announcements.skipped,
        report.total_failed()
    );
    Ok(())
}
