use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod models;
mod report;
mod services;
mod title;

use config::AppConfig;
use report::progress::ProgressBar;
use report::style;
use services::justwatch::JustWatchClient;
use services::plex::PlexClient;
use services::reconcile::Reconciler;
use services::tvmaze::TvMazeClient;
use services::LibrarySource;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the report
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plex_where_to_watch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::load();
    config.log_config();
    config.validate().with_context(|| {
        format!(
            "Invalid configuration (config file: {})",
            config.config_path.display()
        )
    })?;

    run(&config).await
}

async fn run(config: &AppConfig) -> Result<()> {
    println!("{}", style::bold("\n🎬 Plex Where to Watch\n"));

    let plex = PlexClient::new(&config.plex);
    let justwatch = JustWatchClient::new(&config.justwatch);
    let tvmaze = TvMazeClient::new();

    println!("Fetching TV shows from Plex...");
    let items = plex
        .list_items()
        .await
        .context("Failed to fetch TV shows from Plex")?;
    println!("{}", style::green(&format!("✓ Found {} TV shows\n", items.len())));

    println!("Fetching streaming providers...");
    let resolution = services::providers::resolve(&justwatch, &config.justwatch.providers)
        .await
        .context("Failed to fetch JustWatch providers")?;
    for name in &resolution.unresolved {
        println!("{}", style::yellow(&format!("! Unknown provider: {name}")));
    }
    let providers = resolution.providers;
    println!(
        "{}",
        style::green(&format!("✓ Monitoring {} providers\n", providers.len()))
    );

    println!("Processing shows...");
    let mut progress = ProgressBar::stdout(items.len());
    let reconciler = Reconciler::new(&justwatch, &tvmaze, &plex).dry_run(config.dry_run);
    let (results, summary) = reconciler
        .run(&items, &providers, |done, _| progress.update(done))
        .await;
    progress.finish();

    tracing::info!(
        "Run complete: {} items, {} matched, {} ended, {} labelled, {} label failures, {} lookup failures",
        summary.items,
        summary.matched,
        summary.ended,
        summary.labels_written,
        summary.label_failures,
        summary.lookup_failures
    );
    println!(
        "{}",
        style::green(&format!("\n✓ Processed {} shows\n", results.len()))
    );

    for table in report::build(&results, &providers, config.table_mode) {
        println!("\n{table}");
    }

    println!("{}", style::green("\n✓ Done!\n"));
    Ok(())
}
