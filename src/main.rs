mod config;
mod enrich;
mod models;
mod pipeline;
mod scrapers;
mod server;
mod store;
mod telegram;

#[cfg(test)]
mod testing;

use anyhow::Context;
use config::Config;
use models::DataSource;
use server::{build_router, AppState};
use store::{select_as, Query, Table};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🏠 Estate Scout");
    info!("==========================================");

    let config = Config::from_env()?;
    let state = AppState::from_config(&config)?;

    // `estate-scout scrape` runs every active source once and exits
    if std::env::args().nth(1).as_deref() == Some("scrape") {
        return scrape_once(&state).await;
    }

    let app = build_router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("🚀 Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn scrape_once(state: &AppState) -> anyhow::Result<()> {
    let sources: Vec<DataSource> = select_as(
        state.store.as_ref(),
        Table::DataSources,
        &Query::new().eq("is_active", true),
    )
    .await?;

    info!("Starting scrape of {} active source(s)...", sources.len());
    let reports = state.orchestrator.run_sources(&sources).await;

    for (i, report) in reports.iter().enumerate() {
        println!("{}. {} ({:?})", i + 1, report.source_name, report.status);
        println!(
            "   found {}, saved {}, duplicates {}",
            report.progress.found, report.progress.saved, report.progress.duplicates
        );
        if let Some(error) = &report.error {
            println!("   Error: {}", error);
        }
        println!();
    }

    Ok(())
}
