use crate::models::{DataSource, JobStatus, RawListing};
use crate::pipeline::Ingested;
use crate::scrapers::html::parse_single_page;
use crate::server::{success, ApiError, ApiResult, AppState, JsonBody};
use crate::store::{find_by_id, select_as, Query, Table};
use axum::{extract::Extension, Json};
use serde::Deserialize;
use serde_json::json;

const RECENT_JOBS: usize = 20;

#[derive(Debug, Deserialize)]
pub struct WebScraperRequest {
    pub action: String,
    #[serde(default)]
    pub source_id: Option<String>,
}

/// `scrape_source`, `scrape_all` or `jobs`
pub async fn web_scraper_handler(
    Extension(state): Extension<AppState>,
    JsonBody(request): JsonBody<WebScraperRequest>,
) -> ApiResult {
    match request.action.as_str() {
        "scrape_source" => {
            let source_id = request
                .source_id
                .ok_or_else(|| ApiError::bad_request("source_id is required"))?;
            let source: DataSource = find_by_id(state.store.as_ref(), Table::DataSources, &source_id)
                .await?
                .ok_or_else(|| ApiError::not_found(format!("Data source {} not found", source_id)))?;

            let report = state.orchestrator.run_source(&source).await;
            Ok(Json(json!({
                "success": report.status == JobStatus::Completed,
                "error": report.error.clone(),
                "job": report,
            })))
        }
        "scrape_all" => {
            let sources: Vec<DataSource> = select_as(
                state.store.as_ref(),
                Table::DataSources,
                &Query::new().eq("is_active", true),
            )
            .await?;

            let reports = state.orchestrator.run_sources(&sources).await;
            let total_saved: u32 = reports.iter().map(|r| r.progress.saved).sum();
            Ok(success(json!({
                "sources": reports.len(),
                "total_saved": total_saved,
                "results": reports,
            })))
        }
        "jobs" => {
            let jobs = state
                .store
                .select(
                    Table::ScrapingJobs,
                    &Query::new().order_desc("created_at").limit(RECENT_JOBS),
                )
                .await?;
            Ok(success(json!({ "jobs": jobs })))
        }
        other => Err(ApiError::bad_request(format!("Unknown action: {}", other))),
    }
}

#[derive(Debug, Deserialize)]
pub struct PropertyScraperRequest {
    pub action: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub save: bool,
}

/// `extract` from free text, or `scrape_url` for a single listing page
pub async fn property_scraper_handler(
    Extension(state): Extension<AppState>,
    JsonBody(request): JsonBody<PropertyScraperRequest>,
) -> ApiResult {
    let raw = match request.action.as_str() {
        "extract" => {
            let text = request
                .text
                .filter(|t| !t.trim().is_empty())
                .ok_or_else(|| ApiError::bad_request("text is required"))?;
            RawListing {
                url: request.url,
                ..RawListing::from_text(text)
            }
        }
        "scrape_url" => {
            let url = request
                .url
                .ok_or_else(|| ApiError::bad_request("url is required"))?;
            let html = state.fetcher.fetch(&url).await?;
            parse_single_page(&html, &url)?
        }
        other => return Err(ApiError::bad_request(format!("Unknown action: {}", other))),
    };

    let outcome = state.orchestrator.ingest_raw(&raw, request.save).await?;
    Ok(success(json!({
        "property": outcome.property(),
        "saved": matches!(outcome, Ingested::Saved(_)),
        "duplicate": matches!(outcome, Ingested::Duplicate(_)),
    })))
}
