use super::dedupe::Deduplicator;
use super::persist::Persister;
use crate::enrich::{Enricher, Enrichment};
use crate::models::{DataSource, ExtractedProperty, JobStatus, RawListing, ScrapingJob};
use crate::scrapers::{Extractor, ScraperTrait};
use crate::store::{insert_as, Store, StoreResult, Table};
use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Descriptions shorter than this are generated from the raw text when an
/// enricher is attached
const MIN_DESCRIPTION_CHARS: usize = 80;

/// Drives one `scraping_jobs` row through pending -> running -> completed | failed
pub struct JobTracker {
    store: Arc<dyn Store>,
    id: String,
    status: JobStatus,
}

impl JobTracker {
    /// Insert a pending job for `source_id`
    pub async fn start(store: Arc<dyn Store>, source_id: &str) -> StoreResult<Self> {
        let job: ScrapingJob =
            insert_as(store.as_ref(), Table::ScrapingJobs, &ScrapingJob::pending(source_id)).await?;
        Ok(Self {
            store,
            id: job.id.unwrap_or_default(),
            status: job.status,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    async fn advance(&mut self, next: JobStatus, mut patch: Value) -> StoreResult<()> {
        if !self.status.can_transition_to(next) {
            warn!(job = %self.id, from = ?self.status, to = ?next, "ignoring invalid job transition");
            return Ok(());
        }
        patch["status"] = json!(next);
        self.store.update(Table::ScrapingJobs, &self.id, patch).await?;
        self.status = next;
        Ok(())
    }

    pub async fn running(&mut self) -> StoreResult<()> {
        self.advance(JobStatus::Running, json!({ "started_at": Utc::now() }))
            .await
    }

    pub async fn complete(&mut self, progress: &Progress) -> StoreResult<()> {
        self.advance(
            JobStatus::Completed,
            json!({
                "properties_found": progress.found,
                "properties_saved": progress.saved,
                "completed_at": Utc::now(),
            }),
        )
        .await
    }

    pub async fn fail(&mut self, progress: &Progress, message: &str) -> StoreResult<()> {
        self.advance(
            JobStatus::Failed,
            json!({
                "properties_found": progress.found,
                "properties_saved": progress.saved,
                "error_message": message,
                "completed_at": Utc::now(),
            }),
        )
        .await
    }
}

/// Counters for one source run
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct Progress {
    /// Listings recognised by the extractor
    pub found: u32,
    pub saved: u32,
    pub duplicates: u32,
}

/// Outcome of one source run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub source_id: String,
    pub source_name: String,
    pub job_id: Option<String>,
    pub status: JobStatus,
    #[serde(flatten)]
    pub progress: Progress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What happened to a single listing
#[derive(Debug, Clone, PartialEq)]
pub enum Ingested {
    NotAListing,
    /// Recognised but not persisted
    Extracted(ExtractedProperty),
    Duplicate(ExtractedProperty),
    Saved(ExtractedProperty),
}

impl Ingested {
    pub fn property(&self) -> Option<&ExtractedProperty> {
        match self {
            Ingested::NotAListing => None,
            Ingested::Extracted(p) | Ingested::Duplicate(p) | Ingested::Saved(p) => Some(p),
        }
    }
}

/// Runs fetch -> extract -> dedupe -> enrich -> persist for configured sources
pub struct Orchestrator {
    store: Arc<dyn Store>,
    scraper: Arc<dyn ScraperTrait>,
    extractor: Extractor,
    dedupe: Deduplicator,
    persister: Persister,
    enricher: Option<Arc<dyn Enricher>>,
}

impl Orchestrator {
    pub fn new(store: Arc<dyn Store>, scraper: Arc<dyn ScraperTrait>) -> Self {
        Self {
            dedupe: Deduplicator::new(store.clone()),
            persister: Persister::new(store.clone()),
            store,
            scraper,
            extractor: Extractor::default(),
            enricher: None,
        }
    }

    /// Generate descriptions for listings whose text has little besides the title
    pub fn with_enricher(mut self, enricher: Arc<dyn Enricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    /// Run each source in order. A failing source never stops the others.
    pub async fn run_sources(&self, sources: &[DataSource]) -> Vec<RunReport> {
        info!("🚀 Scraping {} source(s)", sources.len());
        let mut reports = Vec::with_capacity(sources.len());
        for source in sources {
            reports.push(self.run_source(source).await);
        }
        let saved: u32 = reports.iter().map(|r| r.progress.saved).sum();
        let failed = reports
            .iter()
            .filter(|r| r.status == JobStatus::Failed)
            .count();
        info!("✅ Run finished: {} saved, {} source(s) failed", saved, failed);
        reports
    }

    pub async fn run_source(&self, source: &DataSource) -> RunReport {
        let mut report = RunReport {
            source_id: source.id.clone(),
            source_name: source.name.clone(),
            job_id: None,
            status: JobStatus::Failed,
            progress: Progress::default(),
            error: None,
        };

        let mut job = match JobTracker::start(self.store.clone(), &source.id).await {
            Ok(job) => job,
            Err(e) => {
                error!(source = %source.name, "Could not create scraping job: {}", e);
                report.error = Some(e.to_string());
                return report;
            }
        };
        report.job_id = Some(job.id().to_string());

        let outcome = match job.running().await {
            Ok(()) => self.ingest_source(source, &mut report.progress).await,
            Err(e) => Err(e.into()),
        };

        let finished = match &outcome {
            Ok(()) => job.complete(&report.progress).await,
            Err(e) => {
                let message = format!("{:#}", e);
                error!(source = %source.name, "Scraping failed: {}", message);
                let result = job.fail(&report.progress, &message).await;
                report.error = Some(message);
                result
            }
        };
        if let Err(e) = finished {
            warn!(job = %job.id(), "Could not record job outcome: {}", e);
        }
        report.status = job.status();

        if outcome.is_ok() {
            let touched = self
                .store
                .update(
                    Table::DataSources,
                    &source.id,
                    json!({ "last_scraped_at": Utc::now() }),
                )
                .await;
            if let Err(e) = touched {
                warn!(source = %source.name, "Could not update last_scraped_at: {}", e);
            }
            info!(
                source = %source.name,
                found = report.progress.found,
                saved = report.progress.saved,
                duplicates = report.progress.duplicates,
                "💾 Source done"
            );
        }

        report
    }

    /// Fetch and process every listing of one source. The first error aborts the
    /// remaining listings of this source; `progress` keeps what was done.
    async fn ingest_source(&self, source: &DataSource, progress: &mut Progress) -> Result<()> {
        let listings = self.scraper.scrape(source).await?;
        for raw in &listings {
            match self.ingest_listing(raw, Some(&source.id)).await? {
                Ingested::NotAListing | Ingested::Extracted(_) => {}
                Ingested::Duplicate(_) => {
                    progress.found += 1;
                    progress.duplicates += 1;
                }
                Ingested::Saved(_) => {
                    progress.found += 1;
                    progress.saved += 1;
                }
            }
        }
        Ok(())
    }

    /// Extract, dedupe, enrich and persist one listing
    pub async fn ingest_listing(&self, raw: &RawListing, source_id: Option<&str>) -> StoreResult<Ingested> {
        let Some(mut property) = self.extractor.extract(raw) else {
            return Ok(Ingested::NotAListing);
        };

        if self
            .dedupe
            .is_duplicate(Table::ScrapedProperties, "external_id", &property.external_id)
            .await?
        {
            return Ok(Ingested::Duplicate(property));
        }

        self.describe(&mut property).await;
        self.persister.save_property(source_id, &property).await?;
        Ok(Ingested::Saved(property))
    }

    /// Single free-text listing; persisted only when `save` is set
    pub async fn ingest_text(&self, text: &str, url: Option<&str>, save: bool) -> StoreResult<Ingested> {
        let raw = RawListing {
            text: text.to_string(),
            url: url.map(str::to_string),
            ..Default::default()
        };
        self.ingest_raw(&raw, save).await
    }

    pub async fn ingest_raw(&self, raw: &RawListing, save: bool) -> StoreResult<Ingested> {
        if save {
            return self.ingest_listing(raw, None).await;
        }
        Ok(match self.extractor.extract(raw) {
            Some(property) => Ingested::Extracted(property),
            None => Ingested::NotAListing,
        })
    }

    async fn describe(&self, property: &mut ExtractedProperty) {
        let Some(enricher) = &self.enricher else {
            return;
        };
        let short = property
            .description
            .as_deref()
            .map_or(true, |d| d.chars().count() < MIN_DESCRIPTION_CHARS);
        if short {
            property.description = Some(enricher.enrich(&property.raw_text, &Enrichment::Describe).await);
        }
    }
}
