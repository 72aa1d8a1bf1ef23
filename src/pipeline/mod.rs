//! Ingestion pipeline: fetch -> extract -> dedupe -> enrich -> persist.

pub mod dedupe;
pub mod news;
pub mod orchestrator;
pub mod persist;

pub use news::NewsDesk;
pub use orchestrator::{Ingested, Orchestrator};
