//! Pipeline driver: session lifecycle and phase wiring
//!
//! The driver owns the run: it builds the engine session, walks the catalog
//! index, and - when anything matched - fans out the detail fetches. The two
//! phases never overlap; the paginator has fully finished before the runner
//! starts. The engine session is released when the driver returns, on every
//! path.

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::Config;
use crate::crawler::fetcher::DetailFetcher;
use crate::crawler::paginator::Paginator;
use crate::crawler::retry::RetryPolicy;
use crate::crawler::runner::TaskRunner;
use crate::record::SpellRecord;
use crate::render::{Engine, HttpEngine};
use crate::VancianError;

/// Orchestrates one full harvest over a given engine session
pub struct Driver {
    config: Config,
    engine: Arc<dyn Engine>,
}

impl Driver {
    /// Creates a driver over an already-built engine session
    pub fn new(config: Config, engine: Arc<dyn Engine>) -> Self {
        Self { config, engine }
    }

    /// Runs the two-phase pipeline and returns the harvested records
    ///
    /// Returns an empty vector (after logging) when no catalog rows match
    /// the origin allow-list; no detail fetch happens in that case.
    pub async fn run(&self) -> Result<Vec<SpellRecord>, VancianError> {
        let index_url = self.config.index_url()?;
        let base_url = self.config.base_url()?;

        tracing::info!(
            "Starting harvest of {} (run mode: {})",
            index_url,
            if self.config.crawler.headless {
                "headless"
            } else {
                "visible"
            }
        );

        let allowed_origins: HashSet<String> = self
            .config
            .catalog
            .allowed_origins
            .iter()
            .map(|origin| origin.trim().to_string())
            .collect();

        // Phase one: list discovery.
        let paginator = Paginator::new(Arc::clone(&self.engine), index_url, allowed_origins);
        let references = paginator.collect_references().await?;

        if references.is_empty() {
            tracing::info!("Nothing found: no catalog rows matched the origin allow-list");
            return Ok(Vec::new());
        }

        tracing::info!("Discovered {} matching entries", references.len());

        // Phase two: detail extraction.
        let retry = RetryPolicy::Bounded(self.config.crawler.retry_limit);
        let fetcher = DetailFetcher::new(Arc::clone(&self.engine), base_url, retry);
        let runner = TaskRunner::new(
            fetcher,
            self.config.crawler.max_concurrent_fetches as usize,
            retry,
        );
        let records = runner.run(references).await?;

        tracing::info!("Harvest complete: {} records", records.len());
        Ok(records)
    }
}

/// Runs a complete harvest with the bundled HTTP engine
///
/// This is the main entry point for the binary. The engine session lives
/// exactly as long as this call; it is released on every path, including
/// failure.
///
/// # Arguments
///
/// * `config` - The harvester configuration
///
/// # Returns
///
/// * `Ok(Vec<SpellRecord>)` - All harvested records, complete or not at all
/// * `Err(VancianError)` - Session startup or pipeline failure
pub async fn crawl(config: Config) -> Result<Vec<SpellRecord>, VancianError> {
    let engine = Arc::new(HttpEngine::new(&config)?);
    let driver = Driver::new(config, engine);
    driver.run().await
}
