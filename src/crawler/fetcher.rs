//! Detail fetcher: one catalog entry's document to one record
//!
//! Each fetch call acquires its own page handle from the engine, retries the
//! document load under the bounded policy, runs the field extractor set, and
//! releases the page on every exit path. Exhausting the load retries
//! surfaces a fetch error carrying the URL, the attempt count, and the last
//! cause; the task runner decides what to do with it.

use std::sync::Arc;
use thiserror::Error;
use url::Url;

use crate::crawler::extract::{extract_record, ExtractError};
use crate::crawler::retry::RetryPolicy;
use crate::record::{ItemRef, SpellRecord};
use crate::render::{Engine, PageHandle, RenderError};

/// Errors from fetching one catalog entry
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to load {url} after {attempts} attempts: {source}")]
    Load {
        url: Url,
        attempts: u32,
        source: RenderError,
    },

    #[error("Could not open a page for {reference}: {source}")]
    Open {
        reference: ItemRef,
        source: RenderError,
    },

    #[error("Could not resolve reference {reference}: {source}")]
    Reference {
        reference: ItemRef,
        source: url::ParseError,
    },

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Fetches and parses one catalog entry's detail document
#[derive(Clone)]
pub struct DetailFetcher {
    engine: Arc<dyn Engine>,
    base_url: Url,
    retry: RetryPolicy,
}

impl DetailFetcher {
    /// Creates a fetcher
    ///
    /// # Arguments
    ///
    /// * `engine` - The shared rendering engine session
    /// * `base_url` - Base URL that item references resolve against
    /// * `retry` - Policy for document-load retries (bounded)
    pub fn new(engine: Arc<dyn Engine>, base_url: Url, retry: RetryPolicy) -> Self {
        Self {
            engine,
            base_url,
            retry,
        }
    }

    /// Fetches one entry and assembles its record
    ///
    /// Opens one page handle for the duration of the call and closes it on
    /// every exit path, including failure.
    pub async fn fetch(&self, reference: &ItemRef) -> Result<SpellRecord, FetchError> {
        let url = reference
            .resolve(&self.base_url)
            .map_err(|source| FetchError::Reference {
                reference: reference.clone(),
                source,
            })?;

        let mut page = self
            .engine
            .open()
            .await
            .map_err(|source| FetchError::Open {
                reference: reference.clone(),
                source,
            })?;

        let outcome = self.load_and_extract(page.as_mut(), reference, &url).await;

        if let Err(error) = page.close().await {
            tracing::warn!("Failed to close page for {}: {}", url, error);
        }

        outcome
    }

    /// Loads the document (with bounded retries) and runs the extractor set
    async fn load_and_extract(
        &self,
        page: &mut dyn PageHandle,
        reference: &ItemRef,
        url: &Url,
    ) -> Result<SpellRecord, FetchError> {
        let mut attempts = self.retry.attempts();
        loop {
            let attempt = attempts.start();

            let loaded = match page.goto(url).await {
                Ok(()) => page.wait_for_navigation().await,
                Err(error) => Err(error),
            };

            match loaded {
                Ok(()) => break,
                Err(source) if attempts.exhausted() => {
                    return Err(FetchError::Load {
                        url: url.clone(),
                        attempts: attempt,
                        source,
                    });
                }
                Err(error) => {
                    tracing::warn!(
                        "Load attempt {} failed for {}: {}; retrying",
                        attempt,
                        url,
                        error
                    );
                    attempts.pause().await;
                }
            }
        }

        let record = extract_record(&*page, reference)?;
        Ok(record)
    }
}
