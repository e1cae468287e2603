//! List paginator: walks the catalog index and collects item references
//!
//! The walk is strictly sequential - each page's "next" control only exists
//! in that page's loaded state - and fully completes before any detail
//! fetching starts. Navigation failures retry without limit; a malformed row
//! is skipped with a warning and never aborts its page.

use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

use crate::crawler::retry::RetryPolicy;
use crate::record::ItemRef;
use crate::render::{ElementSnapshot, Engine, PageHandle, RenderError};

/// One catalog row in the index listing
const ROW_SELECTOR: &str = "ul.spell-index li.spell-entry";

const ROW_LINK_SELECTOR: &str = "a.spell-link";
const ROW_ORIGIN_SELECTOR: &str = "span.spell-origin";

/// Anchor text that marks the next-page control
const NEXT_LINK_TEXT: &str = "Next";

/// Walks the paginated catalog index and yields matching item references
pub struct Paginator {
    engine: Arc<dyn Engine>,
    index_url: Url,
    allowed_origins: HashSet<String>,
}

#[derive(Debug, Error)]
enum RowParseError {
    #[error("row has no detail link")]
    MissingLink,

    #[error("detail link has no href")]
    MissingHref,

    #[error("row has no origin cell")]
    MissingOrigin,
}

impl Paginator {
    /// Creates a paginator starting at the given index URL
    ///
    /// Only rows whose origin matches an entry of `allowed_origins` (after
    /// trimming) are collected.
    pub fn new(engine: Arc<dyn Engine>, index_url: Url, allowed_origins: HashSet<String>) -> Self {
        Self {
            engine,
            index_url,
            allowed_origins,
        }
    }

    /// Walks the whole index and returns references in page-then-row order
    ///
    /// A fresh call re-walks from page one; the paginator keeps no state
    /// between runs.
    pub async fn collect_references(&self) -> Result<Vec<ItemRef>, RenderError> {
        let mut page = self.engine.open().await?;
        let references = self.walk(page.as_mut()).await;

        if let Err(error) = page.close().await {
            tracing::warn!("Failed to close index page: {}", error);
        }

        references
    }

    async fn walk(&self, page: &mut dyn PageHandle) -> Result<Vec<ItemRef>, RenderError> {
        goto_with_retry(page, &self.index_url).await;

        let mut references = Vec::new();
        let mut page_number = 1u32;

        loop {
            let rows = page.query_all(ROW_SELECTOR);
            tracing::debug!("Index page {}: {} rows", page_number, rows.len());

            for row in &rows {
                match parse_row(row) {
                    Ok((reference, origin)) => {
                        if self.allowed_origins.contains(origin.trim()) {
                            references.push(reference);
                        } else {
                            tracing::debug!(
                                "Skipping {} (origin '{}' not in allow-list)",
                                reference,
                                origin
                            );
                        }
                    }
                    Err(error) => {
                        tracing::warn!(
                            "Skipping malformed row on index page {}: {}",
                            page_number,
                            error
                        );
                    }
                }
            }

            // A next control without an href is as final as no control at
            // all.
            let next = page
                .query_by_text("a", NEXT_LINK_TEXT)
                .into_iter()
                .find(|anchor| anchor.attr("href").is_some());
            let Some(next) = next else {
                break;
            };

            click_with_retry(page, &next, page_number).await;
            page_number += 1;
        }

        tracing::info!(
            "Index walk complete: {} pages, {} matching entries",
            page_number,
            references.len()
        );
        Ok(references)
    }
}

/// Parses one catalog row into its reference and origin name
fn parse_row(row: &ElementSnapshot) -> Result<(ItemRef, String), RowParseError> {
    let link = row
        .select_one(ROW_LINK_SELECTOR)
        .ok_or(RowParseError::MissingLink)?;
    let href = link.attr("href").ok_or(RowParseError::MissingHref)?;

    let origin = row
        .select_one(ROW_ORIGIN_SELECTOR)
        .map(|cell| cell.text().to_string())
        .filter(|origin| !origin.trim().is_empty())
        .ok_or(RowParseError::MissingOrigin)?;

    Ok((ItemRef::new(href), origin))
}

/// Navigates to `url`, retrying without limit until it loads
async fn goto_with_retry(page: &mut dyn PageHandle, url: &Url) {
    let mut attempts = RetryPolicy::Unbounded.attempts();
    loop {
        let attempt = attempts.start();
        let loaded = match page.goto(url).await {
            Ok(()) => page.wait_for_navigation().await,
            Err(error) => Err(error),
        };

        match loaded {
            Ok(()) => return,
            Err(error) => {
                tracing::warn!(
                    "Navigation to {} failed (attempt {}): {}; retrying",
                    url,
                    attempt,
                    error
                );
                attempts.pause().await;
            }
        }
    }
}

/// Follows the next-page control, retrying without limit until it loads
async fn click_with_retry(page: &mut dyn PageHandle, target: &ElementSnapshot, from_page: u32) {
    let mut attempts = RetryPolicy::Unbounded.attempts();
    loop {
        let attempt = attempts.start();
        let loaded = match page.click(target).await {
            Ok(()) => page.wait_for_navigation().await,
            Err(error) => Err(error),
        };

        match loaded {
            Ok(()) => return,
            Err(error) => {
                tracing::warn!(
                    "Advancing past index page {} failed (attempt {}): {}; retrying",
                    from_page,
                    attempt,
                    error
                );
                attempts.pause().await;
            }
        }
    }
}
