//! Bounded task runner: fans the detail fetcher out over all references
//!
//! Workers are spawned into a `JoinSet` and gated by a semaphore, so at most
//! N fetches are in flight at any instant. Completed records flow over a
//! channel into a single coordinator loop that owns the result vector, so no
//! shared mutable state needs locking. The first item to exhaust its
//! attempts fails the whole run: remaining workers are aborted and the
//! accumulated records are discarded.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use crate::crawler::fetcher::{DetailFetcher, FetchError};
use crate::crawler::retry::RetryPolicy;
use crate::record::{ItemRef, SpellRecord};

/// A run-fatal failure: one entry exhausted all of its attempts
#[derive(Debug, Error)]
#[error("Entry {reference} failed after {attempts} attempts: {source}")]
pub struct RunError {
    /// The reference that could not be fetched
    pub reference: ItemRef,

    /// How many whole-fetch attempts were made
    pub attempts: u32,

    /// The last error observed for the entry
    pub source: FetchError,
}

/// Executes the detail fetcher over a reference list with bounded concurrency
pub struct TaskRunner {
    fetcher: DetailFetcher,
    concurrency: usize,
    retry: RetryPolicy,
}

impl TaskRunner {
    /// Creates a runner
    ///
    /// # Arguments
    ///
    /// * `fetcher` - The detail fetcher, cloned into each worker
    /// * `concurrency` - Ceiling on simultaneously in-flight fetches
    /// * `retry` - Policy for whole-fetch re-attempts per entry (bounded)
    pub fn new(fetcher: DetailFetcher, concurrency: usize, retry: RetryPolicy) -> Self {
        Self {
            fetcher,
            concurrency,
            retry,
        }
    }

    /// Fetches every reference and returns the records in completion order
    ///
    /// Each reference is submitted exactly once. Completion order is
    /// whatever order the concurrent fetches finish in, not discovery
    /// order. On the first exhausted entry the run aborts and returns the
    /// error; nothing collected so far is kept.
    pub async fn run(&self, references: Vec<ItemRef>) -> Result<Vec<SpellRecord>, RunError> {
        let total = references.len();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut workers = JoinSet::new();

        for reference in references {
            let semaphore = Arc::clone(&semaphore);
            let tx = tx.clone();
            let fetcher = self.fetcher.clone();
            let retry = self.retry;

            workers.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    // The semaphore is never closed while workers live.
                    Err(_) => return,
                };
                let outcome = attempt_entry(&fetcher, reference, retry).await;
                let _ = tx.send(outcome);
            });
        }
        drop(tx);

        let mut records = Vec::with_capacity(total);
        while let Some(outcome) = rx.recv().await {
            match outcome {
                Ok(record) => {
                    records.push(record);
                    tracing::info!("Progress: {}/{} entries harvested", records.len(), total);
                }
                Err(error) => {
                    tracing::error!("Aborting run: {}", error);
                    workers.abort_all();
                    return Err(error);
                }
            }
        }

        while workers.join_next().await.is_some() {}
        Ok(records)
    }
}

/// Attempts one entry up to the policy's limit of whole-fetch calls
async fn attempt_entry(
    fetcher: &DetailFetcher,
    reference: ItemRef,
    retry: RetryPolicy,
) -> Result<SpellRecord, RunError> {
    let mut attempts = retry.attempts();
    loop {
        let attempt = attempts.start();
        match fetcher.fetch(&reference).await {
            Ok(record) => return Ok(record),
            Err(source) if attempts.exhausted() => {
                return Err(RunError {
                    reference,
                    attempts: attempt,
                    source,
                });
            }
            Err(error) => {
                tracing::warn!(
                    "Attempt {} failed for {}: {}; retrying",
                    attempt,
                    reference,
                    error
                );
                attempts.pause().await;
            }
        }
    }
}
