//! HTTP-backed rendering engine
//!
//! The bundled [`Engine`] implementation: documents are fetched with a
//! reqwest client and queried through scraper. Navigation settles as soon as
//! the response body has been read, so [`PageHandle::wait_for_navigation`]
//! is a no-op here; a browser-backed engine would actually wait.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use super::{dom, ElementSnapshot, Engine, PageHandle, RenderError};
use crate::config::Config;

/// Rendering engine that fetches static HTML over HTTP
pub struct HttpEngine {
    client: Client,
}

impl HttpEngine {
    /// Builds the engine session from the configuration
    ///
    /// The client carries the configured harvester identity as its
    /// User-Agent (`Name/Version (+ContactURL; ContactEmail)`) plus the
    /// configured request timeout. The `headless` run mode is advisory for
    /// this engine: there is no window to show either way.
    pub fn new(config: &Config) -> Result<Self, RenderError> {
        if !config.crawler.headless {
            tracing::debug!("Visible run mode requested; HTTP engine has no window to show");
        }

        let client = Client::builder()
            .user_agent(config.user_agent.header_value())
            .timeout(Duration::from_secs(config.crawler.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(RenderError::Client)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Engine for HttpEngine {
    async fn open(&self) -> Result<Box<dyn PageHandle>, RenderError> {
        Ok(Box::new(HttpPage {
            client: self.client.clone(),
            url: None,
            body: String::new(),
        }))
    }
}

/// One logical page of the HTTP engine
///
/// Holds the most recently loaded document body; queries parse it on demand.
struct HttpPage {
    client: Client,
    url: Option<Url>,
    body: String,
}

#[async_trait]
impl PageHandle for HttpPage {
    async fn goto(&mut self, url: &Url) -> Result<(), RenderError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| RenderError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // The final URL (after redirects) is what relative links resolve
        // against.
        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|source| RenderError::Http {
                url: url.to_string(),
                source,
            })?;

        self.url = Some(final_url);
        self.body = body;
        Ok(())
    }

    async fn wait_for_navigation(&mut self) -> Result<(), RenderError> {
        if self.url.is_none() {
            return Err(RenderError::NoDocument);
        }
        Ok(())
    }

    fn query_one(&self, selector: &str) -> Option<ElementSnapshot> {
        dom::query_document_one(&self.body, selector)
    }

    fn query_all(&self, selector: &str) -> Vec<ElementSnapshot> {
        dom::query_document_all(&self.body, selector)
    }

    fn query_by_text(&self, tag: &str, needle: &str) -> Vec<ElementSnapshot> {
        dom::query_document_by_text(&self.body, tag, needle)
    }

    async fn click(&mut self, target: &ElementSnapshot) -> Result<(), RenderError> {
        let href = target.attr("href").ok_or(RenderError::NotClickable)?;
        let current = self.url.as_ref().ok_or(RenderError::NoDocument)?;
        let destination = current.join(href)?;
        self.goto(&destination).await
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        self.url = None;
        self.body.clear();
        Ok(())
    }
}
