//! Rendering/navigation engine boundary
//!
//! The crawl core never talks to a document source directly; it drives a
//! [`PageHandle`] obtained from an [`Engine`]. This keeps the orchestration
//! logic independent of how documents are actually produced: the bundled
//! [`http::HttpEngine`] fetches and parses static HTML, and a browser-backed
//! engine could implement the same traits.
//!
//! Queries return [`ElementSnapshot`] values: owned copies of one element's
//! tag, text, attributes, and inner HTML. Snapshots stay usable across await
//! points and task boundaries, and support local sub-queries over their own
//! fragment, but they are only meaningful until the page navigates again.

mod dom;
pub mod http;


use async_trait::async_trait;
use thiserror::Error;
use url::Url;

pub use http::HttpEngine;

/// Errors from the rendering/navigation engine
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Element has no href to follow")]
    NotClickable,

    #[error("No document loaded")]
    NoDocument,

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Engine error: {0}")]
    Engine(String),
}

/// A rendering engine session: the single shared collaborator that can
/// produce page handles
///
/// One engine instance hosts all of a run's logical pages; each caller gets
/// its own [`PageHandle`] and must close it when done.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Opens a fresh logical page with no document loaded
    async fn open(&self) -> Result<Box<dyn PageHandle>, RenderError>;
}

/// One logical page: a navigable cursor over the remote document source
#[async_trait]
pub trait PageHandle: Send {
    /// Navigates the page to the given URL
    async fn goto(&mut self, url: &Url) -> Result<(), RenderError>;

    /// Waits until the current navigation has settled
    ///
    /// Engines whose navigation completes synchronously may treat this as a
    /// no-op; callers invoke it after every navigation regardless.
    async fn wait_for_navigation(&mut self) -> Result<(), RenderError>;

    /// Returns the first element matching a CSS selector, if any
    fn query_one(&self, selector: &str) -> Option<ElementSnapshot>;

    /// Returns all elements matching a CSS selector, in document order
    fn query_all(&self, selector: &str) -> Vec<ElementSnapshot>;

    /// Returns all elements of the given tag whose text contains `needle`
    fn query_by_text(&self, tag: &str, needle: &str) -> Vec<ElementSnapshot>;

    /// Follows the target element's link, navigating the page
    async fn click(&mut self, target: &ElementSnapshot) -> Result<(), RenderError>;

    /// Releases the page; the handle must not be used afterwards
    async fn close(&mut self) -> Result<(), RenderError>;
}

/// Owned snapshot of one document element
///
/// Captured at query time; valid until the page navigates again. Sub-queries
/// (`select_one`/`select_all`) parse the snapshot's own inner HTML, so row
/// internals can be examined without another engine round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSnapshot {
    tag: String,
    text: String,
    inner_html: String,
    attrs: Vec<(String, String)>,
}

impl ElementSnapshot {
    pub(crate) fn new(
        tag: String,
        text: String,
        inner_html: String,
        attrs: Vec<(String, String)>,
    ) -> Self {
        Self {
            tag,
            text,
            inner_html,
            attrs,
        }
    }

    /// The element's tag name (lowercase)
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The element's collected text with whitespace collapsed
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The element's inner HTML
    pub fn inner_html(&self) -> &str {
        &self.inner_html
    }

    /// An attribute value, if present
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First element within this snapshot matching a CSS selector
    pub fn select_one(&self, selector: &str) -> Option<ElementSnapshot> {
        dom::query_fragment_one(&self.inner_html, selector)
    }

    /// All elements within this snapshot matching a CSS selector
    pub fn select_all(&self, selector: &str) -> Vec<ElementSnapshot> {
        dom::query_fragment_all(&self.inner_html, selector)
    }
}
