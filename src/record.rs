//! Data model for harvested catalog entries
//!
//! The types in this module are the output vocabulary of the pipeline:
//! - [`ItemRef`] - a locator for one catalog entry, produced by the paginator
//! - [`SpellRecord`] - the fully parsed representation of one entry
//! - [`SourceCitation`] and [`LevelAssociation`] - structured sub-fields

use serde::Serialize;
use std::fmt;
use url::Url;

/// Locator for one catalog entry, as found in the catalog index
///
/// An `ItemRef` wraps the href of a detail link (usually a relative path such
/// as `/spells/fireball-1102`). It is immutable and is consumed exactly once
/// by the task runner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemRef(String);

impl ItemRef {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    /// Returns the raw locator string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derives the record identifier from the locator alone
    ///
    /// The identifier is the trailing run of ASCII digits in the locator's
    /// last path segment (`/spells/fireball-1102` -> `1102`). When the
    /// segment carries no trailing digits the whole segment is used, so even
    /// a record whose document never loaded remains identifiable.
    ///
    /// This is a pure function of the locator; the fetched document is never
    /// consulted.
    pub fn id(&self) -> String {
        let segment = self.last_segment();
        let digits: String = segment
            .chars()
            .rev()
            .take_while(|c| c.is_ascii_digit())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();

        if digits.is_empty() {
            segment.to_string()
        } else {
            digits
        }
    }

    /// Resolves the locator against the catalog base URL
    pub fn resolve(&self, base: &Url) -> std::result::Result<Url, url::ParseError> {
        base.join(&self.0)
    }

    /// The last path segment of the locator, without query or fragment
    fn last_segment(&self) -> &str {
        let path = self.0.as_str();
        let path = path.split('#').next().unwrap_or(path);
        let path = path.split('?').next().unwrap_or(path);
        let path = path.trim_end_matches('/');
        path.rsplit('/').next().unwrap_or(path)
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Book citation for an entry: where the entry was originally published
///
/// Present on a record only when both the origin name and the page number
/// parsed from the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCitation {
    /// Source book name (e.g. "Core Rulebook")
    pub origin: String,

    /// Page number within the source book
    pub page: u32,
}

/// One (category, level) pair, e.g. a class or domain granting the spell
///
/// Records keep these in document order and do not deduplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelAssociation {
    /// Class or domain name (e.g. "sorcerer/wizard")
    pub category: String,

    /// Level at which the category grants the spell
    pub level: u8,
}

/// Fully parsed representation of one catalog entry
///
/// Every field except `id` and `name` degrades to its empty/absent form when
/// the document lacks it or the field fails to parse; `id` is derived from
/// the [`ItemRef`] and `name` is required for the record to exist at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpellRecord {
    pub id: String,
    pub name: String,
    pub source: Option<SourceCitation>,
    pub schools: Vec<String>,
    pub subschools: Vec<String>,
    pub descriptors: Vec<String>,
    pub levels: Vec<LevelAssociation>,
    pub components: Vec<String>,
    pub casting_time: Option<String>,
    pub range: Option<String>,
    pub area: Option<String>,
    pub target: Option<String>,
    pub effect: Option<String>,
    pub duration: Option<String>,
    pub saving_throw: Option<String>,
    pub resistance: Option<String>,
    pub description: Option<String>,
}

impl SpellRecord {
    /// Creates a record with the given identity and every other field empty
    ///
    /// The extractor set fills fields in as they parse; anything left
    /// untouched keeps its documented default.
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            source: None,
            schools: Vec::new(),
            subschools: Vec::new(),
            descriptors: Vec::new(),
            levels: Vec::new(),
            components: Vec::new(),
            casting_time: None,
            range: None,
            area: None,
            target: None,
            effect: None,
            duration: None,
            saving_throw: None,
            resistance: None,
            description: None,
        }
    }
}
