//! Field extractor set for detail documents
//!
//! Extraction is table-driven: simple text fields and list fields are
//! declared as rules (field name, selector, assignment) and iterated
//! uniformly; the citation, level associations, and description have
//! dedicated extractors. Every extractor is independent and degrades to its
//! documented default after logging a warning - except the name, whose
//! failure aborts the whole fetch. A document without a name has almost
//! certainly not rendered, so that condition is routed into the retry
//! layers instead of producing a hollow record.

use thiserror::Error;

use crate::record::{ItemRef, LevelAssociation, SourceCitation, SpellRecord};
use crate::render::{ElementSnapshot, PageHandle};

/// Root element of a detail document
const SPELL_ROOT_SELECTOR: &str = "article.spell";

const NAME_SELECTOR: &str = "h1.spell-name";
const SOURCE_SELECTOR: &str = "p.spell-source";
const SOURCE_ORIGIN_SELECTOR: &str = "span.origin";
const SOURCE_PAGE_SELECTOR: &str = "span.page";
const LEVELS_SELECTOR: &str = "ul.spell-levels";
const LIST_ENTRY_SELECTOR: &str = "li";
const DESCRIPTION_SELECTOR: &str = "div.spell-description";

/// Errors that abort a record instead of degrading a field
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("No name found in document for {reference}")]
    MissingName { reference: ItemRef },
}

/// A field-local failure, recovered by the guard around each extractor
#[derive(Debug, Error)]
#[error("{0}")]
struct FieldError(String);

/// Simple text field: first match's text, absent when missing or empty
struct TextRule {
    field: &'static str,
    selector: &'static str,
    assign: fn(&mut SpellRecord, Option<String>),
}

const TEXT_RULES: &[TextRule] = &[
    TextRule {
        field: "casting_time",
        selector: "dd.casting-time",
        assign: |record, value| record.casting_time = value,
    },
    TextRule {
        field: "range",
        selector: "dd.range",
        assign: |record, value| record.range = value,
    },
    TextRule {
        field: "area",
        selector: "dd.area",
        assign: |record, value| record.area = value,
    },
    TextRule {
        field: "target",
        selector: "dd.target",
        assign: |record, value| record.target = value,
    },
    TextRule {
        field: "effect",
        selector: "dd.effect",
        assign: |record, value| record.effect = value,
    },
    TextRule {
        field: "duration",
        selector: "dd.duration",
        assign: |record, value| record.duration = value,
    },
    TextRule {
        field: "saving_throw",
        selector: "dd.saving-throw",
        assign: |record, value| record.saving_throw = value,
    },
    TextRule {
        field: "resistance",
        selector: "dd.resistance",
        assign: |record, value| record.resistance = value,
    },
];

/// List field: text of each entry under the matched list, empty when missing
struct ListRule {
    field: &'static str,
    selector: &'static str,
    assign: fn(&mut SpellRecord, Vec<String>),
}

const LIST_RULES: &[ListRule] = &[
    ListRule {
        field: "schools",
        selector: "ul.spell-schools",
        assign: |record, values| record.schools = values,
    },
    ListRule {
        field: "subschools",
        selector: "ul.spell-subschools",
        assign: |record, values| record.subschools = values,
    },
    ListRule {
        field: "descriptors",
        selector: "ul.spell-descriptors",
        assign: |record, values| record.descriptors = values,
    },
    ListRule {
        field: "components",
        selector: "ul.spell-components",
        assign: |record, values| record.components = values,
    },
];

/// Extracts one full record from the currently loaded detail document
///
/// The record identifier comes from the reference alone; the document is
/// never consulted for it. Only a missing name aborts - every other field
/// falls back to its default.
pub fn extract_record(
    page: &dyn PageHandle,
    reference: &ItemRef,
) -> Result<SpellRecord, ExtractError> {
    let root = page
        .query_one(SPELL_ROOT_SELECTOR)
        .ok_or_else(|| ExtractError::MissingName {
            reference: reference.clone(),
        })?;

    let name = root
        .select_one(NAME_SELECTOR)
        .map(|element| element.text().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ExtractError::MissingName {
            reference: reference.clone(),
        })?;

    let mut record = SpellRecord::new(reference.id(), name);

    for rule in TEXT_RULES {
        (rule.assign)(&mut record, text_field(&root, rule.selector));
    }

    for rule in LIST_RULES {
        let values = guarded(rule.field, Vec::new(), || list_field(&root, rule.selector));
        (rule.assign)(&mut record, values);
    }

    record.source = guarded("source", None, || citation_field(&root));
    record.levels = guarded("levels", Vec::new(), || levels_field(&root));
    record.description = description_field(&root);

    Ok(record)
}

/// Runs one extractor inside its fault boundary
///
/// A failure is logged with the field name and replaced by the field's
/// documented default; it never aborts the record.
fn guarded<T>(field: &str, default: T, extract: impl FnOnce() -> Result<T, FieldError>) -> T {
    match extract() {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(
                "Failed to extract field '{}': {}; using default",
                field,
                error
            );
            default
        }
    }
}

fn text_field(root: &ElementSnapshot, selector: &str) -> Option<String> {
    root.select_one(selector)
        .map(|element| element.text().to_string())
        .filter(|text| !text.is_empty())
}

fn list_field(root: &ElementSnapshot, selector: &str) -> Result<Vec<String>, FieldError> {
    let Some(list) = root.select_one(selector) else {
        return Ok(Vec::new());
    };

    let mut values = Vec::new();
    for entry in list.select_all(LIST_ENTRY_SELECTOR) {
        let text = entry.text().to_string();
        if text.is_empty() {
            return Err(FieldError("blank list entry".to_string()));
        }
        values.push(text);
    }
    Ok(values)
}

/// Citation is present only when both the origin and the page number parse
fn citation_field(root: &ElementSnapshot) -> Result<Option<SourceCitation>, FieldError> {
    let Some(source) = root.select_one(SOURCE_SELECTOR) else {
        return Ok(None);
    };

    let origin = source
        .select_one(SOURCE_ORIGIN_SELECTOR)
        .map(|element| element.text().to_string())
        .filter(|origin| !origin.is_empty());

    let page_text = source
        .select_one(SOURCE_PAGE_SELECTOR)
        .map(|element| element.text().to_string())
        .filter(|page| !page.is_empty());

    match (origin, page_text) {
        (Some(origin), Some(page_text)) => {
            let page = page_text
                .parse::<u32>()
                .map_err(|error| FieldError(format!("page number '{}': {}", page_text, error)))?;
            Ok(Some(SourceCitation { origin, page }))
        }
        _ => Ok(None),
    }
}

/// Level associations in document order; duplicates are kept
fn levels_field(root: &ElementSnapshot) -> Result<Vec<LevelAssociation>, FieldError> {
    let Some(list) = root.select_one(LEVELS_SELECTOR) else {
        return Ok(Vec::new());
    };

    let mut levels = Vec::new();
    for entry in list.select_all(LIST_ENTRY_SELECTOR) {
        let category = entry
            .attr("data-category")
            .ok_or_else(|| FieldError("level entry missing data-category".to_string()))?
            .to_string();
        let raw_level = entry
            .attr("data-level")
            .ok_or_else(|| FieldError("level entry missing data-level".to_string()))?;
        let level = raw_level
            .parse::<u8>()
            .map_err(|error| FieldError(format!("level '{}': {}", raw_level, error)))?;
        levels.push(LevelAssociation { category, level });
    }
    Ok(levels)
}

/// Description keeps its markup: the inner HTML of the description block
fn description_field(root: &ElementSnapshot) -> Option<String> {
    root.select_one(DESCRIPTION_SELECTOR)
        .map(|element| element.inner_html().trim().to_string())
        .filter(|description| !description.is_empty())
}
