//! Field annotations and the per-record metadata cache.
//!
//! A field's annotation travels in its serde name, set with
//! `#[serde(rename = "...")]`:
//!
//! | Serde name | External key | Encode | Decode |
//! |------------|--------------|--------|--------|
//! | `id` (unannotated) | `id` | always | yes |
//! | `"user_id"` | `user_id` | always | yes |
//! | `"-"` | none | never | never |
//! | `"note,omitempty"` | `note` | unless empty | yes |
//!
//! Fields marked `#[serde(skip)]` never reach the engine at all.
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_form::Engine;
//!
//! #[derive(Serialize, Deserialize)]
//! struct Search {
//!     #[serde(rename = "q")]
//!     query: String,
//!     #[serde(rename = "page,omitempty")]
//!     page: u32,
//!     #[serde(rename = "-")]
//!     session: String,
//! }
//!
//! let engine = Engine::new();
//! let meta = engine.record_meta::<Search>().unwrap();
//! assert_eq!(meta.field_by_name("page").map(|f| f.omit_empty), Some(true));
//! assert!(meta.field_by_name("query").is_none());
//! assert!(meta.fields[2].skip);
//! ```

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

const OMIT_EMPTY: &str = "omitempty";

/// Resolved annotation of one field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldMeta {
    /// The serde field name, as written in the annotation.
    pub tag: &'static str,
    /// The external key segment.
    pub name: &'static str,
    /// The field is ignored in both directions.
    pub skip: bool,
    /// The field is left out of the encoded form when empty.
    pub omit_empty: bool,
}

impl FieldMeta {
    /// Parses a field annotation.
    ///
    /// Malformed annotations degrade to plain names: an empty name part keeps
    /// the whole tag as the name, and unknown modifiers are ignored.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_form::FieldMeta;
    ///
    /// let meta = FieldMeta::parse("f04,omitempty");
    /// assert_eq!(meta.name, "f04");
    /// assert!(meta.omit_empty);
    ///
    /// assert!(FieldMeta::parse("-").skip);
    /// assert_eq!(FieldMeta::parse(",omitempty").name, ",omitempty");
    /// ```
    #[must_use]
    pub fn parse(tag: &'static str) -> Self {
        if tag == "-" {
            return FieldMeta {
                tag,
                name: tag,
                skip: true,
                omit_empty: false,
            };
        }

        match tag.split_once(',') {
            Some((name, modifiers)) if !name.is_empty() => FieldMeta {
                tag,
                name,
                skip: false,
                omit_empty: modifiers.split(',').any(|m| m.trim() == OMIT_EMPTY),
            },
            _ => FieldMeta {
                tag,
                name: tag,
                skip: false,
                omit_empty: false,
            },
        }
    }
}

/// Resolved metadata of a record type, in declaration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordMeta {
    pub name: &'static str,
    pub fields: Vec<FieldMeta>,
    duplicates: Vec<&'static str>,
}

impl RecordMeta {
    fn resolve(name: &'static str, tags: &'static [&'static str]) -> Self {
        let fields: Vec<FieldMeta> = tags.iter().map(|&tag| FieldMeta::parse(tag)).collect();

        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for field in fields.iter().filter(|f| !f.skip) {
            if !seen.insert(field.name) && !duplicates.contains(&field.name) {
                duplicates.push(field.name);
            }
        }

        RecordMeta {
            name,
            fields,
            duplicates,
        }
    }

    /// Returns the field answering to an external key segment.
    ///
    /// Skipped fields and names shared by several fields answer to nothing.
    #[must_use]
    pub fn field_by_name(&self, name: &str) -> Option<&FieldMeta> {
        if self.is_duplicate(name) {
            return None;
        }
        self.fields.iter().find(|f| !f.skip && f.name == name)
    }

    /// Returns `true` if several fields share the external name.
    #[must_use]
    pub fn is_duplicate(&self, name: &str) -> bool {
        self.duplicates.iter().any(|d| *d == name)
    }

    /// External names shared by more than one field.
    #[must_use]
    pub fn duplicates(&self) -> &[&'static str] {
        &self.duplicates
    }
}

type RecordKey = (&'static str, &'static [&'static str]);

/// Thread-safe cache of resolved field and record metadata.
///
/// Every entry is computed once on first use and never changes afterwards.
#[derive(Debug, Default)]
pub struct FieldCache {
    fields: RwLock<HashMap<&'static str, FieldMeta>>,
    records: RwLock<HashMap<RecordKey, Arc<RecordMeta>>>,
}

impl FieldCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the metadata of one field annotation.
    pub fn field(&self, tag: &'static str) -> FieldMeta {
        if let Some(meta) = self.fields.read().get(tag) {
            return *meta;
        }
        *self
            .fields
            .write()
            .entry(tag)
            .or_insert_with(|| FieldMeta::parse(tag))
    }

    /// Returns the metadata of a record with the given serde field list.
    pub fn record(&self, name: &'static str, fields: &'static [&'static str]) -> Arc<RecordMeta> {
        if let Some(meta) = self.records.read().get(&(name, fields)) {
            return Arc::clone(meta);
        }
        let mut records = self.records.write();
        let meta = records.entry((name, fields)).or_insert_with(|| {
            tracing::trace!(record = name, fields = fields.len(), "resolved record metadata");
            Arc::new(RecordMeta::resolve(name, fields))
        });
        Arc::clone(meta)
    }

    /// Number of cached records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_annotations() {
        assert_eq!(
            FieldMeta::parse("f01"),
            FieldMeta {
                tag: "f01",
                name: "f01",
                skip: false,
                omit_empty: false
            }
        );

        let meta = FieldMeta::parse("f04,omitempty");
        assert_eq!(meta.name, "f04");
        assert!(meta.omit_empty && !meta.skip);

        let meta = FieldMeta::parse("name,unknown");
        assert_eq!(meta.name, "name");
        assert!(!meta.omit_empty);

        // "-," names a field "-" rather than skipping it.
        let meta = FieldMeta::parse("-,");
        assert_eq!(meta.name, "-");
        assert!(!meta.skip);
    }

    #[test]
    fn test_record_is_cached_once() {
        static FIELDS: &[&str] = &["a", "b,omitempty", "-"];

        let cache = FieldCache::new();
        let first = cache.record("R", FIELDS);
        let second = cache.record("R", FIELDS);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert_eq!(*first, *second);
        assert_eq!(first.field_by_name("b").map(|f| f.tag), Some("b,omitempty"));
        assert!(first.field_by_name("-").is_none());
    }

    #[test]
    fn test_duplicate_names() {
        static FIELDS: &[&str] = &["x", "x,omitempty", "y"];

        let meta = FieldCache::new().record("Dup", FIELDS);
        assert_eq!(meta.duplicates(), &["x"]);
        assert!(meta.field_by_name("x").is_none());
        assert!(meta.field_by_name("y").is_some());
    }
}
