//! Key parsing for decoding.
//!
//! Flat keys are split on the separator and merged into a trie, so that each
//! level of the destination graph sees only the keys below it. A node may hold
//! values (the key ends there), children (longer keys continue through it), or
//! both.

use crate::error::{Error, MultiError};
use crate::map::FormMap;
use crate::options::FormOptions;
use indexmap::IndexMap;

/// Values of a key that ends at a trie node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Leaf<'f> {
    /// The key exactly as it appeared in the form.
    pub key: &'f str,
    pub values: &'f [String],
}

impl<'f> Leaf<'f> {
    pub fn first(&self) -> Option<&'f str> {
        self.values.first().map(String::as_str)
    }
}

#[derive(Debug, Default)]
pub(crate) struct Trie<'f> {
    pub leaf: Option<Leaf<'f>>,
    pub children: IndexMap<&'f str, Trie<'f>>,
}

impl<'f> Trie<'f> {
    /// Builds the key trie of a form.
    ///
    /// Keys with an empty segment are reported and left out. Keys with no
    /// values are ignored.
    pub fn build(form: &'f FormMap, options: &FormOptions) -> (Self, MultiError) {
        let mut root = Trie::default();
        let mut errors = MultiError::new();

        for (key, values) in form {
            if values.is_empty() {
                continue;
            }
            if key.split(options.separator).any(str::is_empty) {
                errors.insert(
                    key.as_str(),
                    Error::MalformedKey { key: key.clone() }.located(key, key),
                );
                continue;
            }

            let node = key
                .split(options.separator)
                .fold(&mut root, |node, segment| node.children.entry(segment).or_default());
            node.leaf = Some(Leaf {
                key: key.as_str(),
                values: values.as_slice(),
            });
        }

        (root, errors)
    }

    pub fn child(&self, segment: &str) -> Option<&Trie<'f>> {
        self.children.get(segment)
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Parses a sequence index segment.
pub(crate) fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}
