//! Configuration options for form encoding and decoding.
//!
//! [`FormOptions`] controls the key syntax and a few conversion details shared
//! by both directions.
//!
//! ## Examples
//!
//! ```rust
//! use serde_form::{Engine, FormOptions};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Inner { x: f64 }
//!
//! #[derive(Serialize)]
//! struct Outer { inner: Inner }
//!
//! let options = FormOptions::new()
//!     .with_separator('_')
//!     .with_float_precision(2);
//! let engine = Engine::with_options(options);
//!
//! let (form, errors) = engine.encode(&Outer { inner: Inner { x: 1.5 } });
//! assert!(errors.is_empty());
//! assert_eq!(form.get("inner_x"), Some("1.50"));
//! ```

/// Default upper bound for a sequence index in a decoded key.
pub const DEFAULT_MAX_INDEX: usize = 16_000;

/// Configuration options for form encoding and decoding.
///
/// # Examples
///
/// ```rust
/// use serde_form::FormOptions;
///
/// let options = FormOptions::new();
/// assert_eq!(options.separator, '.');
/// assert_eq!(options.float_precision, 6);
///
/// let options = FormOptions::new().with_separator(':').with_max_index(99);
/// assert_eq!(options.separator, ':');
/// assert_eq!(options.max_index, 99);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FormOptions {
    /// Character between path segments of a key.
    pub separator: char,
    /// Number of decimal places used when rendering floats.
    pub float_precision: usize,
    /// Largest sequence index a decoded key may address.
    pub max_index: usize,
}

impl Default for FormOptions {
    fn default() -> Self {
        FormOptions {
            separator: '.',
            float_precision: 6,
            max_index: DEFAULT_MAX_INDEX,
        }
    }
}

impl FormOptions {
    /// Creates default options (`.` separator, six float decimals).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the path segment separator.
    #[must_use]
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Sets the number of decimal places used for floats.
    #[must_use]
    pub fn with_float_precision(mut self, precision: usize) -> Self {
        self.float_precision = precision;
        self
    }

    /// Sets the largest sequence index accepted while decoding.
    ///
    /// Keys such as `items.99999999` would otherwise grow a sequence to an
    /// arbitrary length.
    #[must_use]
    pub fn with_max_index(mut self, max_index: usize) -> Self {
        self.max_index = max_index;
        self
    }

    /// Joins a key prefix and a segment with the configured separator.
    pub(crate) fn join(&self, prefix: &str, segment: &str) -> String {
        if prefix.is_empty() {
            segment.to_string()
        } else {
            let mut key = String::with_capacity(prefix.len() + 1 + segment.len());
            key.push_str(prefix);
            key.push(self.separator);
            key.push_str(segment);
            key
        }
    }

    /// Returns the parent of a key, or `None` for a top-level key.
    pub(crate) fn parent<'k>(&self, key: &'k str) -> Option<&'k str> {
        if key.is_empty() {
            return None;
        }
        Some(key.rfind(self.separator).map_or("", |i| &key[..i]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_and_parent() {
        let options = FormOptions::new();
        assert_eq!(options.join("", "a"), "a");
        assert_eq!(options.join("a.0", "b"), "a.0.b");

        assert_eq!(options.parent("a.0.b"), Some("a.0"));
        assert_eq!(options.parent("a"), Some(""));
        assert_eq!(options.parent(""), None);
    }
}
