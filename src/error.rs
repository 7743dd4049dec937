//! Error types for form encoding and decoding.
//!
//! Encoding and decoding never stop at the first bad field. Each failure is
//! recorded against the flat key it belongs to and collected into a
//! [`MultiError`]; the rest of the form (or record) is still processed.
//!
//! ## Error Categories
//!
//! - **Path errors**: a key is malformed, indexes past a fixed array, or
//!   continues below a scalar
//! - **Conversion errors**: a string does not parse into the target scalar, or a
//!   value has no text form (e.g. a data-carrying enum variant)
//! - **Configuration errors**: two sibling fields share one external name
//!
//! ## Examples
//!
//! ```rust
//! use serde::Deserialize;
//! use serde_form::{form, Engine};
//!
//! #[derive(Deserialize, Default, Debug)]
//! struct Page { number: u32, size: u32 }
//!
//! let engine = Engine::new();
//! let (page, errors) = engine.decode_new::<Page>(&form! {
//!     "number" => ["two"],
//!     "size" => ["50"],
//! });
//!
//! assert_eq!(page.unwrap().size, 50);
//! assert_eq!(errors.len(), 1);
//! assert!(errors.get("number").is_some());
//! ```

use indexmap::IndexMap;
use std::fmt;
use thiserror::Error;

/// Represents all possible errors produced while encoding or decoding forms.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A key with an empty path segment, such as `a..b` or `.a`.
    #[error("malformed key {key:?}: empty path segment")]
    MalformedKey { key: String },

    /// A non-numeric segment where a sequence index was expected.
    #[error("invalid index {segment:?} in key {key:?}")]
    InvalidIndex { key: String, segment: String },

    /// An index past the capacity of a fixed array, or above the configured limit.
    #[error("index {index} out of range in key {key:?} (capacity {capacity})")]
    IndexOutOfRange {
        key: String,
        index: usize,
        capacity: usize,
    },

    /// More values than a fixed array can hold.
    #[error("{count} values for key {key:?} exceed array length {capacity}")]
    TooManyValues {
        key: String,
        count: usize,
        capacity: usize,
    },

    /// A key continues below a scalar, e.g. `id.x` when `id` is an integer.
    #[error("key {key:?} continues below a scalar value")]
    NotALeaf { key: String },

    /// Values assigned directly to a record, sequence of records or map.
    #[error("key {key:?} addresses a record, not a value")]
    NotARecord { key: String },

    /// A string that cannot be converted into the target type.
    #[error("cannot convert {value:?} to {expected}: {reason}")]
    Conversion {
        value: String,
        expected: String,
        reason: String,
    },

    /// A type with no form representation.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// Two sibling fields of one record share an external name.
    #[error("duplicate field name {name:?} in record `{record}`")]
    DuplicateField { record: String, name: String },

    /// An error located at a flat key.
    ///
    /// `path` is the structural position of the failing slot. It equals `key`
    /// except for elements of repeated values, which share their parent's key.
    #[error("{key}: {source}")]
    Field {
        key: String,
        path: String,
        source: Box<Error>,
    },

    /// Several independent field errors, returned by the strict helpers.
    #[error("{0}")]
    Multi(MultiError),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),

    /// Generic message
    #[error("{0}")]
    Message(String),
}

impl Error {
    /// Creates a conversion error for a value that failed to parse.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_form::Error;
    ///
    /// let err = Error::conversion("abc", "i32", "invalid digit found in string");
    /// assert!(err.to_string().contains("abc"));
    /// ```
    pub fn conversion<R: fmt::Display>(value: &str, expected: &str, reason: R) -> Self {
        Error::Conversion {
            value: value.to_string(),
            expected: expected.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates an unsupported type error.
    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_form::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Attaches a location to this error unless it already carries one.
    ///
    /// The innermost location wins, so errors can be located at every level of
    /// a traversal and keep the most precise key.
    #[must_use]
    pub fn located(self, path: &str, key: &str) -> Self {
        match self {
            Error::Field { .. } => self,
            other => Error::Field {
                key: key.to_string(),
                path: path.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Returns the flat key this error is located at, if any.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Error::Field { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Returns the structural path this error is located at, if any.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Error::Field { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Independent per-key errors from one encode or decode call.
///
/// Keys keep the order in which their first error was recorded; recording a
/// second error for the same key keeps the first one.
///
/// # Examples
///
/// ```rust
/// use serde_form::{Error, MultiError};
///
/// let mut errors = MultiError::new();
/// assert_eq!(errors.to_string(), "(0 errors)");
///
/// errors.insert("a", Error::custom("bad a"));
/// errors.insert("b", Error::custom("bad b"));
/// errors.insert("c", Error::custom("bad c"));
/// assert_eq!(errors.to_string(), "Error: bad a (and 2 other errors)");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MultiError(IndexMap<String, Error>);

impl MultiError {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        MultiError(IndexMap::new())
    }

    /// Records `error` under `key` unless the key already has an error.
    pub fn insert(&mut self, key: impl Into<String>, error: Error) {
        self.0.entry(key.into()).or_insert(error);
    }

    /// Records a located error under its own key.
    ///
    /// Errors without a location are recorded under the empty key.
    pub fn push(&mut self, error: Error) {
        let key = error.key().unwrap_or_default().to_string();
        self.insert(key, error);
    }

    /// Moves every error of `other` into this collection.
    pub fn extend(&mut self, other: MultiError) {
        for (key, error) in other.0 {
            self.insert(key, error);
        }
    }

    /// Returns the error recorded for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Error> {
        self.0.get(key)
    }

    /// Returns `true` if an error is recorded for `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns the number of keys with an error.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no error was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys and their errors, in recording order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Error> {
        self.0.iter()
    }

    /// Returns the keys with an error, in recording order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Error> {
        self.0.keys()
    }

    /// Converts an empty collection into `Ok(())`.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one error was recorded.
    pub fn into_result(self) -> std::result::Result<(), MultiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(first) = self.0.values().next() else {
            return f.write_str("(0 errors)");
        };

        match self.0.len() {
            1 => write!(f, "{first}"),
            2 => write!(f, "{first} (and 1 other error)"),
            n => write!(f, "{first} (and {} other errors)", n - 1),
        }
    }
}

impl std::error::Error for MultiError {}

impl IntoIterator for MultiError {
    type Item = (String, Error);
    type IntoIter = indexmap::map::IntoIter<String, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a MultiError {
    type Item = (&'a String, &'a Error);
    type IntoIter = indexmap::map::Iter<'a, String, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<MultiError> for Error {
    fn from(errors: MultiError) -> Self {
        Error::Multi(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_wording() {
        let mut errors = MultiError::new();
        errors.insert("a", Error::Message("first".to_string()));
        assert_eq!(errors.to_string(), "first");

        errors.insert("b", Error::Message("second".to_string()));
        assert_eq!(errors.to_string(), "first (and 1 other error)");

        errors.insert("c", Error::Message("third".to_string()));
        errors.insert("d", Error::Message("fourth".to_string()));
        assert_eq!(errors.to_string(), "first (and 3 other errors)");
    }

    #[test]
    fn test_first_error_per_key_is_kept() {
        let mut errors = MultiError::new();
        errors.insert("a", Error::Message("first".to_string()));
        errors.insert("a", Error::Message("second".to_string()));

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("a").map(ToString::to_string).as_deref(), Some("first"));
    }

    #[test]
    fn test_located_keeps_innermost_location() {
        let err = Error::custom("boom")
            .located("a.0.b", "a.0.b")
            .located("a", "a");

        assert_eq!(err.key(), Some("a.0.b"));
        assert_eq!(err.path(), Some("a.0.b"));
        assert_eq!(err.to_string(), "a.0.b: Error: boom");
    }

    #[test]
    fn test_push_uses_error_key() {
        let mut errors = MultiError::new();
        errors.push(Error::custom("x").located("f.1", "f"));
        errors.push(Error::custom("root"));

        assert!(errors.contains_key("f"));
        assert!(errors.contains_key(""));
        assert!(errors.into_result().is_err());
    }
}
