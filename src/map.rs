//! Ordered multi-map type for flat form data.
//!
//! This module provides [`FormMap`], a wrapper around [`IndexMap`] from keys to
//! ordered lists of values. It models URL query strings and HTML form
//! submissions, where one key may repeat.
//!
//! ## Why IndexMap?
//!
//! - **Deterministic output**: encoded keys follow field declaration order
//! - **Multiplicity**: each key keeps its values in submission order
//! - **Compatibility**: converts from and into `HashMap<String, Vec<String>>`
//!
//! ## Examples
//!
//! ```rust
//! use serde_form::FormMap;
//!
//! let mut form = FormMap::new();
//! form.append("tag", "rust");
//! form.append("tag", "serde");
//! form.insert("page", vec!["2".to_string()]);
//!
//! assert_eq!(form.len(), 2);
//! assert_eq!(form.get("page"), Some("2"));
//! assert_eq!(form.get_all("tag"), Some(&["rust".to_string(), "serde".to_string()][..]));
//! ```

use indexmap::IndexMap;
use std::collections::HashMap;

/// An ordered map of string keys to ordered lists of string values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormMap(IndexMap<String, Vec<String>>);

impl FormMap {
    /// Creates an empty `FormMap`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_form::FormMap;
    ///
    /// let form = FormMap::new();
    /// assert!(form.is_empty());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        FormMap(IndexMap::new())
    }

    /// Creates an empty `FormMap` with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        FormMap(IndexMap::with_capacity(capacity))
    }

    /// Replaces the values of `key`, returning the previous ones.
    pub fn insert(&mut self, key: impl Into<String>, values: Vec<String>) -> Option<Vec<String>> {
        self.0.insert(key.into(), values)
    }

    /// Appends one value to `key`, creating the key if needed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_form::FormMap;
    ///
    /// let mut form = FormMap::new();
    /// form.append("id", "1");
    /// form.append("id", "2");
    /// assert_eq!(form.get_all("id").map(<[String]>::len), Some(2));
    /// ```
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    /// Appends several values to `key`, creating the key if needed.
    pub fn extend_values<I, S>(&mut self, key: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0
            .entry(key.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
    }

    /// Collects repeated `(key, value)` pairs, grouping values by key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_form::FormMap;
    ///
    /// let form = FormMap::from_pairs([("a", "1"), ("b", "2"), ("a", "3")]);
    /// assert_eq!(form.len(), 2);
    /// assert_eq!(form.get_all("a"), Some(&["1".to_string(), "3".to_string()][..]));
    /// ```
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = FormMap::new();
        for (k, v) in pairs {
            map.append(k, v);
        }
        map
    }

    /// Returns the first value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    /// Returns every value of `key`, in order.
    #[must_use]
    pub fn get_all(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    /// Returns `true` if the map contains `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Removes `key`, returning its values.
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.0.shift_remove(key)
    }

    /// Returns the number of keys in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the map contains no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys of the map, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Vec<String>> {
        self.0.keys()
    }

    /// Returns an iterator over the keys and their values, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Vec<String>> {
        self.0.iter()
    }

    /// Returns an iterator over every `(key, value)` pair, repeating the key
    /// once per value.
    ///
    /// This is the shape a query string or `application/x-www-form-urlencoded`
    /// writer consumes.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }
}

impl From<HashMap<String, Vec<String>>> for FormMap {
    fn from(map: HashMap<String, Vec<String>>) -> Self {
        FormMap(map.into_iter().collect())
    }
}

impl From<FormMap> for HashMap<String, Vec<String>> {
    fn from(map: FormMap) -> Self {
        map.0.into_iter().collect()
    }
}

impl IntoIterator for FormMap {
    type Item = (String, Vec<String>);
    type IntoIter = indexmap::map::IntoIter<String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a FormMap {
    type Item = (&'a String, &'a Vec<String>);
    type IntoIter = indexmap::map::Iter<'a, String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, Vec<String>)> for FormMap {
    fn from_iter<T: IntoIterator<Item = (String, Vec<String>)>>(iter: T) -> Self {
        FormMap(IndexMap::from_iter(iter))
    }
}
