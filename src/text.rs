//! Built-in scalar text conversions and the self-describing text capability.
//!
//! Leaf values cross the form boundary as strings. This module holds the
//! built-in table used when no converter is registered for a type:
//!
//! | Rust type | Encoded as | Decoded from |
//! |-----------|------------|--------------|
//! | integers | decimal | decimal, `""` as `0` |
//! | `f32`/`f64` | fixed decimals (`1.618000`) | any float syntax, `""` as `0` |
//! | `bool` | `true`/`false` | `1 t T TRUE true True` and `0 f F FALSE false False`, `""` as `false` |
//! | `char` | the character | exactly one character, `""` as `'\0'` |
//! | `String` | as-is | as-is |
//! | unit enum variant | variant name | variant name |
//!
//! A leaf type can also parse itself: [`TextVisitor`] drives any
//! [`FromStr`] type, and the [`text_leaf!`](crate::text_leaf) and
//! [`from_text!`](crate::from_text) macros wire it into serde.

use crate::value::Scalar;
use crate::{Error, Result};
use serde::de::{self, Deserialize, Visitor};
use std::fmt;
use std::str::FromStr;

/// Parses a boolean the way form libraries commonly do.
pub(crate) fn parse_bool(text: &str) -> Result<bool> {
    match text {
        "" | "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        _ => Err(Error::conversion(text, "bool", "expected true or false")),
    }
}

/// Parses a number, reading an empty string as zero.
pub(crate) fn parse_number<T>(text: &str, expected: &str) -> Result<T>
where
    T: FromStr + Default,
    T::Err: fmt::Display,
{
    if text.is_empty() {
        return Ok(T::default());
    }
    text.parse()
        .map_err(|e: T::Err| Error::conversion(text, expected, e))
}

/// Parses a single character, reading an empty string as `'\0'`.
pub(crate) fn parse_char(text: &str) -> Result<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Ok('\0'),
        (Some(c), None) => Ok(c),
        _ => Err(Error::conversion(text, "char", "expected a single character")),
    }
}

/// Renders a scalar with the built-in table.
pub(crate) fn render(scalar: &Scalar, float_precision: usize) -> String {
    match scalar {
        Scalar::Bool(b) => b.to_string(),
        Scalar::Int(i) => i.to_string(),
        Scalar::Uint(u) => u.to_string(),
        Scalar::Float(f) => format!("{f:.float_precision$}"),
        Scalar::Char(c) => c.to_string(),
        Scalar::Str(s) => s.clone(),
    }
}

/// A visitor that builds `T` from its text form through [`FromStr`].
///
/// It accepts a plain string and a newtype wrapping an optional string, so a
/// type using it deserializes from form values as well as from self-describing
/// formats such as JSON. A missing value (a slot no key reached) is an error
/// unless the visitor was built with [`or_default`](Self::or_default).
///
/// # Examples
///
/// ```rust
/// use serde::{Deserialize, Deserializer};
/// use serde_form::text::TextVisitor;
/// use std::net::Ipv4Addr;
///
/// struct Gateway(Ipv4Addr);
///
/// impl<'de> Deserialize<'de> for Gateway {
///     fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
///         d.deserialize_str(TextVisitor::<Ipv4Addr>::new()).map(Gateway)
///     }
/// }
///
/// let form = serde_form::form! { "gw" => ["10.0.0.1"] };
/// #[derive(Deserialize)]
/// struct Net { gw: Gateway }
/// let net: Net = serde_form::from_form(&form).unwrap();
/// assert_eq!(net.gw.0, Ipv4Addr::new(10, 0, 0, 1));
/// ```
pub struct TextVisitor<T> {
    zero: Option<fn() -> T>,
}

impl<T> TextVisitor<T> {
    /// A visitor for which a missing value is an error.
    #[must_use]
    pub fn new() -> Self {
        TextVisitor { zero: None }
    }
}

impl<T: Default> TextVisitor<T> {
    /// A visitor that reads a missing value as `T::default()`.
    #[must_use]
    pub fn or_default() -> Self {
        TextVisitor {
            zero: Some(T::default),
        }
    }
}

impl<T> Default for TextVisitor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'de, T> Visitor<'de> for TextVisitor<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    type Value = T;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string")
    }

    fn visit_str<E>(self, value: &str) -> std::result::Result<T, E>
    where
        E: de::Error,
    {
        value.parse().map_err(E::custom)
    }

    fn visit_newtype_struct<D>(self, deserializer: D) -> std::result::Result<T, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) => text.parse().map_err(de::Error::custom),
            None => self
                .zero
                .map(|zero| zero())
                .ok_or_else(|| de::Error::custom("missing text value")),
        }
    }
}
