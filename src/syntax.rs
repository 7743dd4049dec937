//! Form Key and Value Syntax
//!
//! This module documents how records map onto flat forms.
//!
//! # Overview
//!
//! A form is an ordered multi-map from string keys to lists of string values,
//! the shape of a URL query string or an HTML form post. Each key is a path
//! from the root record down to one leaf; each value list holds the text of
//! that leaf (or of every element, for a sequence of leaves).
//!
//! # Keys
//!
//! Keys are path segments joined by the separator (`.` by default, see
//! [`FormOptions::separator`](crate::FormOptions::separator)):
//!
//! | Position | Segment | Example |
//! |----------|---------|---------|
//! | Record field | the field's external name | `address.city` |
//! | Element of a sequence of records | decimal index | `lines.0.qty` |
//! | Map entry | the entry key as text | `labels.env` |
//!
//! **Rules**:
//! - No segment may be empty: `a..b`, `.a` and `a.` are malformed
//! - Index segments are plain ASCII digits; `-1`, `+1` and `0x1` are rejected
//! - Indexes above [`FormOptions::max_index`](crate::FormOptions::max_index)
//!   are rejected, so a single key cannot allocate an arbitrarily long sequence
//! - Keys that match no field are ignored
//!
//! # Values
//!
//! | Type | Encoded as | Decoded from |
//! |------|------------|--------------|
//! | Integers | decimal | decimal; `""` is `0` |
//! | Floats | fixed point with `float_precision` decimals (`1.618000`) | any float syntax; `""` is `0.0` |
//! | `bool` | `true` / `false` | `1 t T true TRUE True`, `0 f F false FALSE False`, `""` |
//! | `char` | the character | one character; `""` is `'\0'` |
//! | `String` | as is | as is |
//! | Unit enum variant | the variant name | the variant name |
//! | Unit, `()` | nothing | ignored |
//!
//! A scalar key with several values takes the first one. An enum no key
//! reaches starts at its first variant, which must then be a unit variant.
//!
//! # Sequences
//!
//! A sequence of leaves uses one key with one value per element:
//!
//! ```text
//! tags=red&tags=green&tags=blue
//! ```
//!
//! A sequence of records (or of sequences) uses an index segment per element:
//!
//! ```text
//! lines.0.sku=A-1&lines.0.qty=2&lines.1.sku=B-7
//! ```
//!
//! When decoding, a growable sequence is extended to the largest index seen;
//! elements between indexes keep their previous value or start at zero. A
//! fixed-size array rejects indexes and value counts past its length.
//!
//! # Field Annotations
//!
//! The serde name of a field carries its annotation:
//!
//! ```text
//! #[serde(rename = "q")]             external key "q"
//! #[serde(rename = "page,omitempty")] key "page", left out when empty
//! #[serde(rename = "-")]             never encoded or decoded
//! ```
//!
//! A value is empty when it is `false`, zero, `""`, `None`, or an empty
//! sequence or map. Records are never empty.
//!
//! Two fields of one record sharing an external name are a configuration
//! error, reported under that name in both directions.
//!
//! # Text Types
//!
//! A leaf type that parses itself from text is written with
//! [`text_leaf!`](crate::text_leaf) or [`from_text!`](crate::from_text), or
//! given a converter with [`Engine::register`](crate::Engine::register). A
//! registered converter wins over the type's own text capability.
//!
//! # Limitations
//!
//! - **Enum data**: variants carrying data have no text form unless a converter
//!   is registered for the enum
//! - **Flattening**: `#[serde(flatten)]` and field aliases are not supported
//! - **Map keys**: must render as text without the separator
//! - **Repeated `None`**: `None` elements of a sequence of leaves produce no
//!   value, so element positions shift on the way back
//! - **Rejected elements**: an element whose type rejects its text starts at
//!   its zero value instead; when the type has no zero value (`NonZeroU32`)
//!   the element is left out and later elements move down one index
//! - **Type names**: converters are found by serde name, so two types sharing
//!   a name cannot both have one

// This module contains only documentation; no implementation code
