//! # serde_form
//!
//! Bidirectional mapping between flat form data (`key → [values]`, as in URL
//! query strings and HTML form posts) and typed Rust records.
//!
//! ## What it does
//!
//! A nested record is flattened into path-shaped keys such as `user.name` or
//! `items.2.qty`, and a set of such keys is decoded back into the nested
//! record, growing sequences and filling nested records as needed.
//!
//! ## Key Features
//!
//! - **Serde Compatible**: works with `#[derive(Serialize, Deserialize)]` types;
//!   field annotations travel in `#[serde(rename = "name,omitempty")]`
//! - **Partial Decoding**: decode into an existing value; fields the form
//!   does not mention keep their values
//! - **Failure Isolation**: one bad field never aborts the rest; every failure
//!   is reported under its key in a [`MultiError`]
//! - **Custom Converters**: per-engine text conversions for any named type
//! - **No Unsafe Code**
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! serde_form = "0.1"
//! serde = { version = "1.0", features = ["derive"] }
//! ```
//!
//! ### Encoding and Decoding
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_form::{from_form, to_form};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Address {
//!     city: String,
//!     zip: String,
//! }
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Signup {
//!     email: String,
//!     age: u8,
//!     interests: Vec<String>,
//!     address: Address,
//! }
//!
//! let signup = Signup {
//!     email: "ada@example.com".to_string(),
//!     age: 36,
//!     interests: vec!["math".to_string(), "engines".to_string()],
//!     address: Address { city: "London".to_string(), zip: "W1".to_string() },
//! };
//!
//! let form = to_form(&signup).unwrap();
//! assert_eq!(form.get("address.city"), Some("London"));
//! assert_eq!(form.get_all("interests").map(<[String]>::len), Some(2));
//!
//! let back: Signup = from_form(&form).unwrap();
//! assert_eq!(back, signup);
//! ```
//!
//! ### Collecting Errors
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_form::{form, Engine};
//!
//! #[derive(Serialize, Deserialize, Default, Debug)]
//! struct Query { page: u32, size: u32, sort: String }
//!
//! let mut query = Query { size: 25, ..Query::default() };
//! let errors = Engine::new()
//!     .decode(&form! { "page" => ["-1"], "sort" => ["name"] }, &mut query)
//!     .unwrap_err();
//!
//! assert_eq!(query.sort, "name");
//! assert_eq!(query.size, 25);
//! assert!(errors.get("page").is_some());
//! ```
//!
//! ## Key Syntax
//!
//! See the [`syntax`] module for the full description of keys, values and
//! field annotations.
//!
//! ## Examples
//!
//! The `demos/` directory holds runnable examples:
//!
//! - **`simple.rs`** - encoding and decoding a flat record
//! - **`nested_records.rs`** - nested records, indexed sequences, partial decoding
//! - **`custom_converters.rs`** - registering text conversions for foreign types
//!
//! Run any example with: `cargo run --example <name>`

pub mod de;
pub mod engine;
pub mod error;
pub mod macros;
pub mod map;
pub mod meta;
pub mod options;
mod path;
pub mod probe;
pub mod registry;
pub mod ser;
pub mod syntax;
pub mod text;
pub mod value;

pub use engine::Engine;
pub use error::{Error, MultiError, Result};
pub use map::FormMap;
pub use meta::{FieldCache, FieldMeta, RecordMeta};
pub use options::{FormOptions, DEFAULT_MAX_INDEX};
pub use registry::ConverterRegistry;
pub use ser::FieldSerializer;
pub use text::TextVisitor;
pub use value::{Scalar, Value, ValueDeserializer, ValueSerializer};

use serde::de::DeserializeOwned;
use serde::Serialize;

#[doc(hidden)]
pub mod __private {
    pub use serde;
}

/// Encode any `T: Serialize` into a form.
///
/// # Examples
///
/// ```rust
/// use serde_form::to_form;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let form = to_form(&Point { x: 1, y: 2 }).unwrap();
/// assert_eq!(form.get("y"), Some("2"));
/// ```
///
/// # Errors
///
/// Returns [`Error::Multi`] if any field cannot be encoded.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_form<T>(value: &T) -> Result<FormMap>
where
    T: ?Sized + Serialize,
{
    to_form_with_options(value, FormOptions::default())
}

/// Encode any `T: Serialize` into a form with custom options.
///
/// # Examples
///
/// ```rust
/// use serde_form::{to_form_with_options, FormOptions};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Size { w: f32 }
///
/// #[derive(Serialize)]
/// struct Panel { size: Size }
///
/// let options = FormOptions::new().with_separator('-').with_float_precision(1);
/// let form = to_form_with_options(&Panel { size: Size { w: 0.3 } }, options).unwrap();
/// assert_eq!(form.get("size-w"), Some("0.3"));
/// ```
///
/// # Errors
///
/// Returns [`Error::Multi`] if any field cannot be encoded.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_form_with_options<T>(value: &T, options: FormOptions) -> Result<FormMap>
where
    T: ?Sized + Serialize,
{
    let (form, errors) = Engine::with_options(options).encode(value);
    errors.into_result()?;
    Ok(form)
}

/// Decode an instance of type `T` from a form.
///
/// Missing keys decode as zero values.
///
/// # Examples
///
/// ```rust
/// use serde_form::{form, from_form};
/// use serde::Deserialize;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let point: Point = from_form(&form! { "x" => ["1"] }).unwrap();
/// assert_eq!(point, Point { x: 1, y: 0 });
/// ```
///
/// # Errors
///
/// Returns [`Error::Multi`] if any key fails to decode.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_form<T>(form: &FormMap) -> Result<T>
where
    T: DeserializeOwned,
{
    from_form_with_options(form, FormOptions::default())
}

/// Decode an instance of type `T` from a form with custom options.
///
/// # Errors
///
/// Returns [`Error::Multi`] if any key fails to decode.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_form_with_options<T>(form: &FormMap, options: FormOptions) -> Result<T>
where
    T: DeserializeOwned,
{
    let (value, errors) = Engine::with_options(options).decode_new(form);
    errors.into_result()?;
    value.ok_or_else(|| Error::custom("form could not be decoded"))
}

/// Decode a form into an existing value, keeping fields the form does not
/// mention.
///
/// # Examples
///
/// ```rust
/// use serde_form::{decode_into, form};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Settings { theme: String, volume: u8 }
///
/// let mut settings = Settings { theme: "dark".into(), volume: 3 };
/// decode_into(&form! { "volume" => ["7"] }, &mut settings).unwrap();
/// assert_eq!((settings.theme.as_str(), settings.volume), ("dark", 7));
/// ```
///
/// # Errors
///
/// Returns [`Error::Multi`] if any key fails to decode. Fields that decoded
/// successfully are still written.
pub fn decode_into<T>(form: &FormMap, dest: &mut T) -> Result<()>
where
    T: Serialize + DeserializeOwned,
{
    Engine::new().decode(form, dest)?;
    Ok(())
}

/// Convert any `T: Serialize` to a [`Value`] tree, with no annotations or
/// converters applied.
///
/// # Examples
///
/// ```rust
/// use serde_form::{to_value, Scalar, Value};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let value = to_value(&Point { x: 1, y: 2 }).unwrap();
/// assert_eq!(value.get("x"), Some(&Value::Scalar(Scalar::Int(1))));
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be represented.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    value.serialize(ValueSerializer)
}
