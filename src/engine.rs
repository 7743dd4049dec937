//! The form engine.
//!
//! An [`Engine`] owns the options, the field metadata cache and the converter
//! registry. Register converters once, then share the engine: encoding and
//! decoding only take `&self`, and an engine is `Send + Sync`.
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_form::Engine;
//!
//! #[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
//! struct Login {
//!     user: String,
//!     #[serde(rename = "remember,omitempty")]
//!     remember: bool,
//! }
//!
//! let engine = Engine::new();
//! let (form, errors) = engine.encode(&Login { user: "ada".into(), remember: false });
//! assert!(errors.is_empty());
//! assert_eq!(form.keys().collect::<Vec<_>>(), vec!["user"]);
//!
//! let mut login = Login::default();
//! engine.decode(&form, &mut login).unwrap();
//! assert_eq!(login.user, "ada");
//! ```

use crate::de;
use crate::error::{Error, MultiError, Result};
use crate::map::FormMap;
use crate::meta::{FieldCache, RecordMeta};
use crate::options::FormOptions;
use crate::probe::{probe, TypeShape};
use crate::registry::ConverterRegistry;
use crate::ser;
use crate::value::Value;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Encodes records into forms and decodes forms into records.
#[derive(Debug, Default)]
pub struct Engine {
    options: FormOptions,
    fields: FieldCache,
    converters: ConverterRegistry,
}

impl Engine {
    /// Creates an engine with default options and no converters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(options: FormOptions) -> Self {
        Engine {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    /// The field metadata cache shared by every call on this engine.
    pub fn fields(&self) -> &FieldCache {
        &self.fields
    }

    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    /// Registers text conversions in both directions for `T`.
    ///
    /// A registered converter wins over the built-in scalar handling and over
    /// the type's own text capability.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`] when `T` has no serde identity, or
    /// when another type with the same serde name already has a converter.
    pub fn register<T, E>(
        &mut self,
        to_text: impl Fn(&T) -> String + Send + Sync + 'static,
        from_text: impl Fn(&str) -> std::result::Result<T, E> + Send + Sync + 'static,
    ) -> Result<()>
    where
        T: Serialize + DeserializeOwned + 'static,
        E: fmt::Display,
    {
        self.converters.register(to_text, from_text)
    }

    /// Registers only the to-text direction for `T`.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn register_encoder<T>(
        &mut self,
        to_text: impl Fn(&T) -> String + Send + Sync + 'static,
    ) -> Result<()>
    where
        T: DeserializeOwned + 'static,
    {
        self.converters.register_encoder(to_text)
    }

    /// Registers only the from-text direction for `T`.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn register_decoder<T, E>(
        &mut self,
        from_text: impl Fn(&str) -> std::result::Result<T, E> + Send + Sync + 'static,
    ) -> Result<()>
    where
        T: Serialize + DeserializeOwned + 'static,
        E: fmt::Display,
    {
        self.converters.register_decoder(from_text)
    }

    /// Returns the cached field metadata of the record type `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`] when `T` is not a struct with named
    /// fields.
    pub fn record_meta<T: DeserializeOwned>(&self) -> Result<Arc<RecordMeta>> {
        match probe::<T>() {
            TypeShape::Record { name, fields } => Ok(self.fields.record(name, fields)),
            _ => Err(Error::UnsupportedType(format!(
                "{} is not a record",
                std::any::type_name::<T>()
            ))),
        }
    }

    /// Encodes `value` into a flat form.
    ///
    /// The form holds every key that could be produced; the errors hold every
    /// value that could not, keyed by the key it would have had.
    pub fn encode<T>(&self, value: &T) -> (FormMap, MultiError)
    where
        T: ?Sized + Serialize,
    {
        ser::encode(self, value)
    }

    /// Decodes `form` into `dest`.
    ///
    /// Keys the form does not mention leave `dest` as it was, and a field
    /// that fails to decode keeps its previous value. When the record as a
    /// whole cannot be rebuilt, `dest` is not modified at all.
    ///
    /// # Errors
    ///
    /// Returns every failure, keyed by the form key it belongs to.
    pub fn decode<T>(&self, form: &FormMap, dest: &mut T) -> std::result::Result<(), MultiError>
    where
        T: Serialize + DeserializeOwned,
    {
        de::decode_into(self, form, dest)
    }

    /// Decodes `form` into a new value, starting from zero values.
    ///
    /// Returns `None` only when the record as a whole cannot be built.
    pub fn decode_new<T>(&self, form: &FormMap) -> (Option<T>, MultiError)
    where
        T: DeserializeOwned,
    {
        de::decode_over(self, form, &Value::Absent)
    }
}
