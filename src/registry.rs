//! User-supplied text conversions, keyed by type.
//!
//! A registered converter takes precedence over both the built-in scalar table
//! and a type's own text capability. Converters are looked up by the type's
//! serde identity: its name for structs, newtypes and enums, its kind for
//! primitives.
//!
//! Only that identity is visible while a value is traversed, so two Rust
//! types with the same serde name (`a::Id` and `b::Id`) cannot be told apart.
//! The registry therefore gives each name to the first type that claims it and
//! refuses a converter for any other type under that name. A newtype with no
//! converter of its own does not inherit the converter of the primitive it
//! wraps.
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_form::Engine;
//!
//! #[derive(Serialize, Deserialize, Default)]
//! struct Cents(u64);
//!
//! #[derive(Serialize, Deserialize, Default)]
//! struct Order { total: Cents }
//!
//! let mut engine = Engine::new();
//! engine
//!     .register::<Cents, _>(
//!         |c| format!("{}.{:02}", c.0 / 100, c.0 % 100),
//!         |s| -> Result<Cents, &'static str> {
//!             let (units, cents) = s.split_once('.').ok_or("missing cents")?;
//!             let units: u64 = units.parse().map_err(|_| "bad units")?;
//!             let cents: u64 = cents.parse().map_err(|_| "bad cents")?;
//!             Ok(Cents(units * 100 + cents))
//!         },
//!     )
//!     .unwrap();
//!
//! let (form, _) = engine.encode(&Order { total: Cents(1999) });
//! assert_eq!(form.get("total"), Some("19.99"));
//!
//! let (order, errors) = engine.decode_new::<Order>(&form);
//! assert!(errors.is_empty());
//! assert_eq!(order.unwrap().total.0, 1999);
//! ```

use crate::probe::probe;
use crate::value::{to_raw, Value, ValueDeserializer};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Renders a raw capture of a value as text.
pub type EncodeFn = Arc<dyn Fn(&Value) -> Result<String> + Send + Sync>;

/// Parses text into a raw capture of a value.
pub type DecodeFn = Arc<dyn Fn(&str) -> Result<Value> + Send + Sync>;

#[derive(Clone)]
struct Converter {
    type_name: &'static str,
    encode: Option<EncodeFn>,
    decode: Option<DecodeFn>,
}

/// Converters registered on one engine.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    converters: HashMap<&'static str, Converter>,
}

impl ConverterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers both directions for `T`. A later registration replaces each
    /// half independently.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`] when `T` has no serde identity, such
    /// as `Vec<_>`, `Option<_>` or a foreign type that serializes as a plain
    /// string, or when another type with the same serde name already holds a
    /// converter.
    pub fn register<T, E>(
        &mut self,
        to_text: impl Fn(&T) -> String + Send + Sync + 'static,
        from_text: impl Fn(&str) -> std::result::Result<T, E> + Send + Sync + 'static,
    ) -> Result<()>
    where
        T: Serialize + DeserializeOwned + 'static,
        E: fmt::Display,
    {
        self.register_encoder(to_text)?;
        self.register_decoder(from_text)
    }

    /// Registers the to-text half for `T`.
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
        let key = key_of::<T>()?;
        let encode: EncodeFn = Arc::new(move |raw: &Value| {
            let value = T::deserialize(ValueDeserializer::new(raw))?;
            Ok(to_text(&value))
        });
        self.claim::<T>(key)?.encode = Some(encode);
        tracing::debug!(key, "registered encoder");
        Ok(())
    }

    /// Registers the from-text half for `T`.
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
        let key = key_of::<T>()?;
        let decode: DecodeFn = Arc::new(move |text: &str| {
            let value = from_text(text).map_err(|e| Error::conversion(text, key, e))?;
            to_raw(&value)
        });
        self.claim::<T>(key)?.decode = Some(decode);
        tracing::debug!(key, "registered decoder");
        Ok(())
    }

    fn claim<T>(&mut self, key: &'static str) -> Result<&mut Converter> {
        let type_name = std::any::type_name::<T>();
        let converter = self.converters.entry(key).or_insert_with(|| Converter {
            type_name,
            encode: None,
            decode: None,
        });
        if converter.type_name != type_name {
            tracing::warn!(
                key,
                owner = converter.type_name,
                rejected = type_name,
                "serde name already has a converter for another type"
            );
            return Err(Error::UnsupportedType(format!(
                "{type_name} shares the serde name `{key}` with {}, which already has a converter",
                converter.type_name
            )));
        }
        Ok(converter)
    }

    /// Returns the Rust type holding the converters under `key`.
    #[must_use]
    pub fn owner(&self, key: &str) -> Option<&'static str> {
        self.converters.get(key).map(|c| c.type_name)
    }

    /// Returns the to-text function registered under `key`.
    #[must_use]
    pub fn encoder(&self, key: &str) -> Option<&EncodeFn> {
        self.converters.get(key).and_then(|c| c.encode.as_ref())
    }

    /// Returns the from-text function registered under `key`.
    #[must_use]
    pub fn decoder(&self, key: &str) -> Option<&DecodeFn> {
        self.converters.get(key).and_then(|c| c.decode.as_ref())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.converters.keys().collect();
        keys.sort();
        f.debug_struct("ConverterRegistry")
            .field("keys", &keys)
            .finish()
    }
}

fn key_of<T: DeserializeOwned>() -> Result<&'static str> {
    let type_name = std::any::type_name::<T>();
    probe::<T>().registry_key(type_name).ok_or_else(|| {
        Error::UnsupportedType(format!(
            "{type_name} has no serde identity to register a converter for; wrap it in a newtype"
        ))
    })
}
