//! Discovers how a type presents itself to serde, without a value.
//!
//! Deserializing `T` from [`Probe`] records the first request `T` makes (its
//! primitive kind, its name, or its record fields) and then fails on purpose.
//! The recorded shape is the type's identity for the converter registry and
//! the field cache.

use crate::{Error, Result};
use serde::de::{self, DeserializeOwned, Visitor};

/// The serde-visible shape of a type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeShape {
    /// A primitive, by kind: `"i32"`, `"bool"`, `"str"`, ...
    Scalar(&'static str),
    /// A newtype, tuple struct, unit struct or enum, by name.
    Named(&'static str),
    /// A struct with named fields.
    Record {
        name: &'static str,
        fields: &'static [&'static str],
    },
    /// Anything without an identity: sequences, maps, options, tuples.
    Other,
}

impl TypeShape {
    /// Returns the converter registry key for a type with this shape.
    ///
    /// Primitive kinds only identify the primitive itself; a foreign type that
    /// merely serializes as a string (such as `Ipv4Addr`) has no key.
    pub(crate) fn registry_key(self, type_name: &str) -> Option<&'static str> {
        match self {
            TypeShape::Scalar("str") => (type_name == "alloc::string::String").then_some("str"),
            TypeShape::Scalar(kind) => (type_name == kind).then_some(kind),
            TypeShape::Named(name) | TypeShape::Record { name, .. } => Some(name),
            TypeShape::Other => None,
        }
    }
}

/// Probes the shape of `T`.
///
/// # Examples
///
/// ```rust
/// use serde::Deserialize;
/// use serde_form::probe::{probe, TypeShape};
///
/// #[derive(Deserialize)]
/// struct UserId(u64);
///
/// #[derive(Deserialize)]
/// struct User { id: UserId, name: String }
///
/// assert_eq!(probe::<u8>(), TypeShape::Scalar("u8"));
/// assert_eq!(probe::<UserId>(), TypeShape::Named("UserId"));
/// assert_eq!(
///     probe::<User>(),
///     TypeShape::Record { name: "User", fields: &["id", "name"] }
/// );
/// assert_eq!(probe::<Vec<User>>(), TypeShape::Other);
/// ```
pub fn probe<T: DeserializeOwned>() -> TypeShape {
    let mut shape = TypeShape::Other;
    // The probe always fails once the shape is recorded.
    let _ = T::deserialize(Probe { shape: &mut shape });
    shape
}

struct Probe<'s> {
    shape: &'s mut TypeShape,
}

impl Probe<'_> {
    fn record<T>(self, shape: TypeShape) -> Result<T> {
        *self.shape = shape;
        Err(Error::Message("type probe".to_string()))
    }
}

macro_rules! probe_scalar {
    ($($method:ident => $kind:literal),* $(,)?) => {
        $(
            fn $method<V>(self, _visitor: V) -> Result<V::Value>
            where
                V: Visitor<'de>,
            {
                self.record(TypeShape::Scalar($kind))
            }
        )*
    };
}

macro_rules! probe_other {
    ($($method:ident),* $(,)?) => {
        $(
            fn $method<V>(self, _visitor: V) -> Result<V::Value>
            where
                V: Visitor<'de>,
            {
                self.record(TypeShape::Other)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for Probe<'_> {
    type Error = Error;

    probe_scalar! {
        deserialize_bool => "bool",
        deserialize_i8 => "i8",
        deserialize_i16 => "i16",
        deserialize_i32 => "i32",
        deserialize_i64 => "i64",
        deserialize_i128 => "i128",
        deserialize_u8 => "u8",
        deserialize_u16 => "u16",
        deserialize_u32 => "u32",
        deserialize_u64 => "u64",
        deserialize_u128 => "u128",
        deserialize_f32 => "f32",
        deserialize_f64 => "f64",
        deserialize_char => "char",
        deserialize_str => "str",
        deserialize_string => "str",
    }

    probe_other! {
        deserialize_any,
        deserialize_bytes,
        deserialize_byte_buf,
        deserialize_option,
        deserialize_unit,
        deserialize_seq,
        deserialize_map,
        deserialize_identifier,
        deserialize_ignored_any,
    }

    fn deserialize_unit_struct<V>(self, name: &'static str, _visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.record(TypeShape::Named(name))
    }

    fn deserialize_newtype_struct<V>(self, name: &'static str, _visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.record(TypeShape::Named(name))
    }

    fn deserialize_tuple<V>(self, _len: usize, _visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.record(TypeShape::Other)
    }

    fn deserialize_tuple_struct<V>(
        self,
        name: &'static str,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.record(TypeShape::Named(name))
    }

    fn deserialize_struct<V>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.record(TypeShape::Record { name, fields })
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        _variants: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.record(TypeShape::Named(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Deserialize)]
    #[allow(dead_code)]
    enum Color {
        Red,
        Green,
    }

    #[derive(Deserialize)]
    #[allow(dead_code)]
    struct Pair(i32, i32);

    #[test]
    fn test_probe_shapes() {
        assert_eq!(probe::<String>(), TypeShape::Scalar("str"));
        assert_eq!(probe::<f64>(), TypeShape::Scalar("f64"));
        assert_eq!(probe::<Color>(), TypeShape::Named("Color"));
        assert_eq!(probe::<Pair>(), TypeShape::Named("Pair"));
        assert_eq!(probe::<Box<Color>>(), TypeShape::Named("Color"));
        assert_eq!(probe::<Option<Color>>(), TypeShape::Other);
        assert_eq!(probe::<HashMap<String, i32>>(), TypeShape::Other);
        assert_eq!(probe::<(i32, i32)>(), TypeShape::Other);
    }

    #[test]
    fn test_registry_key() {
        let key = |shape: TypeShape, name: &str| shape.registry_key(name);

        assert_eq!(key(probe::<String>(), std::any::type_name::<String>()), Some("str"));
        assert_eq!(key(probe::<i32>(), std::any::type_name::<i32>()), Some("i32"));
        assert_eq!(key(probe::<Color>(), "whatever"), Some("Color"));
        assert_eq!(
            key(
                probe::<std::net::Ipv4Addr>(),
                std::any::type_name::<std::net::Ipv4Addr>()
            ),
            None
        );
        assert_eq!(key(TypeShape::Other, "Vec"), None);
    }
}
