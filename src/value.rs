//! Typed capture of a record graph.
//!
//! [`Value`] sits between a Rust value and its flat form. It is produced in two
//! places:
//!
//! - the encoder builds a `Value` tree (with converters and field metadata
//!   applied) and then flattens it into keys;
//! - the decoder captures the destination's current state as a raw `Value`
//!   so keys absent from the form keep what the destination already held.
//!
//! [`to_value`](crate::to_value) exposes the raw capture:
//!
//! ```rust
//! use serde::Serialize;
//! use serde_form::{to_value, Scalar, Value};
//!
//! #[derive(Serialize)]
//! struct Point { x: i32, label: Option<String> }
//!
//! let value = to_value(&Point { x: 1, label: None }).unwrap();
//! assert_eq!(value.get("x"), Some(&Value::Scalar(Scalar::Int(1))));
//! assert_eq!(value.get("label"), Some(&Value::Absent));
//! ```

use crate::text;
use crate::{Error, Result};
use serde::de::{self, IntoDeserializer};
use serde::ser::{self, Serialize};
use std::fmt;

/// A leaf value in its typed form.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Char(char),
    Str(String),
}

impl Scalar {
    /// Returns `true` for the zero value of the scalar's type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_form::Scalar;
    ///
    /// assert!(Scalar::Int(0).is_zero());
    /// assert!(Scalar::Str(String::new()).is_zero());
    /// assert!(!Scalar::Bool(true).is_zero());
    /// ```
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Scalar::Bool(b) => !b,
            Scalar::Int(i) => *i == 0,
            Scalar::Uint(u) => *u == 0,
            Scalar::Float(f) => *f == 0.0,
            Scalar::Char(c) => *c == '\0',
            Scalar::Str(s) => s.is_empty(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Float(v) => write!(f, "{v}"),
            other => f.write_str(&text::render(other, 0)),
        }
    }
}

/// A captured record graph.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    /// `None`, unit, or a slot with nothing in it.
    #[default]
    Absent,
    Scalar(Scalar),
    /// A leaf already rendered to text by a converter.
    Text(String),
    List(Vec<Value>),
    /// Struct fields in declaration order, keyed by serde field name (raw
    /// capture) or external name (encoder output).
    Record(Vec<(String, Value)>),
    Map(Vec<(Value, Value)>),
    /// A data-carrying enum variant.
    Variant(&'static str, Box<Value>),
}

pub(crate) static ABSENT: Value = Value::Absent;

impl Value {
    /// Returns `true` if this value would be omitted by an `omitempty` field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Absent => true,
            Value::Scalar(s) => s.is_zero(),
            Value::Text(t) => t.is_empty(),
            Value::List(items) => items.is_empty(),
            Value::Map(entries) => entries.is_empty(),
            Value::Record(_) | Value::Variant(..) => false,
        }
    }

    /// Returns `true` for scalar and text leaves.
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(self, Value::Scalar(_) | Value::Text(_))
    }

    /// Returns the field named `key` of a record.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Returns the element at `index` of a list.
    #[must_use]
    pub fn index(&self, index: usize) -> Option<&Value> {
        match self {
            Value::List(items) => items.get(index),
            _ => None,
        }
    }

    /// Renders a leaf as text with the built-in table.
    pub(crate) fn render(&self, float_precision: usize) -> Option<String> {
        match self {
            Value::Scalar(s) => Some(text::render(s, float_precision)),
            Value::Text(t) => Some(t.clone()),
            _ => None,
        }
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        Value::Scalar(scalar)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Scalar(Scalar::Str(value.to_string()))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Scalar(Scalar::Int(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Scalar(Scalar::Bool(value))
    }
}

/// Serializes a value into its raw [`Value`] capture.
///
/// Raw capture keeps everything: serde field names, skipped-tag fields and
/// zero values. No converter is consulted.
pub struct ValueSerializer;

pub struct SerializeVec {
    vec: Vec<Value>,
    variant: Option<&'static str>,
}

pub struct SerializeRecord {
    fields: Vec<(String, Value)>,
    variant: Option<&'static str>,
}

pub struct SerializeMap {
    entries: Vec<(Value, Value)>,
    current_key: Option<Value>,
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeVec;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeRecord;
    type SerializeStructVariant = SerializeRecord;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Scalar(Scalar::Bool(v)))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::Scalar(Scalar::Int(v)))
    }

    fn serialize_i128(self, v: i128) -> Result<Value> {
        i64::try_from(v)
            .map(|i| Value::Scalar(Scalar::Int(i)))
            .map_err(|_| Error::unsupported_type("i128 outside the i64 range"))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        Ok(Value::Scalar(Scalar::Uint(v)))
    }

    fn serialize_u128(self, v: u128) -> Result<Value> {
        u64::try_from(v)
            .map(|u| Value::Scalar(Scalar::Uint(u)))
            .map_err(|_| Error::unsupported_type("u128 outside the u64 range"))
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        self.serialize_f64(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::Scalar(Scalar::Float(v)))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::Scalar(Scalar::Char(v)))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::Scalar(Scalar::Str(v.to_string())))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        let vec = v
            .iter()
            .map(|&b| Value::Scalar(Scalar::Uint(u64::from(b))))
            .collect();
        Ok(Value::List(vec))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Absent)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Absent)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Ok(Value::Absent)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::Scalar(Scalar::Str(variant.to_string())))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        Ok(Value::Variant(variant, Box::new(to_raw(value)?)))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len.unwrap_or(0), None))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, None))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, None))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, Some(variant)))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap {
            entries: Vec::new(),
            current_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<SerializeRecord> {
        Ok(SerializeRecord::new(len, None))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeRecord> {
        Ok(SerializeRecord::new(len, Some(variant)))
    }
}

impl SerializeVec {
    fn new(len: usize, variant: Option<&'static str>) -> Self {
        SerializeVec {
            vec: Vec::with_capacity(len),
            variant,
        }
    }

    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.vec.push(to_raw(value)?);
        Ok(())
    }

    fn finish(self) -> Value {
        wrap_variant(self.variant, Value::List(self.vec))
    }
}

impl SerializeRecord {
    fn new(len: usize, variant: Option<&'static str>) -> Self {
        SerializeRecord {
            fields: Vec::with_capacity(len),
            variant,
        }
    }

    fn push<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<()> {
        self.fields.push((key.to_string(), to_raw(value)?));
        Ok(())
    }

    fn finish(self) -> Value {
        wrap_variant(self.variant, Value::Record(self.fields))
    }
}

fn wrap_variant(variant: Option<&'static str>, value: Value) -> Value {
    match variant {
        Some(name) => Value::Variant(name, Box::new(value)),
        None => value,
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.current_key = Some(to_raw(key)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.entries.push((key, to_raw(value)?));
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Map(self.entries))
    }
}

impl ser::SerializeStruct for SerializeRecord {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(key, value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for SerializeRecord {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(key, value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

pub(crate) fn to_raw<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    value.serialize(ValueSerializer)
}

/// Reads a captured [`Value`] back into a Rust value.
///
/// [`Value::Absent`] reads as the zero value of whatever type asks for it:
/// `0`, `false`, `""`, `None`, an empty sequence, a record of zero fields, a
/// fixed array of zeros, an enum's first variant when that variant is a unit.
pub struct ValueDeserializer<'v> {
    value: &'v Value,
}

impl<'v> ValueDeserializer<'v> {
    #[must_use]
    pub fn new(value: &'v Value) -> Self {
        ValueDeserializer { value }
    }

    fn text(&self) -> Option<&'v str> {
        match self.value {
            Value::Scalar(Scalar::Str(s)) | Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

macro_rules! deserialize_number {
    ($method:ident, $visit:ident, $ty:ty) => {
        fn $method<V>(self, visitor: V) -> Result<V::Value>
        where
            V: de::Visitor<'de>,
        {
            match self.value {
                Value::Absent => visitor.$visit(<$ty>::default()),
                _ => match self.text() {
                    Some(t) => visitor.$visit(text::parse_number::<$ty>(t, stringify!($ty))?),
                    None => self.deserialize_any(visitor),
                },
            }
        }
    };
}

impl<'de, 'v> de::Deserializer<'de> for ValueDeserializer<'v> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Absent => visitor.visit_unit(),
            Value::Scalar(Scalar::Bool(b)) => visitor.visit_bool(*b),
            Value::Scalar(Scalar::Int(i)) => visitor.visit_i64(*i),
            Value::Scalar(Scalar::Uint(u)) => visitor.visit_u64(*u),
            Value::Scalar(Scalar::Float(f)) => visitor.visit_f64(*f),
            Value::Scalar(Scalar::Char(c)) => visitor.visit_char(*c),
            Value::Scalar(Scalar::Str(s)) | Value::Text(s) => visitor.visit_str(s),
            Value::List(items) => visitor.visit_seq(ListAccess::new(items, None)),
            Value::Record(fields) => visitor.visit_map(EntriesAccess::record(fields)),
            Value::Map(entries) => visitor.visit_map(EntriesAccess::map(entries)),
            Value::Variant(..) => visitor.visit_enum(VariantAccess::new(self.value)?),
        }
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Absent => visitor.visit_bool(false),
            _ => match self.text() {
                Some(t) => visitor.visit_bool(text::parse_bool(t)?),
                None => self.deserialize_any(visitor),
            },
        }
    }

    deserialize_number!(deserialize_i8, visit_i8, i8);
    deserialize_number!(deserialize_i16, visit_i16, i16);
    deserialize_number!(deserialize_i32, visit_i32, i32);
    deserialize_number!(deserialize_i64, visit_i64, i64);
    deserialize_number!(deserialize_i128, visit_i128, i128);
    deserialize_number!(deserialize_u8, visit_u8, u8);
    deserialize_number!(deserialize_u16, visit_u16, u16);
    deserialize_number!(deserialize_u32, visit_u32, u32);
    deserialize_number!(deserialize_u64, visit_u64, u64);
    deserialize_number!(deserialize_u128, visit_u128, u128);
    deserialize_number!(deserialize_f32, visit_f32, f32);
    deserialize_number!(deserialize_f64, visit_f64, f64);

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Absent => visitor.visit_char('\0'),
            _ => match self.text() {
                Some(t) => visitor.visit_char(text::parse_char(t)?),
                None => self.deserialize_any(visitor),
            },
        }
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Absent => visitor.visit_str(""),
            Value::Scalar(Scalar::Char(c)) => visitor.visit_char(*c),
            value => match value.render(6) {
                Some(t) => visitor.visit_string(t),
                None => self.deserialize_any(visitor),
            },
        }
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Absent => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::List(items) => visitor.visit_seq(ListAccess::new(items, None)),
            Value::Absent => visitor.visit_seq(ListAccess::new(&[], None)),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_tuple<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::List(items) => visitor.visit_seq(ListAccess::new(items, Some(len))),
            Value::Absent => visitor.visit_seq(ListAccess::new(&[], Some(len))),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Absent => visitor.visit_map(EntriesAccess::map(&[])),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Record(entries) => visitor.visit_map(FieldsAccess::new(fields, entries)),
            Value::Absent => visitor.visit_map(FieldsAccess::new(fields, &[])),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Absent => match variants.first() {
                Some(first) => visitor.visit_enum((*first).into_deserializer()),
                None => Err(Error::custom(format_args!("enum `{name}` has no variants"))),
            },
            Value::Variant(..) => visitor.visit_enum(VariantAccess::new(self.value)?),
            _ => match self.text() {
                Some(t) => visitor.visit_enum(t.into_deserializer()),
                None => Err(Error::custom(format_args!("expected a variant of `{name}`"))),
            },
        }
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }
}

/// Sequence access over captured elements, padded with `Absent` up to a
/// fixed length when one is given.
struct ListAccess<'v> {
    items: &'v [Value],
    index: usize,
    len: usize,
}

impl<'v> ListAccess<'v> {
    fn new(items: &'v [Value], fixed: Option<usize>) -> Self {
        ListAccess {
            items,
            index: 0,
            len: fixed.unwrap_or(items.len()),
        }
    }
}

impl<'de, 'v> de::SeqAccess<'de> for ListAccess<'v> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        if self.index >= self.len {
            return Ok(None);
        }
        let value = self.items.get(self.index).unwrap_or(&ABSENT);
        self.index += 1;
        seed.deserialize(ValueDeserializer::new(value)).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.len - self.index)
    }
}

/// Struct access driven by the declared field list; fields missing from the
/// capture read as `Absent`.
struct FieldsAccess<'v> {
    fields: std::slice::Iter<'static, &'static str>,
    entries: &'v [(String, Value)],
    value: Option<&'v Value>,
}

impl<'v> FieldsAccess<'v> {
    fn new(fields: &'static [&'static str], entries: &'v [(String, Value)]) -> Self {
        FieldsAccess {
            fields: fields.iter(),
            entries,
            value: None,
        }
    }
}

impl<'de, 'v> de::MapAccess<'de> for FieldsAccess<'v> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.fields.next() {
            Some(&tag) => {
                self.value = Some(
                    self.entries
                        .iter()
                        .find(|(k, _)| k == tag)
                        .map_or(&ABSENT, |(_, v)| v),
                );
                seed.deserialize(tag.into_deserializer()).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }
}

/// Map access over captured record fields or map entries.
struct EntriesAccess<'v> {
    entries: Box<dyn Iterator<Item = (EntryKey<'v>, &'v Value)> + 'v>,
    value: Option<&'v Value>,
}

enum EntryKey<'v> {
    Name(&'v str),
    Value(&'v Value),
}

impl<'v> EntriesAccess<'v> {
    fn record(fields: &'v [(String, Value)]) -> Self {
        EntriesAccess {
            entries: Box::new(fields.iter().map(|(k, v)| (EntryKey::Name(k), v))),
            value: None,
        }
    }

    fn map(entries: &'v [(Value, Value)]) -> Self {
        EntriesAccess {
            entries: Box::new(entries.iter().map(|(k, v)| (EntryKey::Value(k), v))),
            value: None,
        }
    }
}

impl<'de, 'v> de::MapAccess<'de> for EntriesAccess<'v> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.entries.next() {
            Some((key, value)) => {
                self.value = Some(value);
                match key {
                    EntryKey::Name(name) => seed.deserialize(name.into_deserializer()).map(Some),
                    EntryKey::Value(key) => seed.deserialize(ValueDeserializer::new(key)).map(Some),
                }
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }
}

struct VariantAccess<'v> {
    variant: &'static str,
    value: &'v Value,
}

impl<'v> VariantAccess<'v> {
    fn new(value: &'v Value) -> Result<Self> {
        match value {
            Value::Variant(variant, inner) => Ok(VariantAccess {
                variant: *variant,
                value: inner,
            }),
            _ => Err(Error::custom("expected an enum variant")),
        }
    }
}

impl<'de, 'v> de::EnumAccess<'de> for VariantAccess<'v> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let tag = IntoDeserializer::<Error>::into_deserializer(self.variant);
        let variant = seed.deserialize(tag)?;
        Ok((variant, self))
    }
}

impl<'de, 'v> de::VariantAccess<'de> for VariantAccess<'v> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        Ok(())
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        seed.deserialize(ValueDeserializer::new(self.value))
    }

    fn tuple_variant<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        de::Deserializer::deserialize_tuple(ValueDeserializer::new(self.value), len, visitor)
    }

    fn struct_variant<V>(self, fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        de::Deserializer::deserialize_struct(ValueDeserializer::new(self.value), "", fields, visitor)
    }
}
