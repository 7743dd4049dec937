//! Form encoding.
//!
//! This module provides the [`FieldSerializer`] that turns a Rust value into a
//! [`Value`] tree with field annotations and converters applied, and the
//! flattening pass that turns that tree into a [`FormMap`].
//!
//! ## Overview
//!
//! - **Declaration order**: keys follow field order, sequences keep element order
//! - **Repetition**: a sequence of leaves becomes one key with several values
//! - **Indexing**: a sequence of records becomes `key.0.field`, `key.1.field`, ...
//! - **Omission**: `None`, skipped fields and empty `omitempty` fields produce no key
//!
//! A value that cannot be rendered is reported under its key and left out;
//! the rest of the record is still encoded.
//!
//! ## Usage
//!
//! ```rust
//! use serde::Serialize;
//! use serde_form::Engine;
//!
//! #[derive(Serialize)]
//! struct Line { sku: String, qty: u32 }
//!
//! #[derive(Serialize)]
//! struct Cart { id: u64, lines: Vec<Line>, coupons: Vec<String> }
//!
//! let cart = Cart {
//!     id: 9,
//!     lines: vec![Line { sku: "A-1".into(), qty: 2 }],
//!     coupons: vec!["SPRING".into(), "VIP".into()],
//! };
//!
//! let (form, errors) = Engine::new().encode(&cart);
//! assert!(errors.is_empty());
//! assert_eq!(form.get("id"), Some("9"));
//! assert_eq!(form.get("lines.0.sku"), Some("A-1"));
//! assert_eq!(form.get_all("coupons").map(<[String]>::len), Some(2));
//! ```

use crate::engine::Engine;
use crate::error::{Error, MultiError, Result};
use crate::map::FormMap;
use crate::options::FormOptions;
use crate::registry::EncodeFn;
use crate::value::{self, to_raw, Scalar, Value, ValueSerializer};
use serde::ser::{self, Serialize};
use std::cell::RefCell;
use tracing::debug;

struct EncodeContext<'a> {
    engine: &'a Engine,
    errors: RefCell<MultiError>,
}

/// Serializes one position of a record graph into a [`Value`].
///
/// Failures below a record field or sequence element are recorded on the
/// context; the failing part is left out and serialization continues.
#[derive(Clone)]
pub struct FieldSerializer<'a> {
    ctx: &'a EncodeContext<'a>,
    path: String,
    /// Set for the value inside a newtype without a converter of its own;
    /// that value keeps the built-in conversion of its primitive kind.
    in_newtype: bool,
}

impl<'a> FieldSerializer<'a> {
    fn options(&self) -> &'a FormOptions {
        self.ctx.engine.options()
    }

    fn child(&self, segment: &str) -> FieldSerializer<'a> {
        FieldSerializer {
            ctx: self.ctx,
            path: self.options().join(&self.path, segment),
            in_newtype: false,
        }
    }

    fn report(&self, error: Error) {
        debug!(key = %self.path, %error, "isolated encode error");
        self.ctx
            .errors
            .borrow_mut()
            .push(error.located(&self.path, &self.path));
    }

    /// Serializes `value` here, reporting a failure instead of returning it.
    fn capture<T: ?Sized + Serialize>(&self, value: &T) -> Option<Value> {
        match value.serialize(self.clone()) {
            Ok(value) => Some(value),
            Err(error) => {
                self.report(error);
                None
            }
        }
    }

    fn encoder(&self, key: &str) -> Option<EncodeFn> {
        self.ctx.engine.converters().encoder(key).cloned()
    }

    /// A primitive, rendered by a converter registered for its kind if any.
    fn leaf(&self, kind: &str, raw: Value) -> Result<Value> {
        if self.in_newtype {
            return Ok(raw);
        }
        match self.ctx.engine.converters().encoder(kind) {
            Some(encode) => encode(&raw).map(Value::Text),
            None => Ok(raw),
        }
    }

    fn convert(encode: &EncodeFn, raw: &Value) -> Result<Value> {
        encode(raw).map(Value::Text)
    }
}

impl<'a> ser::Serializer for FieldSerializer<'a> {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SeqSerializer<'a>;
    type SerializeTuple = SeqSerializer<'a>;
    type SerializeTupleStruct = TupleStructSerializer<'a>;
    type SerializeTupleVariant = ConvertedSerializer;
    type SerializeMap = MapSerializer<'a>;
    type SerializeStruct = StructSerializer<'a>;
    type SerializeStructVariant = ConvertedSerializer;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        self.leaf("bool", Value::Scalar(Scalar::Bool(v)))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        self.leaf("i8", Value::Scalar(Scalar::Int(i64::from(v))))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        self.leaf("i16", Value::Scalar(Scalar::Int(i64::from(v))))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        self.leaf("i32", Value::Scalar(Scalar::Int(i64::from(v))))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        self.leaf("i64", Value::Scalar(Scalar::Int(v)))
    }

    fn serialize_i128(self, v: i128) -> Result<Value> {
        let raw = ser::Serializer::serialize_i128(ValueSerializer, v)?;
        self.leaf("i128", raw)
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        self.leaf("u8", Value::Scalar(Scalar::Uint(u64::from(v))))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        self.leaf("u16", Value::Scalar(Scalar::Uint(u64::from(v))))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        self.leaf("u32", Value::Scalar(Scalar::Uint(u64::from(v))))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        self.leaf("u64", Value::Scalar(Scalar::Uint(v)))
    }

    fn serialize_u128(self, v: u128) -> Result<Value> {
        let raw = ser::Serializer::serialize_u128(ValueSerializer, v)?;
        self.leaf("u128", raw)
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        self.leaf("f32", Value::Scalar(Scalar::Float(f64::from(v))))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        self.leaf("f64", Value::Scalar(Scalar::Float(v)))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        self.leaf("char", Value::Scalar(Scalar::Char(v)))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        self.leaf("str", Value::Scalar(Scalar::Str(v.to_string())))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        let items = v
            .iter()
            .map(|&b| self.leaf("u8", Value::Scalar(Scalar::Uint(u64::from(b)))))
            .collect::<Result<_>>()?;
        Ok(Value::List(items))
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

    fn serialize_unit_struct(self, name: &'static str) -> Result<Value> {
        match self.encoder(name) {
            Some(encode) => Self::convert(&encode, &Value::Absent),
            None => Ok(Value::Absent),
        }
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        let raw = Value::Scalar(Scalar::Str(variant.to_string()));
        match self.encoder(name) {
            Some(encode) => Self::convert(&encode, &raw),
            None => Ok(raw),
        }
    }

    fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        match self.encoder(name) {
            Some(encode) => Self::convert(&encode, &to_raw(value)?),
            None => value.serialize(FieldSerializer {
                in_newtype: true,
                ..self
            }),
        }
    }

    fn serialize_newtype_variant<T>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        match self.encoder(name) {
            Some(encode) => {
                let raw = Value::Variant(variant, Box::new(to_raw(value)?));
                Self::convert(&encode, &raw)
            }
            None => Err(unrenderable_variant(name, variant)),
        }
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqSerializer<'a>> {
        Ok(SeqSerializer::new(self, len.unwrap_or(0)))
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqSerializer<'a>> {
        Ok(SeqSerializer::new(self, len))
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        len: usize,
    ) -> Result<TupleStructSerializer<'a>> {
        match self.encoder(name) {
            Some(encode) => {
                let raw = ser::Serializer::serialize_tuple_struct(ValueSerializer, name, len)?;
                Ok(TupleStructSerializer::Converted(ConvertedSerializer {
                    raw: RawCompound::Seq(raw),
                    encode,
                }))
            }
            None => Ok(TupleStructSerializer::Items(SeqSerializer::new(self, len))),
        }
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<ConvertedSerializer> {
        let encode = self
            .encoder(name)
            .ok_or_else(|| unrenderable_variant(name, variant))?;
        let raw = ser::Serializer::serialize_tuple_variant(
            ValueSerializer,
            name,
            variant_index,
            variant,
            len,
        )?;
        Ok(ConvertedSerializer {
            raw: RawCompound::Seq(raw),
            encode,
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<MapSerializer<'a>> {
        Ok(MapSerializer {
            entries: Vec::with_capacity(len.unwrap_or(0)),
            key: None,
            ser: FieldSerializer {
                in_newtype: false,
                ..self
            },
        })
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> Result<StructSerializer<'a>> {
        match self.encoder(name) {
            Some(encode) => {
                let raw = ser::Serializer::serialize_struct(ValueSerializer, name, len)?;
                Ok(StructSerializer::Converted(ConvertedSerializer {
                    raw: RawCompound::Record(raw),
                    encode,
                }))
            }
            None => Ok(StructSerializer::Fields(RecordSerializer {
                name,
                fields: Vec::with_capacity(len),
                seen: Vec::with_capacity(len),
                ser: self,
            })),
        }
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<ConvertedSerializer> {
        let encode = self
            .encoder(name)
            .ok_or_else(|| unrenderable_variant(name, variant))?;
        let raw = ser::Serializer::serialize_struct_variant(
            ValueSerializer,
            name,
            variant_index,
            variant,
            len,
        )?;
        Ok(ConvertedSerializer {
            raw: RawCompound::Record(raw),
            encode,
        })
    }
}

fn unrenderable_variant(name: &str, variant: &str) -> Error {
    Error::UnsupportedType(format!(
        "variant {name}::{variant} carries data and no converter is registered for {name}"
    ))
}

pub struct SeqSerializer<'a> {
    ser: FieldSerializer<'a>,
    items: Vec<Value>,
}

impl<'a> SeqSerializer<'a> {
    fn new(ser: FieldSerializer<'a>, len: usize) -> Self {
        SeqSerializer {
            ser,
            items: Vec::with_capacity(len),
        }
    }

    fn push<T: ?Sized + Serialize>(&mut self, value: &T) {
        let element = self.ser.child(&self.items.len().to_string());
        // A failed element keeps its index so later elements keep theirs.
        let value = element.capture(value).unwrap_or(Value::Absent);
        self.items.push(value);
    }
}

impl<'a> ser::SerializeSeq for SeqSerializer<'a> {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::List(self.items))
    }
}

impl<'a> ser::SerializeTuple for SeqSerializer<'a> {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::List(self.items))
    }
}

pub enum TupleStructSerializer<'a> {
    Items(SeqSerializer<'a>),
    Converted(ConvertedSerializer),
}

impl<'a> ser::SerializeTupleStruct for TupleStructSerializer<'a> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        match self {
            TupleStructSerializer::Items(seq) => {
                seq.push(value);
                Ok(())
            }
            TupleStructSerializer::Converted(converted) => converted.push(value),
        }
    }

    fn end(self) -> Result<Value> {
        match self {
            TupleStructSerializer::Items(seq) => Ok(Value::List(seq.items)),
            TupleStructSerializer::Converted(converted) => converted.finish(),
        }
    }
}

pub struct MapSerializer<'a> {
    ser: FieldSerializer<'a>,
    entries: Vec<(Value, Value)>,
    /// The rendered key awaiting its value; `Some(None)` for a key that
    /// could not be rendered.
    key: Option<Option<String>>,
}

impl<'a> MapSerializer<'a> {
    fn segment(&self, key: &Value) -> Option<String> {
        let options = self.ser.options();
        match key.render(options.float_precision) {
            Some(segment) if !segment.is_empty() && !segment.contains(options.separator) => {
                Some(segment)
            }
            Some(segment) => {
                self.ser.report(Error::UnsupportedType(format!(
                    "map key {segment:?} is empty or contains the separator {:?}",
                    options.separator
                )));
                None
            }
            None => {
                self.ser
                    .report(Error::unsupported_type("map keys must be scalars"));
                None
            }
        }
    }
}

impl<'a> ser::SerializeMap for MapSerializer<'a> {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let segment = self.ser.capture(key).and_then(|key| self.segment(&key));
        self.key = Some(segment);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        match self.key.take() {
            Some(Some(segment)) => {
                if let Some(value) = self.ser.child(&segment).capture(value) {
                    self.entries.push((Value::Text(segment), value));
                }
                Ok(())
            }
            Some(None) => Ok(()),
            None => Err(Error::custom("serialize_value called without serialize_key")),
        }
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Map(self.entries))
    }
}

pub struct RecordSerializer<'a> {
    name: &'static str,
    ser: FieldSerializer<'a>,
    fields: Vec<(String, Value)>,
    seen: Vec<&'static str>,
}

impl<'a> RecordSerializer<'a> {
    fn push<T: ?Sized + Serialize>(&mut self, tag: &'static str, value: &T) {
        let meta = self.ser.ctx.engine.fields().field(tag);
        if meta.skip {
            return;
        }

        let field = self.ser.child(meta.name);
        if self.seen.contains(&meta.name) {
            field.report(Error::DuplicateField {
                record: self.name.to_string(),
                name: meta.name.to_string(),
            });
            return;
        }
        self.seen.push(meta.name);

        match field.capture(value) {
            Some(value) if meta.omit_empty && value.is_empty() => {}
            Some(value) => self.fields.push((meta.name.to_string(), value)),
            None => {}
        }
    }
}

pub enum StructSerializer<'a> {
    Fields(RecordSerializer<'a>),
    Converted(ConvertedSerializer),
}

impl<'a> ser::SerializeStruct for StructSerializer<'a> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        match self {
            StructSerializer::Fields(record) => {
                record.push(key, value);
                Ok(())
            }
            StructSerializer::Converted(converted) => converted.push_field(key, value),
        }
    }

    fn end(self) -> Result<Value> {
        match self {
            StructSerializer::Fields(record) => Ok(Value::Record(record.fields)),
            StructSerializer::Converted(converted) => converted.finish(),
        }
    }
}

enum RawCompound {
    Seq(value::SerializeVec),
    Record(value::SerializeRecord),
}

/// Collects the raw capture of a compound value claimed by a converter.
pub struct ConvertedSerializer {
    raw: RawCompound,
    encode: EncodeFn,
}

impl ConvertedSerializer {
    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        match &mut self.raw {
            RawCompound::Seq(seq) => ser::SerializeTupleVariant::serialize_field(seq, value),
            RawCompound::Record(_) => Err(Error::custom("unnamed field in a record")),
        }
    }

    fn push_field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<()> {
        match &mut self.raw {
            RawCompound::Record(record) => {
                ser::SerializeStructVariant::serialize_field(record, key, value)
            }
            RawCompound::Seq(_) => Err(Error::custom("named field in a sequence")),
        }
    }

    fn finish(self) -> Result<Value> {
        let raw = match self.raw {
            RawCompound::Seq(seq) => ser::SerializeTupleVariant::end(seq)?,
            RawCompound::Record(record) => ser::SerializeStructVariant::end(record)?,
        };
        FieldSerializer::convert(&self.encode, &raw)
    }
}

impl ser::SerializeTupleVariant for ConvertedSerializer {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        self.finish()
    }
}

impl ser::SerializeStructVariant for ConvertedSerializer {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push_field(key, value)
    }

    fn end(self) -> Result<Value> {
        self.finish()
    }
}

/// Appends the keys of `value` under `key`.
fn flatten(key: &str, value: &Value, options: &FormOptions, form: &mut FormMap) {
    let precision = options.float_precision;
    match value {
        Value::Absent | Value::Variant(..) => {}
        Value::Scalar(_) | Value::Text(_) => {
            if let Some(text) = value.render(precision) {
                form.append(key, text);
            }
        }
        Value::List(items) if items.iter().all(|v| v.is_leaf() || *v == Value::Absent) => {
            let values: Vec<String> = items.iter().filter_map(|v| v.render(precision)).collect();
            if !values.is_empty() {
                form.extend_values(key, values);
            }
        }
        Value::List(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten(&options.join(key, &index.to_string()), item, options, form);
            }
        }
        Value::Record(fields) => {
            for (name, field) in fields {
                flatten(&options.join(key, name), field, options, form);
            }
        }
        Value::Map(entries) => {
            for (entry_key, entry) in entries {
                if let Some(segment) = entry_key.render(precision) {
                    flatten(&options.join(key, &segment), entry, options, form);
                }
            }
        }
    }
}

/// Encodes `value` into a form with the engine's options and converters.
pub(crate) fn encode<T>(engine: &Engine, value: &T) -> (FormMap, MultiError)
where
    T: ?Sized + Serialize,
{
    let ctx = EncodeContext {
        engine,
        errors: RefCell::new(MultiError::new()),
    };
    let root = FieldSerializer {
        ctx: &ctx,
        path: String::new(),
        in_newtype: false,
    };

    let mut form = FormMap::new();
    match value.serialize(root) {
        Ok(tree @ (Value::Record(_) | Value::Map(_))) => {
            flatten("", &tree, engine.options(), &mut form);
        }
        Ok(_) => ctx.errors.borrow_mut().insert(
            "",
            Error::unsupported_type("the root of a form must be a record or a map"),
        ),
        Err(error) => ctx.errors.borrow_mut().push(error),
    }

    (form, ctx.errors.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Point {
        x: f32,
        y: f32,
    }

    #[derive(Serialize)]
    enum Mode {
        Fast,
        Custom(u8),
    }

    #[derive(Serialize)]
    struct Plot {
        title: Option<String>,
        points: Vec<Point>,
        #[serde(rename = "labels,omitempty")]
        labels: Vec<String>,
        ranges: BTreeMap<String, [i32; 2]>,
        mode: Mode,
    }

    #[test]
    fn test_flatten_shapes() {
        let plot = Plot {
            title: None,
            points: vec![Point { x: 0.5, y: 1.0 }, Point { x: 2.0, y: -1.25 }],
            labels: vec![],
            ranges: BTreeMap::from([("x".to_string(), [0, 10])]),
            mode: Mode::Fast,
        };

        let (form, errors) = encode(&Engine::new(), &plot);
        assert!(errors.is_empty(), "{errors}");
        assert_eq!(
            form.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["points.0.x", "points.0.y", "points.1.x", "points.1.y", "ranges.x", "mode"]
        );
        assert_eq!(form.get("points.1.y"), Some("-1.250000"));
        assert_eq!(
            form.get_all("ranges.x"),
            Some(&["0".to_string(), "10".to_string()][..])
        );
        assert_eq!(form.get("mode"), Some("Fast"));
    }

    #[test]
    fn test_data_variant_is_reported() {
        let plot = Plot {
            title: Some("t".to_string()),
            points: vec![],
            labels: vec!["a".to_string()],
            ranges: BTreeMap::new(),
            mode: Mode::Custom(3),
        };

        let (form, errors) = encode(&Engine::new(), &plot);
        assert_eq!(form.get("title"), Some("t"));
        assert_eq!(form.get("labels"), Some("a"));
        assert!(!form.contains_key("mode"));
        assert!(matches!(
            errors.get("mode"),
            Some(Error::Field { source, .. }) if matches!(**source, Error::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_root_must_be_a_record() {
        let (form, errors) = encode(&Engine::new(), &vec![1, 2]);
        assert!(form.is_empty());
        assert!(errors.contains_key(""));
    }

    #[test]
    fn test_map_key_with_separator() {
        #[derive(Serialize)]
        struct Lookup {
            table: BTreeMap<String, u8>,
        }

        let lookup = Lookup {
            table: BTreeMap::from([("a.b".to_string(), 1), ("c".to_string(), 2)]),
        };
        let (form, errors) = encode(&Engine::new(), &lookup);

        assert_eq!(form.get("table.c"), Some("2"));
        assert_eq!(form.len(), 1);
        assert!(errors.contains_key("table"));
    }
}
