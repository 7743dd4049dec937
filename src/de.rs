//! Form decoding.
//!
//! This module drives a type's [`Deserialize`](serde::Deserialize)
//! implementation over a form. Each position in the destination graph is a
//! [`Slot`], which pairs the keys addressing that position (a node of the key
//! trie) with what the destination already holds there (a raw [`Value`]
//! capture). Positions no key reaches simply replay the destination.
//!
//! ## Overview
//!
//! - **Leaves** take the first value of their key, converted through the
//!   converter registry, the type's own text capability, or the built-in
//!   table, in that order
//! - **Sequences** take every value of a key, or grow to the largest index
//!   under it
//! - **Records** resolve key segments through field metadata; unknown keys
//!   are ignored
//!
//! ## Failure isolation
//!
//! A failure that the decoder detects itself (a bad number, a malformed key,
//! an index past an array) is recorded and the slot falls back to the
//! destination's value. A failure raised inside a type's own `Deserialize`
//! code aborts the pass; the decoder then retries with the failing slot
//! reduced to the destination's value, then with the slot left out, then
//! moving outwards one level at a time. Every failure is reported once,
//! under its key.
//!
//! ## Usage
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_form::{form, Engine};
//!
//! #[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
//! struct Filter { tags: Vec<String>, limit: u32, offset: u32 }
//!
//! let mut filter = Filter { limit: 20, ..Filter::default() };
//! let result = Engine::new().decode(
//!     &form! { "tags" => ["a", "b"], "offset" => ["x"] },
//!     &mut filter,
//! );
//!
//! assert_eq!(filter.tags, vec!["a", "b"]);
//! assert_eq!(filter.limit, 20);
//! assert_eq!(result.unwrap_err().keys().collect::<Vec<_>>(), vec!["offset"]);
//! ```

use crate::engine::Engine;
use crate::error::{Error, MultiError, Result};
use crate::map::FormMap;
use crate::options::FormOptions;
use crate::path::{parse_index, Trie};
use crate::text;
use crate::value::{to_raw, Value, ValueDeserializer, ABSENT};
use serde::de::{self, DeserializeOwned, DeserializeSeed, Deserializer as _, IntoDeserializer};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, trace};

/// How much of a slot a retry leaves out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Suppress {
    /// Ignore the keys addressing the slot; replay the destination.
    Form,
    /// Leave the slot out of its parent altogether.
    All,
}

struct DecodeContext<'a> {
    engine: &'a Engine,
    suppressed: &'a HashMap<String, Suppress>,
    errors: RefCell<MultiError>,
}

impl<'a> DecodeContext<'a> {
    fn options(&self) -> &'a FormOptions {
        self.engine.options()
    }

    fn record(&self, key: &str, path: &str, error: Error) {
        debug!(key, %error, "isolated decode error");
        self.errors.borrow_mut().insert(key, error.located(path, key));
    }
}

/// The keys addressing a slot.
#[derive(Clone, Copy)]
enum Form<'a> {
    Node(&'a Trie<'a>),
    /// One value of a repeated leaf, or a map key segment.
    Text(&'a str),
}

#[derive(Clone, Debug)]
struct At {
    path: String,
    key: String,
}

impl At {
    fn locate(&self, error: Error) -> Error {
        error.located(&self.path, &self.key)
    }
}

/// Leaf input after the converter registry had its say.
enum Input<'a> {
    Base,
    Converted(Value),
    Text(&'a str),
}

/// A named type, possibly claimed by a registered converter.
enum Claim {
    Converted(Value),
    Failed,
    Unclaimed,
}

/// One position of the destination graph.
pub(crate) struct Slot<'a> {
    ctx: &'a DecodeContext<'a>,
    at: At,
    base: &'a Value,
    form: Option<Form<'a>>,
    /// Conversion failures are returned instead of recorded.
    strict: bool,
    /// The value inside a newtype without a converter of its own; converters
    /// registered for primitive kinds do not apply to it.
    in_newtype: bool,
}

impl<'a> Slot<'a> {
    fn new(
        ctx: &'a DecodeContext<'a>,
        path: String,
        key: String,
        base: &'a Value,
        form: Option<Form<'a>>,
    ) -> Option<Self> {
        let form = match ctx.suppressed.get(&path) {
            Some(Suppress::All) => return None,
            Some(Suppress::Form) => None,
            None => form,
        };
        Some(Slot {
            ctx,
            at: At { path, key },
            base,
            form,
            strict: false,
            in_newtype: false,
        })
    }

    /// A slot whose key is also its path.
    fn node(
        ctx: &'a DecodeContext<'a>,
        path: String,
        base: &'a Value,
        form: Option<Form<'a>>,
    ) -> Option<Self> {
        Slot::new(ctx, path.clone(), path, base, form)
    }

    fn base(&self) -> ValueDeserializer<'a> {
        ValueDeserializer::new(self.base)
    }

    fn join(&self, segment: &str) -> String {
        self.ctx.options().join(&self.at.path, segment)
    }

    fn report(&self, error: Error) {
        self.ctx.record(&self.at.key, &self.at.path, error);
    }

    fn report_at(&self, key: &str, error: Error) {
        self.ctx.record(key, key, error);
    }

    /// Text of the leaf without reporting anything.
    fn leaf_text(&self) -> Option<&'a str> {
        match self.form? {
            Form::Text(text) => Some(text),
            Form::Node(node) => node.leaf.and_then(|leaf| leaf.first()),
        }
    }

    /// Text of a scalar leaf; keys continuing below it are reported.
    fn text(&self) -> Option<&'a str> {
        if let Some(Form::Node(node)) = self.form {
            for segment in node.children.keys() {
                let key = self.join(segment);
                self.report_at(&key, Error::NotALeaf { key: key.clone() });
            }
        }
        self.leaf_text()
    }

    fn fail(&self, error: Error) -> Result<()> {
        if self.strict {
            return Err(error);
        }
        self.report(error);
        Ok(())
    }

    fn input(&self, kind: &str) -> Result<Input<'a>> {
        let Some(text) = self.text() else {
            return Ok(Input::Base);
        };
        let decoder = if self.in_newtype {
            None
        } else {
            self.ctx.engine.converters().decoder(kind)
        };
        match decoder {
            Some(decode) => match decode(text) {
                Ok(value) => Ok(Input::Converted(value)),
                Err(error) => self.fail(error).map(|()| Input::Base),
            },
            None => Ok(Input::Text(text)),
        }
    }

    fn claim(&self, name: &str) -> Result<Claim> {
        let Some(decode) = self.ctx.engine.converters().decoder(name) else {
            return Ok(Claim::Unclaimed);
        };
        let Some(text) = self.leaf_text() else {
            return Ok(Claim::Unclaimed);
        };
        match decode(text) {
            Ok(value) => Ok(Claim::Converted(value)),
            Err(error) => self.fail(error).map(|()| Claim::Failed),
        }
    }

    /// Children of a record-like slot; values assigned to it directly are
    /// reported.
    fn record_node(&self) -> Option<&'a Trie<'a>> {
        match self.form? {
            Form::Text(_) => {
                self.report(Error::NotARecord {
                    key: self.at.key.clone(),
                });
                None
            }
            Form::Node(node) => {
                if let Some(leaf) = node.leaf {
                    self.report_at(
                        leaf.key,
                        Error::NotARecord {
                            key: leaf.key.to_string(),
                        },
                    );
                }
                Some(node)
            }
        }
    }

    fn base_items(&self) -> &'a [Value] {
        match self.base {
            Value::List(items) => items,
            _ => &[],
        }
    }

    /// Element slots of a sequence, or of a fixed array when `fixed` is set.
    fn elements(&self, form: Form<'a>, fixed: Option<usize>) -> Vec<Slot<'a>> {
        match form {
            Form::Text(text) => {
                let len = fixed.unwrap_or(1);
                (0..len)
                    .filter_map(|i| {
                        let form = (i == 0).then_some(Form::Text(text));
                        let base = self.fixed_base(fixed, i);
                        let path = self.join(&i.to_string());
                        Slot::new(self.ctx, path, self.at.key.clone(), base, form)
                    })
                    .collect()
            }
            Form::Node(node) => match node.leaf {
                Some(leaf) if !node.has_children() => {
                    let len = fixed.unwrap_or(leaf.values.len());
                    (0..len)
                        .filter_map(|i| {
                            let form = leaf.values.get(i).map(|v| Form::Text(v.as_str()));
                            let base = self.fixed_base(fixed, i);
                            let path = self.join(&i.to_string());
                            Slot::new(self.ctx, path, leaf.key.to_string(), base, form)
                        })
                        .collect()
                }
                leaf => {
                    if let Some(leaf) = leaf {
                        self.report_at(
                            leaf.key,
                            Error::NotARecord {
                                key: leaf.key.to_string(),
                            },
                        );
                    }
                    self.indexed_elements(node, fixed)
                }
            },
        }
    }

    /// The destination's element where repeated values do not replace it.
    fn fixed_base(&self, fixed: Option<usize>, index: usize) -> &'a Value {
        match fixed {
            Some(_) => self.base_items().get(index).unwrap_or(&ABSENT),
            None => &ABSENT,
        }
    }

    fn indexed_elements(&self, node: &'a Trie<'a>, fixed: Option<usize>) -> Vec<Slot<'a>> {
        let options = self.ctx.options();
        let mut indexed = BTreeMap::new();

        for (segment, child) in &node.children {
            let key = self.join(segment);
            match parse_index(segment) {
                None => self.report_at(
                    &key,
                    Error::InvalidIndex {
                        key: key.clone(),
                        segment: (*segment).to_string(),
                    },
                ),
                Some(index) if fixed.map_or(index > options.max_index, |len| index >= len) => self
                    .report_at(
                        &key,
                        Error::IndexOutOfRange {
                            key: key.clone(),
                            index,
                            capacity: fixed.unwrap_or(options.max_index + 1),
                        },
                    ),
                Some(index) => {
                    indexed.insert(index, child);
                }
            }
        }

        let base = self.base_items();
        let len = fixed.unwrap_or_else(|| {
            let reached = indexed.keys().next_back().map_or(0, |last| last + 1);
            reached.max(base.len())
        });

        (0..len)
            .filter_map(|i| {
                let form = indexed.get(&i).map(|child| Form::Node(*child));
                let base = base.get(i).unwrap_or(&ABSENT);
                Slot::node(self.ctx, self.join(&i.to_string()), base, form)
            })
            .collect()
    }

    fn too_many_values(&self, len: usize) -> bool {
        let Some(Form::Node(node)) = self.form else {
            return false;
        };
        match node.leaf {
            Some(leaf) if !node.has_children() && leaf.values.len() > len => {
                self.report_at(
                    leaf.key,
                    Error::TooManyValues {
                        key: leaf.key.to_string(),
                        count: leaf.values.len(),
                        capacity: len,
                    },
                );
                true
            }
            _ => false,
        }
    }

    fn tuple<'de, V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let at = self.at.clone();
        let result = match self.form {
            Some(form) if !self.too_many_values(len) => {
                let elements = self.elements(form, Some(len));
                visitor.visit_seq(Elements::new(elements))
            }
            _ => self.base().deserialize_tuple(len, visitor),
        };
        result.map_err(|e| at.locate(e))
    }

    fn locate(&self, error: Error) -> Error {
        self.at.locate(error)
    }
}

macro_rules! decode_scalar {
    ($method:ident, $visit:ident, $kind:expr, $parse:expr) => {
        fn $method<V>(self, visitor: V) -> Result<V::Value>
        where
            V: de::Visitor<'de>,
        {
            let result = match self.input($kind) {
                Err(error) => Err(error),
                Ok(Input::Base) => self.base().$method(visitor),
                Ok(Input::Converted(value)) => ValueDeserializer::new(&value).$method(visitor),
                Ok(Input::Text(text)) => match $parse(text) {
                    Ok(parsed) => visitor.$visit(parsed),
                    Err(error) => match self.fail(error) {
                        Ok(()) => self.base().$method(visitor),
                        Err(error) => Err(error),
                    },
                },
            };
            result.map_err(|e| self.locate(e))
        }
    };
}

macro_rules! decode_number {
    ($($method:ident => $visit:ident($ty:ty)),* $(,)?) => {
        $(
            decode_scalar!($method, $visit, stringify!($ty), |s| text::parse_number::<$ty>(s, stringify!($ty)));
        )*
    };
}

impl<'de, 'a> de::Deserializer<'de> for Slot<'a> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let at = self.at.clone();
        let result = match self.form {
            None => self.base().deserialize_any(visitor),
            Some(Form::Text(text)) => visitor.visit_str(text),
            Some(Form::Node(node)) if node.has_children() => {
                let node = self.record_node().unwrap_or(node);
                let entries = node
                    .children
                    .iter()
                    .filter_map(|(segment, child)| {
                        Slot::node(self.ctx, self.join(segment), &ABSENT, Some(Form::Node(child)))
                            .map(|slot| (EntryKey::Name(*segment), slot))
                    })
                    .collect();
                visitor.visit_map(Entries::new(entries))
            }
            Some(Form::Node(node)) => match node.leaf {
                Some(leaf) if leaf.values.len() == 1 => visitor.visit_str(&leaf.values[0]),
                Some(_) => visitor.visit_seq(Elements::new(self.elements(Form::Node(node), None))),
                None => self.base().deserialize_any(visitor),
            },
        };
        result.map_err(|e| at.locate(e))
    }

    decode_scalar!(deserialize_bool, visit_bool, "bool", text::parse_bool);
    decode_scalar!(deserialize_char, visit_char, "char", text::parse_char);

    decode_number! {
        deserialize_i8 => visit_i8(i8),
        deserialize_i16 => visit_i16(i16),
        deserialize_i32 => visit_i32(i32),
        deserialize_i64 => visit_i64(i64),
        deserialize_i128 => visit_i128(i128),
        deserialize_u8 => visit_u8(u8),
        deserialize_u16 => visit_u16(u16),
        deserialize_u32 => visit_u32(u32),
        deserialize_u64 => visit_u64(u64),
        deserialize_u128 => visit_u128(u128),
        deserialize_f32 => visit_f32(f32),
        deserialize_f64 => visit_f64(f64),
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let result = match self.input("str") {
            Err(error) => Err(error),
            Ok(Input::Base) => self.base().deserialize_str(visitor),
            Ok(Input::Converted(value)) => ValueDeserializer::new(&value).deserialize_str(visitor),
            Ok(Input::Text(text)) => visitor.visit_str(text),
        };
        result.map_err(|e| self.locate(e))
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
        if self.form.is_some() || !matches!(self.base, Value::Absent) {
            visitor.visit_some(self)
        } else {
            visitor.visit_none()
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V>(self, name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let result = match self.claim(name) {
            Err(error) => Err(error),
            Ok(Claim::Converted(value)) => {
                ValueDeserializer::new(&value).deserialize_unit_struct(name, visitor)
            }
            Ok(_) => visitor.visit_unit(),
        };
        result.map_err(|e| self.locate(e))
    }

    fn deserialize_newtype_struct<V>(self, name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let at = self.at.clone();
        let result = match self.claim(name) {
            Err(error) => Err(error),
            Ok(Claim::Converted(value)) => {
                ValueDeserializer::new(&value).deserialize_newtype_struct(name, visitor)
            }
            Ok(Claim::Failed) => self.base().deserialize_newtype_struct(name, visitor),
            Ok(Claim::Unclaimed) => visitor.visit_newtype_struct(Slot {
                in_newtype: true,
                ..self
            }),
        };
        result.map_err(|e| at.locate(e))
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let result = match self.form {
            None => self.base().deserialize_seq(visitor),
            Some(form) => visitor.visit_seq(Elements::new(self.elements(form, None))),
        };
        result.map_err(|e| self.locate(e))
    }

    fn deserialize_tuple<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.tuple(len, visitor)
    }

    fn deserialize_tuple_struct<V>(
        self,
        name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.claim(name) {
            Err(error) => Err(self.locate(error)),
            Ok(Claim::Converted(value)) => ValueDeserializer::new(&value)
                .deserialize_tuple_struct(name, len, visitor)
                .map_err(|e| self.locate(e)),
            Ok(Claim::Failed) => self
                .base()
                .deserialize_tuple_struct(name, len, visitor)
                .map_err(|e| self.locate(e)),
            Ok(Claim::Unclaimed) => self.tuple(len, visitor),
        }
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let Some(node) = self.record_node() else {
            return self.base().deserialize_map(visitor).map_err(|e| self.locate(e));
        };

        let precision = self.ctx.options().float_precision;
        let base: &'a [(Value, Value)] = match self.base {
            Value::Map(entries) => entries,
            _ => &[],
        };

        let mut claimed = HashSet::new();
        let mut entries = Vec::with_capacity(base.len() + node.children.len());
        for (key, value) in base {
            let segment = key.render(precision).unwrap_or_default();
            let form = node.children.get_key_value(segment.as_str());
            if let Some((segment, _)) = form {
                claimed.insert(*segment);
            }
            let form = form.map(|(_, child)| Form::Node(child));
            if let Some(slot) = Slot::node(self.ctx, self.join(&segment), value, form) {
                entries.push((EntryKey::Base(key), slot));
            }
        }

        for (segment, child) in &node.children {
            if claimed.contains(segment) {
                continue;
            }
            let path = self.join(segment);
            if self.ctx.suppressed.contains_key(&path) {
                continue;
            }
            let key = Slot {
                ctx: self.ctx,
                at: At {
                    path: path.clone(),
                    key: path.clone(),
                },
                base: &ABSENT,
                form: Some(Form::Text(*segment)),
                strict: true,
                in_newtype: false,
            };
            if let Some(slot) = Slot::node(self.ctx, path, &ABSENT, Some(Form::Node(child))) {
                entries.push((EntryKey::Form(key), slot));
            }
        }

        visitor
            .visit_map(Entries::new(entries))
            .map_err(|e| self.locate(e))
    }

    fn deserialize_struct<V>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let node = match self.claim(name) {
            Err(error) => return Err(self.locate(error)),
            Ok(Claim::Converted(value)) => {
                return ValueDeserializer::new(&value)
                    .deserialize_struct(name, fields, visitor)
                    .map_err(|e| self.locate(e));
            }
            Ok(Claim::Failed) => None,
            Ok(Claim::Unclaimed) => self.record_node(),
        };
        let Some(node) = node else {
            return self
                .base()
                .deserialize_struct(name, fields, visitor)
                .map_err(|e| self.locate(e));
        };

        let meta = self.ctx.engine.fields().record(name, fields);
        for duplicate in meta.duplicates() {
            if node.child(duplicate).is_some() {
                let key = self.join(duplicate);
                self.report_at(
                    &key,
                    Error::DuplicateField {
                        record: name.to_string(),
                        name: (*duplicate).to_string(),
                    },
                );
            }
        }
        for segment in node.children.keys() {
            if meta.field_by_name(segment).is_none() && !meta.is_duplicate(segment) {
                trace!(key = %self.join(segment), record = name, "ignoring unknown key");
            }
        }

        let base: &'a [(String, Value)] = match self.base {
            Value::Record(fields) => fields,
            _ => &[],
        };
        let entries = meta
            .fields
            .iter()
            .filter_map(|field| {
                let form = if field.skip || meta.is_duplicate(field.name) {
                    None
                } else {
                    node.child(field.name).map(Form::Node)
                };
                let base = base
                    .iter()
                    .find(|(tag, _)| tag == field.tag)
                    .map_or(&ABSENT, |(_, value)| value);
                Slot::node(self.ctx, self.join(field.name), base, form)
                    .map(|slot| (EntryKey::Name(field.tag), slot))
            })
            .collect();

        visitor
            .visit_map(Entries::new(entries))
            .map_err(|e| self.locate(e))
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
        let result = match self.claim(name) {
            Err(error) => Err(error),
            Ok(Claim::Converted(value)) => {
                ValueDeserializer::new(&value).deserialize_enum(name, variants, visitor)
            }
            Ok(Claim::Failed) => self.base().deserialize_enum(name, variants, visitor),
            Ok(Claim::Unclaimed) => match self.form.and_then(|_| self.text()) {
                Some(text) if variants.iter().any(|v| *v == text) => {
                    visitor.visit_enum(text.into_deserializer())
                }
                Some(text) => {
                    let reason = format!("expected one of {variants:?}");
                    let error = Error::conversion(text, name, reason);
                    match self.fail(error) {
                        Ok(()) => self.base().deserialize_enum(name, variants, visitor),
                        Err(error) => Err(error),
                    }
                }
                None => self.base().deserialize_enum(name, variants, visitor),
            },
        };
        result.map_err(|e| self.locate(e))
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

struct Elements<'a> {
    slots: std::vec::IntoIter<Slot<'a>>,
}

impl<'a> Elements<'a> {
    fn new(slots: Vec<Slot<'a>>) -> Self {
        Elements {
            slots: slots.into_iter(),
        }
    }
}

impl<'de, 'a> de::SeqAccess<'de> for Elements<'a> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        match self.slots.next() {
            Some(slot) => seed.deserialize(slot).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.slots.len())
    }
}

enum EntryKey<'a> {
    /// A field tag or a key segment, read as a string.
    Name(&'a str),
    /// A key of the destination's map.
    Base(&'a Value),
    /// A key segment parsed into the map's key type.
    Form(Slot<'a>),
}

struct Entries<'a> {
    entries: std::vec::IntoIter<(EntryKey<'a>, Slot<'a>)>,
    value: Option<Slot<'a>>,
}

impl<'a> Entries<'a> {
    fn new(entries: Vec<(EntryKey<'a>, Slot<'a>)>) -> Self {
        Entries {
            entries: entries.into_iter(),
            value: None,
        }
    }
}

impl<'de, 'a> de::MapAccess<'de> for Entries<'a> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        let Some((key, value)) = self.entries.next() else {
            return Ok(None);
        };
        self.value = Some(value);
        match key {
            EntryKey::Name(name) => seed.deserialize(name.into_deserializer()).map(Some),
            EntryKey::Base(key) => seed.deserialize(ValueDeserializer::new(key)).map(Some),
            EntryKey::Form(slot) => seed.deserialize(slot).map(Some),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(slot) => seed.deserialize(slot),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

/// Marks `path` for a wider retry. Returns `false` once the root itself has
/// been left out, which makes the failure fatal.
fn escalate(
    suppressed: &mut HashMap<String, Suppress>,
    path: &str,
    options: &FormOptions,
) -> bool {
    let mut path = path;
    loop {
        match suppressed.get(path).copied() {
            None => {
                suppressed.insert(path.to_string(), Suppress::Form);
                return true;
            }
            Some(Suppress::Form) if !path.is_empty() => {
                suppressed.insert(path.to_string(), Suppress::All);
                return true;
            }
            Some(_) => match options.parent(path) {
                Some(parent) => path = parent,
                None => return false,
            },
        }
    }
}

/// Decodes `form` over `base`, the raw capture of a destination.
///
/// Returns `None` when no amount of leaving slots out lets the type's own
/// deserialization succeed.
pub(crate) fn decode_over<T>(
    engine: &Engine,
    form: &FormMap,
    base: &Value,
) -> (Option<T>, MultiError)
where
    T: DeserializeOwned,
{
    let options = engine.options();
    let (trie, mut errors) = Trie::build(form, options);
    let mut suppressed = HashMap::new();

    loop {
        let ctx = DecodeContext {
            engine,
            suppressed: &suppressed,
            errors: RefCell::new(MultiError::new()),
        };
        let outcome = match Slot::node(&ctx, String::new(), base, Some(Form::Node(&trie))) {
            Some(root) => T::deserialize(root),
            None => return (None, errors),
        };
        errors.extend(ctx.errors.into_inner());

        match outcome {
            Ok(value) => return (Some(value), errors),
            Err(error) => {
                let path = error.path().unwrap_or_default().to_string();
                debug!(path = %path, %error, "retrying decode without the failing slot");
                errors.push(error);
                if !escalate(&mut suppressed, &path, options) {
                    debug!("decode failed at the root");
                    return (None, errors);
                }
            }
        }
    }
}

/// Decodes `form` into `dest`, keeping whatever the form does not address.
pub(crate) fn decode_into<T>(
    engine: &Engine,
    form: &FormMap,
    dest: &mut T,
) -> std::result::Result<(), MultiError>
where
    T: Serialize + DeserializeOwned,
{
    let base = match to_raw(&*dest) {
        Ok(base) => base,
        Err(error) => {
            let mut errors = MultiError::new();
            errors.insert("", error);
            return Err(errors);
        }
    };

    let (value, errors) = decode_over::<T>(engine, form, &base);
    if let Some(value) = value {
        *dest = value;
    }
    errors.into_result()
}
