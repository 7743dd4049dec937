use serde::{Deserialize, Deserializer, Serialize};
use serde_form::{form, text::TextVisitor, text_leaf, Engine, Error, FormOptions};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq)]
struct IntAlias(i64);

/// Two bytes written as four hex digits.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Hex([u8; 2]);

impl fmt::Display for Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}{:02x}", self.0[0], self.0[1])
    }
}

impl FromStr for Hex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.is_ascii() || s.len() % 2 != 0 {
            return Err(format!("{s:?} is not a hex string"));
        }
        if s.len() > 4 {
            return Err("out of range".to_string());
        }
        let mut bytes = [0u8; 2];
        for (i, byte) in bytes.iter_mut().enumerate().take(s.len() / 2) {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).map_err(|e| e.to_string())?;
        }
        Ok(Hex(bytes))
    }
}

text_leaf!(Hex);

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct RudeBool(bool);

impl fmt::Display for RudeBool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0 { "yup" } else { "nope" })
    }
}

impl FromStr for RudeBool {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("yup") {
            Ok(RudeBool(true))
        } else if s.eq_ignore_ascii_case("nope") {
            Ok(RudeBool(false))
        } else {
            Err("value must be yup or nope")
        }
    }
}

text_leaf!(RudeBool);

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
struct S1 {
    #[serde(rename = "f1")]
    f01: i64,
    #[serde(rename = "f2")]
    f02: Option<i64>,
    #[serde(rename = "f3")]
    f03: Vec<i64>,
    #[serde(rename = "f4")]
    f04: Vec<Option<i64>>,
    #[serde(rename = "f5")]
    f05: Option<Vec<i64>>,
    #[serde(rename = "f6")]
    f06: Option<Vec<Option<i64>>>,
    #[serde(rename = "f7")]
    f07: S2,
    #[serde(rename = "f8")]
    f08: Option<Box<S1>>,
    #[serde(rename = "-")]
    f09: i64,
    #[serde(rename = "f10")]
    f10: Vec<S1>,
    #[serde(rename = "f11")]
    f11: Vec<Option<Box<S1>>>,
    #[serde(rename = "f12")]
    f12: Option<Vec<S1>>,
    #[serde(rename = "f13")]
    f13: Option<Vec<Option<Box<S1>>>>,
    #[serde(rename = "f14")]
    f14: i64,
    #[serde(rename = "f15")]
    f15: IntAlias,
    #[serde(rename = "f16")]
    f16: Vec<IntAlias>,
    #[serde(rename = "f17")]
    f17: Hex,
    #[serde(rename = "f18")]
    f18: RudeBool,
    #[serde(rename = "f19")]
    f19: Option<RudeBool>,
    #[serde(rename = "f20")]
    f20: Vec<RudeBool>,
    #[serde(rename = "f21")]
    f21: Vec<Option<RudeBool>>,
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
struct S2 {
    f1: Option<Vec<Option<i64>>>,
}

fn pair(a: i64, b: i64) -> Option<Vec<Option<i64>>> {
    Some(vec![Some(a), Some(b)])
}

fn with_f06(a: i64, b: i64) -> S1 {
    S1 {
        f06: pair(a, b),
        ..S1::default()
    }
}

#[test]
fn test_all_shapes() {
    let form = form! {
        "f1" => ["1"],
        "f2" => ["2"],
        "f3" => ["31", "32"],
        "f4" => ["41", "42"],
        "f5" => ["51", "52"],
        "f6" => ["61", "62"],
        "f7.f1" => ["71", "72"],
        "f8.f8.f7.f1" => ["81", "82"],
        "f9" => ["9"],
        "f10.0.f10.0.f6" => ["101", "102"],
        "f10.0.f10.1.f6" => ["103", "104"],
        "f11.0.f11.0.f6" => ["111", "112"],
        "f11.0.f11.1.f6" => ["113", "114"],
        "f12.0.f12.0.f6" => ["121", "122"],
        "f12.0.f12.1.f6" => ["123", "124"],
        "f13.0.f13.0.f6" => ["131", "132"],
        "f13.0.f13.1.f6" => ["133", "134"],
        "f14" => [],
        "f15" => ["151"],
        "f16" => ["161", "162"],
        "f17" => ["1a2b"],
        "f18" => ["yup"],
        "f19" => ["nope"],
        "f20" => ["nope", "yup"],
        "f21" => ["yup", "nope"],
    };

    let expected = S1 {
        f01: 1,
        f02: Some(2),
        f03: vec![31, 32],
        f04: vec![Some(41), Some(42)],
        f05: Some(vec![51, 52]),
        f06: pair(61, 62),
        f07: S2 { f1: pair(71, 72) },
        f08: Some(Box::new(S1 {
            f08: Some(Box::new(S1 {
                f07: S2 { f1: pair(81, 82) },
                ..S1::default()
            })),
            ..S1::default()
        })),
        f09: 0,
        f10: vec![S1 {
            f10: vec![with_f06(101, 102), with_f06(103, 104)],
            ..S1::default()
        }],
        f11: vec![Some(Box::new(S1 {
            f11: vec![
                Some(Box::new(with_f06(111, 112))),
                Some(Box::new(with_f06(113, 114))),
            ],
            ..S1::default()
        }))],
        f12: Some(vec![S1 {
            f12: Some(vec![with_f06(121, 122), with_f06(123, 124)]),
            ..S1::default()
        }]),
        f13: Some(vec![Some(Box::new(S1 {
            f13: Some(vec![
                Some(Box::new(with_f06(131, 132))),
                Some(Box::new(with_f06(133, 134))),
            ]),
            ..S1::default()
        }))]),
        f14: 0,
        f15: IntAlias(151),
        f16: vec![IntAlias(161), IntAlias(162)],
        f17: Hex([0x1a, 0x2b]),
        f18: RudeBool(true),
        f19: Some(RudeBool(false)),
        f20: vec![RudeBool(false), RudeBool(true)],
        f21: vec![Some(RudeBool(true)), Some(RudeBool(false))],
    };

    let (decoded, errors) = Engine::new().decode_new::<S1>(&form);
    assert!(errors.is_empty(), "{errors}");
    assert_eq!(decoded, Some(expected));
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
struct Simple {
    f1: i32,
    f3: Vec<i32>,
}

#[test]
fn test_int_and_int_sequence() {
    let mut simple = Simple::default();
    let result = Engine::new().decode(&form! { "f1" => ["1"], "f3" => ["31", "32"] }, &mut simple);

    assert!(result.is_ok());
    assert_eq!(simple, Simple { f1: 1, f3: vec![31, 32] });
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
struct Item {
    b: i32,
    label: String,
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
struct Basket {
    a: Vec<Item>,
    pair: [u16; 2],
    name: String,
}

#[test]
fn test_index_growth_leaves_gaps_at_zero() {
    let (basket, errors) = Engine::new().decode_new::<Basket>(&form! {
        "a.0.b" => ["10"],
        "a.2.b" => ["30"],
    });

    assert!(errors.is_empty(), "{errors}");
    let basket = basket.unwrap();
    assert_eq!(basket.a.len(), 3);
    assert_eq!(basket.a[0].b, 10);
    assert_eq!(basket.a[1], Item::default());
    assert_eq!(basket.a[2].b, 30);
}

#[test]
fn test_index_growth_over_existing_elements() {
    let mut basket = Basket {
        a: vec![
            Item {
                b: 1,
                label: "first".to_string(),
            },
            Item {
                b: 2,
                label: "second".to_string(),
            },
        ],
        ..Basket::default()
    };

    Engine::new()
        .decode(&form! { "a.1.b" => ["20"], "a.3.label" => ["fourth"] }, &mut basket)
        .unwrap();

    assert_eq!(basket.a.len(), 4);
    assert_eq!(basket.a[0].label, "first");
    assert_eq!(basket.a[1].b, 20);
    assert_eq!(basket.a[1].label, "second");
    assert_eq!(basket.a[2], Item::default());
    assert_eq!(basket.a[3].label, "fourth");
}

#[test]
fn test_fixed_array_overflow_is_isolated() {
    let mut basket = Basket {
        pair: [7, 8],
        ..Basket::default()
    };

    let errors = Engine::new()
        .decode(
            &form! { "pair" => ["1", "2", "3"], "name" => ["kept"] },
            &mut basket,
        )
        .unwrap_err();

    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors.get("pair"),
        Some(Error::Field { source, .. })
            if matches!(**source, Error::TooManyValues { count: 3, capacity: 2, .. })
    ));
    assert_eq!(basket.pair, [7, 8]);
    assert_eq!(basket.name, "kept");
}

#[test]
fn test_fixed_array_index_out_of_range() {
    let (basket, errors) = Engine::new().decode_new::<Basket>(&form! {
        "pair.2" => ["5"],
        "pair.1" => ["6"],
    });

    assert_eq!(basket.unwrap().pair, [0, 6]);
    assert!(errors.contains_key("pair.2"));
}

#[test]
fn test_index_limits() {
    let engine = Engine::with_options(FormOptions::new().with_max_index(5));
    let (basket, errors) = engine.decode_new::<Basket>(&form! {
        "a.6.b" => ["1"],
        "a.x.b" => ["2"],
        "a.1.b" => ["3"],
    });

    let basket = basket.unwrap();
    assert_eq!(basket.a.len(), 2);
    assert_eq!(basket.a[1].b, 3);
    assert!(matches!(
        errors.get("a.6"),
        Some(Error::Field { source, .. }) if matches!(**source, Error::IndexOutOfRange { index: 6, .. })
    ));
    assert!(matches!(
        errors.get("a.x"),
        Some(Error::Field { source, .. }) if matches!(**source, Error::InvalidIndex { .. })
    ));
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
enum Mode {
    #[default]
    Off,
    On,
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
struct Profile {
    id: u64,
    name: String,
    score: f32,
    mode: Mode,
    verified: bool,
    #[serde(rename = "-")]
    secret: String,
    #[serde(skip)]
    cache: Vec<u8>,
    rude: RudeBool,
}

fn profile() -> Profile {
    Profile {
        id: 42,
        name: "ada".to_string(),
        score: 1.5,
        mode: Mode::On,
        verified: true,
        secret: "hunter2".to_string(),
        cache: vec![1, 2, 3],
        rude: RudeBool(true),
    }
}

#[test]
fn test_in_place_decode_keeps_untouched_fields() {
    let mut p = profile();
    Engine::new()
        .decode(&form! { "name" => ["grace"], "verified" => ["f"] }, &mut p)
        .unwrap();

    assert_eq!(p.name, "grace");
    assert!(!p.verified);
    assert_eq!(p.id, 42);
    assert_eq!(p.score, 1.5);
    assert_eq!(p.mode, Mode::On);
    assert_eq!(p.secret, "hunter2");
    assert_eq!(p.rude, RudeBool(true));
}

#[test]
fn test_skipped_fields_ignore_matching_keys() {
    let mut p = profile();
    Engine::new()
        .decode(
            &form! { "-" => ["leaked"], "secret" => ["leaked"], "cache" => ["9"] },
            &mut p,
        )
        .unwrap();

    assert_eq!(p.secret, "hunter2");
    assert_eq!(p.cache, Vec::<u8>::new());
}

#[test]
fn test_failures_are_isolated_per_key() {
    let mut p = profile();
    let errors = Engine::new()
        .decode(
            &form! {
                "id" => ["-1"],
                "name" => ["grace"],
                "score" => ["fast"],
                "mode" => ["Sideways"],
                "verified" => ["maybe"],
                "rude" => ["perhaps"],
            },
            &mut p,
        )
        .unwrap_err();

    assert_eq!(
        errors.keys().collect::<Vec<_>>().len(),
        5,
        "unexpected errors: {:?}",
        errors.keys().collect::<Vec<_>>()
    );
    for key in ["id", "score", "mode", "verified", "rude"] {
        assert!(errors.contains_key(key), "missing error for {key}");
    }
    assert_eq!(p.name, "grace");
    assert_eq!(p.id, 42);
    assert_eq!(p.score, 1.5);
    assert_eq!(p.mode, Mode::On);
    assert!(p.verified);
    assert_eq!(p.rude, RudeBool(true));
}

#[test]
fn test_values_and_keys_edge_cases() {
    let (p, errors) = Engine::new().decode_new::<Profile>(&form! {
        "id" => ["7", "8"],
        "score" => [""],
        "mode" => ["On"],
        "unknown.deep.key" => ["ignored"],
        "name.first" => ["x"],
        "a..b" => ["1"],
    });

    let p = p.unwrap();
    assert_eq!(p.id, 7);
    assert_eq!(p.score, 0.0);
    assert_eq!(p.mode, Mode::On);
    assert_eq!(p.name, "");

    assert_eq!(errors.len(), 2);
    assert!(matches!(
        errors.get("name.first"),
        Some(Error::Field { source, .. }) if matches!(**source, Error::NotALeaf { .. })
    ));
    assert!(matches!(
        errors.get("a..b"),
        Some(Error::Field { source, .. }) if matches!(**source, Error::MalformedKey { .. })
    ));
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
struct Shadowed {
    #[serde(rename = "x")]
    first: i32,
    #[serde(rename = "x,omitempty")]
    second: i32,
    y: i32,
}

#[test]
fn test_duplicate_names_are_reported() {
    let (value, errors) = Engine::new().decode_new::<Shadowed>(&form! {
        "x" => ["1"],
        "y" => ["2"],
    });

    assert_eq!(
        value,
        Some(Shadowed {
            first: 0,
            second: 0,
            y: 2
        })
    );
    assert!(matches!(
        errors.get("x"),
        Some(Error::Field { source, .. }) if matches!(**source, Error::DuplicateField { .. })
    ));
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
struct Labels {
    labels: BTreeMap<String, String>,
    limits: BTreeMap<u8, Vec<u32>>,
}

#[test]
fn test_map_fields() {
    let mut labels = Labels {
        labels: BTreeMap::from([("env".to_string(), "dev".to_string())]),
        limits: BTreeMap::new(),
    };

    let errors = Engine::new()
        .decode(
            &form! {
                "labels.team" => ["core"],
                "labels.env" => ["prod"],
                "limits.1" => ["10", "20"],
                "limits.x" => ["30"],
            },
            &mut labels,
        )
        .unwrap_err();

    assert_eq!(labels.labels.get("env").map(String::as_str), Some("prod"));
    assert_eq!(labels.labels.get("team").map(String::as_str), Some("core"));
    assert_eq!(labels.limits.get(&1), Some(&vec![10, 20]));
    assert_eq!(labels.limits.len(), 1);
    assert_eq!(errors.keys().collect::<Vec<_>>(), vec!["limits.x"]);
}

#[derive(Deserialize, Debug, Default)]
struct Envelope {
    kind: String,
    extra: serde_json::Value,
}

#[test]
fn test_self_describing_field() {
    let (envelope, errors) = Engine::new().decode_new::<Envelope>(&form! {
        "kind" => ["event"],
        "extra.a" => ["1"],
        "extra.b" => ["x", "y"],
    });

    assert!(errors.is_empty(), "{errors}");
    let envelope = envelope.unwrap();
    assert_eq!(envelope.kind, "event");
    assert_eq!(
        envelope.extra,
        serde_json::json!({ "a": "1", "b": ["x", "y"] })
    );
}

/// A string that must always be present.
#[derive(Debug)]
struct Required(String);

impl<'de> Deserialize<'de> for Required {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer
            .deserialize_newtype_struct("Required", TextVisitor::<String>::new())
            .map(Required)
    }
}

#[derive(Deserialize, Debug)]
struct Account {
    id: Required,
    name: String,
}

#[test]
fn test_unrecoverable_record_yields_nothing() {
    let (account, errors) = Engine::new().decode_new::<Account>(&form! { "name" => ["x"] });
    assert!(account.is_none());
    assert!(errors.contains_key("id"));

    let (account, errors) = Engine::new().decode_new::<Account>(&form! { "id" => ["a-1"] });
    assert!(errors.is_empty(), "{errors}");
    assert_eq!(account.unwrap().id.0, "a-1");
}

#[test]
fn test_registered_decoder_wins_over_text_capability() {
    let mut engine = Engine::new();
    engine
        .register_decoder::<RudeBool, _>(|s| match s {
            "si" => Ok(RudeBool(true)),
            "no" => Ok(RudeBool(false)),
            _ => Err("expected si or no"),
        })
        .unwrap();

    let (p, errors) = engine.decode_new::<Profile>(&form! { "rude" => ["si"] });
    assert!(errors.is_empty(), "{errors}");
    assert_eq!(p.unwrap().rude, RudeBool(true));

    let (_, errors) = engine.decode_new::<Profile>(&form! { "rude" => ["yup"] });
    assert!(matches!(
        errors.get("rude"),
        Some(Error::Field { source, .. }) if matches!(**source, Error::Conversion { .. })
    ));
}

#[derive(Deserialize, Debug)]
struct Pages {
    s: Vec<std::num::NonZeroU32>,
}

#[test]
fn test_rejected_element_without_zero_is_dropped() {
    let (pages, errors) = Engine::new().decode_new::<Pages>(&form! { "s" => ["1", "0", "3"] });
    let pages: Vec<u32> = pages.unwrap().s.iter().map(|n| n.get()).collect();

    // Later elements move down one index.
    assert_eq!(pages, [1, 3]);
    assert_eq!(errors.len(), 1, "{errors}");
    assert!(errors.contains_key("s"));
}

#[derive(Deserialize, Debug)]
struct Votes {
    v: Vec<RudeBool>,
}

#[test]
fn test_rejected_element_with_zero_keeps_its_position() {
    let (votes, errors) =
        Engine::new().decode_new::<Votes>(&form! { "v" => ["yup", "perhaps", "yup"] });

    assert_eq!(
        votes.unwrap().v,
        [RudeBool(true), RudeBool(false), RudeBool(true)]
    );
    assert!(errors.contains_key("v"));
}

#[derive(Deserialize, Debug)]
struct Ledger {
    plain: i64,
    alias: IntAlias,
}

#[test]
fn test_newtype_does_not_inherit_primitive_decoder() {
    let mut engine = Engine::new();
    engine
        .register_decoder::<i64, _>(|s| match s.strip_prefix('#') {
            Some(digits) => digits.parse::<i64>().map_err(|e| e.to_string()),
            None => Err(format!("{s:?} has no leading #")),
        })
        .unwrap();

    let (ledger, errors) =
        engine.decode_new::<Ledger>(&form! { "plain" => ["#5"], "alias" => ["7"] });
    assert!(errors.is_empty(), "{errors}");
    let ledger = ledger.unwrap();
    assert_eq!(ledger.plain, 5);
    assert_eq!(ledger.alias, IntAlias(7));
}
