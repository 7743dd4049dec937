use serde::{Deserialize, Serialize};
use serde_form::{form, from_text, text_leaf, Engine, FormMap};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

#[test]
fn test_form_macro_empty() {
    let form = form!();
    assert!(form.is_empty());
    assert_eq!(form, FormMap::new());
}

#[test]
fn test_form_macro_keeps_order_and_values() {
    let form = form! {
        "z" => ["last"],
        "a" => ["1", "2"],
        "m" => [],
    };

    assert_eq!(form.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
    assert_eq!(form.get("a"), Some("1"));
    assert_eq!(form.get_all("a").map(<[String]>::len), Some(2));
    assert_eq!(form.get_all("m").map(<[String]>::len), Some(0));
}

#[test]
fn test_form_macro_accepts_displayable_values() {
    let id = 7u64;
    let form = form! { "id" => [id, 1.5, true], "name" => [String::from("x")] };

    assert_eq!(
        form.get_all("id"),
        Some(&["7".to_string(), "1.5".to_string(), "true".to_string()][..])
    );
    assert_eq!(form.get("name"), Some("x"));
}

#[test]
fn test_form_macro_later_key_replaces() {
    let form = form! { "k" => ["1"], "k" => ["2", "3"] };
    assert_eq!(form.len(), 1);
    assert_eq!(form.get_all("k").map(<[String]>::len), Some(2));
}

#[derive(Debug, PartialEq)]
struct Gateway(Ipv4Addr);

impl Default for Gateway {
    fn default() -> Self {
        Gateway(Ipv4Addr::UNSPECIFIED)
    }
}

impl FromStr for Gateway {
    type Err = std::net::AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Gateway)
    }
}

from_text!(Gateway);

#[derive(Deserialize, Debug, Default)]
struct Network {
    gateway: Gateway,
    fallback: Gateway,
    mirrors: Vec<Gateway>,
}

#[test]
fn test_from_text_macro() {
    let (network, errors) = Engine::new().decode_new::<Network>(&form! {
        "gateway" => ["10.0.0.1"],
        "mirrors" => ["10.0.0.2", "10.0.0.3"],
    });

    assert!(errors.is_empty(), "{errors}");
    let network = network.unwrap();
    assert_eq!(network.gateway, Gateway(Ipv4Addr::new(10, 0, 0, 1)));
    assert_eq!(network.fallback, Gateway(Ipv4Addr::UNSPECIFIED));
    assert_eq!(network.mirrors.len(), 2);
}

#[test]
fn test_from_text_macro_reports_parse_errors() {
    let (network, errors) = Engine::new().decode_new::<Network>(&form! {
        "gateway" => ["not-an-ip"],
        "fallback" => ["192.168.0.1"],
    });

    assert!(errors.contains_key("gateway"));
    let network = network.unwrap();
    assert_eq!(network.gateway, Gateway::default());
    assert_eq!(network.fallback, Gateway(Ipv4Addr::new(192, 168, 0, 1)));
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
enum Weekday {
    #[default]
    Mon,
    Tue,
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Weekday::Mon => "monday",
            Weekday::Tue => "tuesday",
        })
    }
}

impl FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monday" => Ok(Weekday::Mon),
            "tuesday" => Ok(Weekday::Tue),
            other => Err(format!("unknown day {other:?}")),
        }
    }
}

text_leaf!(Weekday);

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
struct Schedule {
    start: Weekday,
    #[serde(rename = "days,omitempty")]
    days: Vec<Weekday>,
}

#[test]
fn test_text_leaf_macro_round_trip() {
    let engine = Engine::new();
    let schedule = Schedule {
        start: Weekday::Tue,
        days: vec![Weekday::Mon, Weekday::Tue],
    };

    let (form, errors) = engine.encode(&schedule);
    assert!(errors.is_empty(), "{errors}");
    assert_eq!(form.get("start"), Some("tuesday"));
    assert_eq!(
        form.get_all("days"),
        Some(&["monday".to_string(), "tuesday".to_string()][..])
    );

    let mut back = Schedule::default();
    engine.decode(&form, &mut back).unwrap();
    assert_eq!(back, schedule);
}

#[test]
fn test_text_leaf_macro_in_place_failure() {
    let engine = Engine::new();
    let mut schedule = Schedule {
        start: Weekday::Tue,
        days: vec![],
    };

    let errors = engine
        .decode(&form! { "start" => ["someday"] }, &mut schedule)
        .unwrap_err();
    assert!(errors.contains_key("start"));
    assert_eq!(schedule.start, Weekday::Tue);
}
