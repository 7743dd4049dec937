//! Registering text conversions for types without a form representation.
//!
//! Run with: cargo run --example custom_converters

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_form::{form, Engine};
use std::error::Error;

/// A calendar day, written `dd/mm/yyyy` in forms.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
struct Day(NaiveDate);

impl Default for Day {
    fn default() -> Self {
        Day(NaiveDate::MIN)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
struct Cents(u64);

#[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
struct Booking {
    guest: String,
    arrival: Day,
    departure: Day,
    deposit: Cents,
}

fn main() -> Result<(), Box<dyn Error>> {
    let mut engine = Engine::new();
    engine.register::<Day, _>(
        |day| day.0.format("%d/%m/%Y").to_string(),
        |text| NaiveDate::parse_from_str(text, "%d/%m/%Y").map(Day),
    )?;
    engine.register::<Cents, _>(
        |cents| format!("{}.{:02}", cents.0 / 100, cents.0 % 100),
        |text| -> Result<Cents, String> {
            let (units, cents) = text.split_once('.').unwrap_or((text, "0"));
            let units: u64 = units.parse().map_err(|e| format!("{e}"))?;
            let cents: u64 = cents.parse().map_err(|e| format!("{e}"))?;
            Ok(Cents(units * 100 + cents))
        },
    )?;

    let booking = Booking {
        guest: "Ada".to_string(),
        arrival: Day(NaiveDate::from_ymd_opt(2024, 3, 1).ok_or("bad date")?),
        departure: Day(NaiveDate::from_ymd_opt(2024, 3, 4).ok_or("bad date")?),
        deposit: Cents(12_550),
    };

    let (form, errors) = engine.encode(&booking);
    errors.into_result()?;
    for (key, value) in form.pairs() {
        println!("{key}={value}");
    }

    let mut back = Booking::default();
    engine.decode(&form, &mut back)?;
    assert_eq!(back, booking);
    println!("✓ Round-trip successful");

    let (_, errors) = engine.decode_new::<Booking>(&form! {
        "arrival" => ["2024-03-01"],
        "deposit" => ["12.5x"],
    });
    println!("\nRejected input: {errors}");
    for (key, error) in &errors {
        println!("  {key}: {error}");
    }

    Ok(())
}
