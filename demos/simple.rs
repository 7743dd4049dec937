//! Basic form encoding and decoding.
//!
//! Run with: cargo run --example simple

use serde::{Deserialize, Serialize};
use serde_form::{from_form, to_form};
use std::error::Error;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Search {
    #[serde(rename = "q")]
    query: String,
    page: u32,
    #[serde(rename = "lang,omitempty")]
    languages: Vec<String>,
    exact: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let search = Search {
        query: "serde forms".to_string(),
        page: 2,
        languages: vec!["en".to_string(), "de".to_string()],
        exact: false,
    };

    // Encode to a flat form
    let form = to_form(&search)?;
    println!("Form output:");
    for (key, value) in form.pairs() {
        println!("  {key}={value}");
    }

    // Decode back to the record
    let search_back: Search = from_form(&form)?;
    assert_eq!(search, search_back);
    println!("✓ Round-trip successful");

    Ok(())
}
