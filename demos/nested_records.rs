//! Nested records, indexed sequences and partial decoding.
//!
//! Run with: cargo run --example nested_records

use serde::{Deserialize, Serialize};
use serde_form::{form, Engine};
use std::error::Error;

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
struct Address {
    street: String,
    city: String,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
struct Contact {
    name: String,
    phones: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
struct Customer {
    id: u64,
    address: Address,
    contacts: Vec<Contact>,
    #[serde(rename = "vip,omitempty")]
    vip: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let engine = Engine::new();

    let customer = Customer {
        id: 7,
        address: Address {
            street: "1 Main St".to_string(),
            city: "Springfield".to_string(),
        },
        contacts: vec![
            Contact {
                name: "Ann".to_string(),
                phones: vec!["555-0100".to_string()],
            },
            Contact {
                name: "Ben".to_string(),
                phones: vec!["555-0101".to_string(), "555-0102".to_string()],
            },
        ],
        vip: false,
    };

    let (form, errors) = engine.encode(&customer);
    errors.into_result()?;
    println!("Encoded:");
    for (key, values) in &form {
        println!("  {key} = {values:?}");
    }

    // A form edits only what it mentions
    let mut edited = customer;
    let update = form! {
        "address.city" => ["Shelbyville"],
        "contacts.1.name" => ["Benjamin"],
        "contacts.3.name" => ["Dee"],
    };
    engine.decode(&update, &mut edited)?;

    println!("\nAfter partial decode:");
    println!("  city     = {}", edited.address.city);
    println!("  street   = {}", edited.address.street);
    println!("  contacts = {:?}", edited.contacts.iter().map(|c| &c.name).collect::<Vec<_>>());
    assert_eq!(edited.contacts.len(), 4);
    assert_eq!(edited.contacts[1].phones.len(), 2);

    // Bad fields are reported by key; the rest still decodes
    let bad = form! {
        "id" => ["seven"],
        "contacts.x.name" => ["Eve"],
        "address.city" => ["Ogdenville"],
    };
    let (decoded, errors) = engine.decode_new::<Customer>(&bad);
    println!("\nDecoded with {} error(s): {errors}", errors.len());
    for (key, error) in &errors {
        println!("  {key}: {error}");
    }
    if let Some(decoded) = decoded {
        println!("  city = {}", decoded.address.city);
    }

    Ok(())
}
