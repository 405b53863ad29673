//! `#[derive(Model)]` output, checked without a database.

#![allow(dead_code)]

use std::sync::Arc;
use tablemodel::{Model, OrmError, OrmResult, Record, Value};

#[derive(Debug, Model)]
#[orm(table = "categories")]
struct Category(Record);

#[derive(Debug, Model)]
#[orm(table = "audit.events", primary_key = "event_id")]
struct Event {
    inner: Record,
}

#[derive(Debug, Model)]
#[orm(table = "users")]
#[orm(validate = "checks::email_present")]
struct User(tablemodel::Record);

mod checks {
    use super::*;

    pub fn email_present(record: &Record) -> OrmResult<()> {
        if record.is_set("email") {
            Ok(())
        } else {
            Err(OrmError::validation("email is required"))
        }
    }
}

fn columns(names: &[&str]) -> Arc<[String]> {
    names.iter().map(|n| n.to_string()).collect()
}

#[test]
fn constants_from_attributes() {
    assert_eq!(Category::TABLE, "categories");
    assert_eq!(Category::PRIMARY_KEY, "id");
    assert_eq!(Event::TABLE, "audit.events");
    assert_eq!(Event::PRIMARY_KEY, "event_id");
}

#[test]
fn binding_follows_constants() {
    let binding = Event::binding();
    assert_eq!(binding.table(), "audit.events");
    assert_eq!(binding.primary_key_name(), "event_id");
}

#[test]
fn record_accessors_for_tuple_and_named_structs() {
    let record = Record::with_data("categories", columns(&["id", "name"]), [("name", "Fiction")]);
    let mut c = Category::from_record(record);
    assert_eq!(c.record().table(), "categories");
    c.record_mut().set("id", 3).unwrap();
    assert_eq!(c.id(), Value::Int(3));

    let e = Event::from_record(Record::new("audit.events", columns(&["event_id"])));
    assert!(!e.record().has_data());
    assert!(e.id().is_null());
}

#[test]
fn default_validation_accepts_everything() {
    let record = Record::new("categories", columns(&["id"]));
    assert!(Category::validate(&record).is_ok());
}

#[test]
fn validate_attribute_forwards_to_function() {
    let cols = columns(&["id", "email"]);
    let missing = Record::with_data("users", Arc::clone(&cols), [("id", 1)]);
    assert!(User::validate(&missing).unwrap_err().is_validation());

    let present = Record::with_data("users", cols, [("email", "a@example.com")]);
    assert!(User::validate(&present).is_ok());
}
