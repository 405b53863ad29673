//! End-to-end behaviour against an in-memory SQLite database.

use chrono::NaiveDateTime;
use std::collections::BTreeSet;
use std::sync::Once;
use std::thread;
use std::time::Duration;
use tablemodel::{
    Database, FinderOutput, Model, OrmError, OrmResult, Record, SqliteConnection, TableBinding,
    Value,
};

#[derive(Debug, Model)]
#[orm(table = "categories")]
struct Category(Record);

#[derive(Debug, Model)]
#[orm(table = "categories", validate = "require_name")]
struct StrictCategory {
    record: Record,
}

fn require_name(record: &Record) -> OrmResult<()> {
    let name: Option<String> = record.get_as("name")?;
    if name.is_some_and(|n| !n.trim().is_empty()) {
        Ok(())
    } else {
        Err(OrmError::validation("name is required"))
    }
}

#[derive(Debug, Model)]
#[orm(table = "tags", primary_key = "tag_id")]
struct Tag(Record);

// `RUST_LOG=tablemodel.sql=debug cargo test` shows every statement.
fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn setup() -> Database<SqliteConnection> {
    init_tracing();
    let db = Database::new(SqliteConnection::open_in_memory().unwrap());
    db.connection()
        .inner()
        .execute_batch(
            "CREATE TABLE categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(120) DEFAULT NULL,
                updated_at TIMESTAMP NULL DEFAULT NULL,
                created_at TIMESTAMP NULL DEFAULT NULL
            );
            CREATE TABLE tags (
                tag_id INTEGER PRIMARY KEY,
                label TEXT UNIQUE
            );",
        )
        .unwrap();
    db
}

fn insert(db: &Database<SqliteConnection>, name: &str) -> Category {
    let mut c = Category::create(db, [("name", name)]).unwrap();
    assert!(c.save(db).unwrap());
    c
}

fn stamp(c: &Category, field: &str) -> NaiveDateTime {
    c.get_as(field).unwrap()
}

#[test]
fn insert_assigns_key_and_timestamps() {
    let db = setup();
    let c = insert(&db, "Fiction");

    assert!(c.id().is_truthy());
    assert_eq!(c.id(), Value::Int(1));
    assert!(c.record().is_set("created_at"));
    assert_eq!(c.get("created_at").unwrap(), c.get("updated_at").unwrap());
    assert!(c.record().dirty_fields().is_empty());
    assert_eq!(Category::count(&db).unwrap(), 1);
}

#[test]
fn update_refreshes_updated_at_only() {
    let db = setup();
    let mut c = insert(&db, "Fiction");
    let id = c.id();
    let created = stamp(&c, "created_at");

    thread::sleep(Duration::from_secs(1));
    c.set("name", "Literary Fiction").unwrap();
    assert!(c.save(&db).unwrap());

    assert_eq!(c.id(), id);
    assert!(stamp(&c, "updated_at") > created);
    assert_eq!(stamp(&c, "created_at"), created);

    let reloaded = Category::get_by_id(&db, id).unwrap().unwrap();
    assert_eq!(reloaded.get("name").unwrap(), &Value::from("Literary Fiction"));
    assert_eq!(stamp(&reloaded, "updated_at"), stamp(&c, "updated_at"));
    assert_eq!(Category::count(&db).unwrap(), 1);
}

#[test]
fn finders_over_several_names() {
    let db = setup();
    let names = ["Fiction", "SciFi", "Poetry", "Drama"];
    for name in names {
        insert(&db, name);
    }
    insert(&db, "Cookery");

    let expected: BTreeSet<String> = names.iter().map(|n| n.to_string()).collect();
    fn names_of(found: &[Category]) -> BTreeSet<String> {
        found
            .iter()
            .map(|c| c.get_as::<String>("name").unwrap())
            .collect()
    }

    let found = Category::find_by(&db, "name", names).unwrap();
    assert_eq!(found.len(), 4);
    assert_eq!(names_of(&found), expected);
    match Category::call(&db, "find_by_name", names.to_vec()).unwrap() {
        FinderOutput::Many(found) => {
            assert_eq!(found.len(), 4);
            assert_eq!(names_of(&found), expected);
        }
        other => panic!("expected rows, got {other:?}"),
    }
    assert_eq!(Category::count_by(&db, "name", names).unwrap(), 4);
    assert_eq!(Category::count_by(&db, "name", "Poetry").unwrap(), 1);

    let first = Category::first_by(&db, "name", names).unwrap().unwrap();
    assert_eq!(first.get("name").unwrap(), &Value::from("Drama"));
    let last = Category::last_by(&db, "name", names).unwrap().unwrap();
    assert_eq!(last.get("name").unwrap(), &Value::from("SciFi"));
}

#[test]
fn missing_rows_are_absent_not_errors() {
    let db = setup();
    insert(&db, "Fiction");

    assert!(Category::get_by_id(&db, 999).unwrap().is_none());
    assert!(Category::find_one_by(&db, "name", "Nope").unwrap().is_none());
    match Category::call(&db, "findOne_by_name", "Nope").unwrap() {
        FinderOutput::One(None) => {}
        other => panic!("expected no row, got {other:?}"),
    }
    assert!(Category::find_by(&db, "name", "Nope").unwrap().is_empty());
}

#[test]
fn delete_by_id_reports_removal_once() {
    let db = setup();
    let c = insert(&db, "Fiction");

    assert!(Category::delete_by_id(&db, c.id()).unwrap());
    assert!(!Category::delete_by_id(&db, c.id()).unwrap());
    assert_eq!(Category::count(&db).unwrap(), 0);
}

#[test]
fn instance_delete() {
    let db = setup();
    let a = insert(&db, "a");
    insert(&db, "b");

    assert!(a.delete(&db).unwrap());
    assert_eq!(Category::count(&db).unwrap(), 1);
    assert!(Category::find(&db, a.id()).unwrap().is_empty());
}

#[test]
fn clean_update_issues_no_sql() {
    let db = setup();
    let c = insert(&db, "Fiction");
    let mut fetched = Category::get_by_id(&db, c.id()).unwrap().unwrap();
    assert!(fetched.record().dirty_fields().is_empty());

    let before = db.cache_stats();
    assert!(!fetched.save(&db).unwrap());
    assert!(!fetched.update(&db, true).unwrap());
    let after = db.cache_stats();
    assert_eq!(before.hits + before.misses, after.hits + after.misses);
}

#[test]
fn empty_insert_uses_default_values() {
    let db = setup();
    let mut c = Category::blank(&db).unwrap();
    assert!(c.insert(&db, false, false).unwrap());

    assert_eq!(c.id(), Value::Int(1));
    let stored = Category::get_by_id(&db, 1).unwrap().unwrap();
    assert_eq!(stored.get("name").unwrap(), &Value::Null);
}

#[test]
fn validation_failure_aborts_write() {
    let db = setup();
    let mut bad = StrictCategory::create(&db, [("name", "  ")]).unwrap();

    let err = bad.save(&db).unwrap_err();
    assert!(err.is_validation());
    assert!(bad.record().is_dirty("name"));
    assert_eq!(Category::count(&db).unwrap(), 0);

    bad.set("name", "Fixed").unwrap();
    assert!(bad.save(&db).unwrap());
    assert_eq!(Category::count(&db).unwrap(), 1);
}

#[test]
fn statements_are_reused() {
    let db = setup();
    insert(&db, "a");
    let prepared = db.cache_stats().prepared;

    insert(&db, "b");
    insert(&db, "c");

    let stats = db.cache_stats();
    assert_eq!(stats.prepared, prepared);
    assert!(stats.hits >= 2);
}

#[test]
fn first_last_and_fetch_where() {
    let db = setup();
    for name in ["a", "b", "c"] {
        insert(&db, name);
    }

    let first = Category::first(&db).unwrap().unwrap();
    assert_eq!(first.get("name").unwrap(), &Value::from("a"));
    let last = Category::last(&db).unwrap().unwrap();
    assert_eq!(last.get("name").unwrap(), &Value::from("c"));

    let all = Category::fetch_all_where(&db, "1=1", &[]).unwrap();
    assert_eq!(all.len(), 3);
    let one = Category::fetch_where(&db, "name <> ?", &[Value::from("a")], true).unwrap();
    assert_eq!(one.len(), 1);
    let b = Category::fetch_one_where(&db, "name = ?", &[Value::from("b")])
        .unwrap()
        .unwrap();
    assert_eq!(b.id(), Value::Int(2));

    assert_eq!(
        Category::count_where(&db, "id > ?", &[Value::Int(1)]).unwrap(),
        2
    );
    assert_eq!(
        Category::delete_all_where(&db, "name IN (?, ?)", &[Value::from("a"), Value::from("b")])
            .unwrap(),
        2
    );
    assert_eq!(Category::count(&db).unwrap(), 1);
}

#[test]
fn failed_update_keeps_dirty_fields() {
    let db = setup();
    let c = insert(&db, "Fiction");
    let mut stale = Category::get_by_id(&db, c.id()).unwrap().unwrap();
    Category::delete_by_id(&db, c.id()).unwrap();

    stale.set("name", "Gone").unwrap();
    assert!(!stale.save(&db).unwrap());
    assert!(stale.record().is_dirty("name"));
}

#[test]
fn null_assignment_is_written() {
    let db = setup();
    let mut c = insert(&db, "Fiction");
    c.set("name", Value::Null).unwrap();
    assert!(c.save(&db).unwrap());

    let stored = Category::get_by_id(&db, c.id()).unwrap().unwrap();
    assert_eq!(stored.get("name").unwrap(), &Value::Null);
}

#[test]
fn caller_supplied_key_with_custom_primary_key() {
    let db = setup();
    let mut t = Tag::create(&db, [("tag_id", Value::Int(100)), ("label", Value::from("rust"))])
        .unwrap();
    assert!(t.insert(&db, true, true).unwrap());
    assert_eq!(t.id(), Value::Int(100));

    let stored = Tag::get_by_id(&db, 100).unwrap().unwrap();
    assert_eq!(stored.get("label").unwrap(), &Value::from("rust"));
}

#[test]
fn unique_violation_propagates_driver_error() {
    let db = setup();
    let mut a = Tag::create(&db, [("label", "dup")]).unwrap();
    assert!(a.save(&db).unwrap());

    let mut b = Tag::create(&db, [("label", "dup")]).unwrap();
    let err = b.save(&db).unwrap_err();
    assert!(err.is_driver_error());
    assert!(err.is_unique_violation());
    assert!(b.record().is_dirty("label"));
}

#[test]
fn unknown_table_and_field() {
    let db = setup();
    assert!(matches!(
        TableBinding::new("ghosts").columns(&db),
        Err(OrmError::NoSuchTable(_))
    ));
    assert!(Category::find_by(&db, "colour", "red").unwrap_err().is_unknown_field());

    let mut c = Category::blank(&db).unwrap();
    assert!(c.set("colour", "red").unwrap_err().is_unknown_field());
}

#[test]
fn records_serialize_in_column_order() {
    let db = setup();
    let c = insert(&db, "Fiction");
    let json = serde_json::to_value(c.record()).unwrap();
    let keys: Vec<&str> = json
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(json["name"], "Fiction");
    assert_eq!(json["id"], 1);
    assert_eq!(keys.len(), 4);
}

#[test]
fn custom_binding_without_a_model() {
    let db = setup();
    let tags = TableBinding::new("tags").primary_key("tag_id");
    let mut r = tags.create(&db, [("label", "raw")]).unwrap();
    assert!(tags.save(&db, &mut r).unwrap());
    assert_eq!(r.get_as::<i64>("tag_id").unwrap(), 1);
    assert_eq!(tags.count(&db).unwrap(), 1);
    assert_eq!(tags.columns(&db).unwrap().as_ref(), ["tag_id", "label"]);
}
