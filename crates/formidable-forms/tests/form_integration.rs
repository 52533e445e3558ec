//! Integration tests for the request → form → object pipeline.
//!
//! These tests exercise the complete binding pipeline, covering:
//! 1. Key-path parsing of flat request data
//! 2. Scalar fields inside forms (names, precedence, saves)
//! 3. Nested forms and form-sets, with and without objects
//! 4. Message layering across nested forms
//! 5. Deletion markers and object reconciliation

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveTime};
use indexmap::IndexMap;

use formidable_core::error::{FormError, FormResult, ParseError};
use formidable_core::utils::MultiValueDict;
use formidable_core::value::Value;
use formidable_forms::bound_field::Field;
use formidable_forms::fields::FieldSpec;
use formidable_forms::form::{Form, FormSchema, Saved, DELETED};
use formidable_forms::kinds::{
    Boolean, Date, DateTime, File, Float, Integer, List, Slug, Text, Time,
};
use formidable_forms::messages;
use formidable_forms::object::{Model, ModelFactory, Object};
use formidable_forms::parser::{KeyPathParser, RequestTree};

// ============================================================================
// Shared helpers
// ============================================================================

fn dict(pairs: &[(&str, Vec<&str>)]) -> MultiValueDict<String, String> {
    MultiValueDict::from_pairs(pairs.iter().map(|(k, vs)| (*k, vs.clone())))
}

fn bind(schema: Arc<FormSchema>, pairs: &[(&str, Vec<&str>)]) -> Form {
    let mut form = Form::new(schema);
    form.bind(Some(&dict(pairs)), None).unwrap();
    form
}

fn bind_with(schema: Arc<FormSchema>, pairs: &[(&str, Vec<&str>)], object: Value) -> Form {
    let mut form = Form::new(schema);
    form.bind(Some(&dict(pairs)), Object::from_value(object))
        .unwrap();
    form
}

fn saved_data(form: &mut Form) -> Value {
    match form.save().unwrap() {
        Saved::Data(data) | Saved::Updated(data) => data,
        other => panic!("unexpected save result: {other:?}"),
    }
}

fn value<'a>(form: &'a Form, name: &str) -> Option<&'a Value> {
    form.field(name).and_then(Field::value)
}

fn name<'a>(form: &'a Form, field: &str) -> &'a str {
    form.field(field).map(Field::name).unwrap()
}

fn address_schema() -> Arc<FormSchema> {
    FormSchema::builder("Address")
        .field("street", FieldSpec::scalar(Text::default()))
        .field("city", FieldSpec::scalar(Text::default()))
        .build()
        .unwrap()
}

fn skill_schema() -> Arc<FormSchema> {
    FormSchema::builder("Skill")
        .field("name", FieldSpec::scalar(Text::default()))
        .field("level", FieldSpec::scalar(Integer::default()).default(1))
        .build()
        .unwrap()
}

// ============================================================================
// 1. Key-path parsing
// ============================================================================

#[test]
fn test_parse_plain_keys_into_one_mapping() {
    let tree = KeyPathParser::new()
        .parse(&dict(&[("name", vec!["Ada"]), ("age", vec!["36"])]))
        .unwrap();
    assert_eq!(tree.get("name").as_str(), Some("Ada"));
    assert_eq!(tree.get("age").as_str(), Some("36"));
    assert_eq!(tree.as_map().map(IndexMap::len), Some(2));
}

#[test]
fn test_parse_indexed_sequence_of_mappings() {
    let tree = KeyPathParser::new()
        .parse(&dict(&[("a[0][x]", vec!["1"]), ("a[1][x]", vec!["2"])]))
        .unwrap();
    assert_eq!(
        tree.to_value(),
        Some(Value::map([(
            "a",
            Value::List(vec![Value::map([("x", "1")]), Value::map([("x", "2")])]),
        )]))
    );
}

#[test]
fn test_parse_append_keys_keep_every_value() {
    let tree = KeyPathParser::new()
        .parse(&dict(&[("tags[]", vec!["a", "b", "c"])]))
        .unwrap();
    let tags = tree.get("tags").as_list().unwrap();
    assert_eq!(tags.len(), 3);
    assert_eq!(tags[&2].as_str(), Some("c"));
}

#[test]
fn test_parse_first_value_wins_for_plain_keys() {
    let tree = KeyPathParser::new()
        .parse(&dict(&[("name", vec!["first", "second"])]))
        .unwrap();
    assert_eq!(tree.get("name").as_str(), Some("first"));
}

#[test]
fn test_parse_structural_errors_surface_from_bind() {
    let schema = address_schema();
    let cases = [
        ("street[", "unbalanced"),
        ("street]", "unbalanced"),
        ("[street]", "empty root"),
        ("street[][x]", "append not last"),
    ];
    for (key, expected) in cases {
        let mut form = Form::new(Arc::clone(&schema));
        let err = match form.bind(Some(&dict(&[(key, vec!["x"])])), None) {
            Err(FormError::Parse(err)) => err,
            other => panic!("{key}: expected a parse error, got {other:?}"),
        };
        let kind = match err {
            ParseError::UnbalancedBrackets(_) => "unbalanced",
            ParseError::EmptyRoot(_) => "empty root",
            ParseError::EmptyBracketNotLast(_) => "append not last",
            _ => "other",
        };
        assert_eq!(kind, expected, "{key}");
    }
}

#[test]
fn test_parse_index_limit_is_opt_in() {
    let parser = KeyPathParser::new().with_max_index(10);
    let err = parser
        .parse(&dict(&[("a[11]", vec!["x"])]))
        .unwrap_err();
    assert!(matches!(err, ParseError::IndexTooLarge { index: 11, max: 10, .. }));
    assert!(parser.parse(&dict(&[("a[10]", vec!["x"])])).is_ok());
    assert!(KeyPathParser::new()
        .parse(&dict(&[("a[5000]", vec!["x"])]))
        .is_ok());
}

#[test]
fn test_parse_urlencoded_body() {
    let data = MultiValueDict::from_urlencoded("address%5Bstreet%5D=Main+St&address%5Bcity%5D=Springfield");
    let schema = FormSchema::builder("Person")
        .field("address", FieldSpec::form(address_schema()))
        .build()
        .unwrap();
    let mut form = Form::new(schema);
    form.bind(Some(&data), None).unwrap();
    assert!(form.is_valid());
    assert_eq!(
        form.data(),
        Value::map([(
            "address",
            Value::map([("street", "Main St"), ("city", "Springfield")]),
        )])
    );
}

// ============================================================================
// 2. Scalar fields in forms
// ============================================================================

#[test]
fn test_text_field() {
    let schema = FormSchema::builder("T")
        .field("fullname", FieldSpec::scalar(Text::default()))
        .field("lorem", FieldSpec::scalar(Text::default()).default("ipsum"))
        .build()
        .unwrap();
    let mut form = bind(schema, &[("fullname", vec!["John Doe"])]);

    assert_eq!(name(&form, "fullname"), "fullname");
    assert_eq!(value(&form, "fullname"), Some(&Value::from("John Doe")));
    assert_eq!(value(&form, "lorem"), Some(&Value::from("ipsum")));
    assert_eq!(
        saved_data(&mut form),
        Value::map([("fullname", "John Doe"), ("lorem", "ipsum")])
    );
}

#[test]
fn test_integer_field() {
    let schema = FormSchema::builder("T")
        .field("age", FieldSpec::scalar(Integer::default()))
        .field("min_age", FieldSpec::scalar(Integer::default()).default(18))
        .build()
        .unwrap();
    let mut form = bind(schema, &[("age", vec!["20"])]);
    assert_eq!(
        saved_data(&mut form),
        Value::map([("age", 20), ("min_age", 18)])
    );
}

#[test]
fn test_float_field() {
    let schema = FormSchema::builder("T")
        .field("x", FieldSpec::scalar(Float::default()))
        .field("y", FieldSpec::scalar(Float::default()))
        .field("z", FieldSpec::scalar(Float::default()).default(0))
        .build()
        .unwrap();
    let mut form = bind(schema, &[("x", vec!["20"]), ("y", vec!["15.5"])]);
    assert_eq!(
        saved_data(&mut form),
        Value::map([("x", 20.0), ("y", 15.5), ("z", 0.0)])
    );
}

#[test]
fn test_boolean_field() {
    let schema = FormSchema::builder("T")
        .field("alive", FieldSpec::scalar(Boolean).default(true))
        .field("owner", FieldSpec::scalar(Boolean).default(false))
        .field("admin", FieldSpec::scalar(Boolean))
        .field("alien", FieldSpec::scalar(Boolean))
        .build()
        .unwrap();
    let mut form = bind(schema, &[("admin", vec![""]), ("alien", vec!["false"])]);
    assert_eq!(
        saved_data(&mut form),
        Value::map([
            ("alive", true),
            ("owner", false),
            ("admin", true),
            ("alien", false),
        ])
    );
}

#[test]
fn test_list_field() {
    let schema = FormSchema::builder("T")
        .field("tags", FieldSpec::scalar(List::default()))
        .field("friends", FieldSpec::scalar(List::of(Integer::default())))
        .field("wat", FieldSpec::scalar(List::default()))
        .build()
        .unwrap();
    let mut form = bind(
        schema,
        &[
            ("tags[]", vec!["python", "formidable", "testing"]),
            ("friends[]", vec!["1", "2", "3"]),
        ],
    );

    assert_eq!(name(&form, "tags"), "tags[]");
    assert_eq!(name(&form, "friends"), "friends[]");
    assert_eq!(name(&form, "wat"), "wat[]");
    assert_eq!(
        saved_data(&mut form),
        Value::map([
            (
                "tags",
                Value::List(vec!["python".into(), "formidable".into(), "testing".into()]),
            ),
            ("friends", Value::List(vec![1.into(), 2.into(), 3.into()])),
            ("wat", Value::List(vec![])),
        ])
    );
}

#[test]
fn test_list_field_with_invalid_items() {
    let schema = FormSchema::builder("T")
        .field("friends", FieldSpec::scalar(List::of(Integer::default())))
        .build()
        .unwrap();
    let mut form = bind(schema, &[("friends[]", vec!["no", "not an int", "nope"])]);
    assert!(!form.is_valid());
    assert_eq!(form.errors()["friends[]"], messages::INVALID);
}

#[test]
fn test_date_datetime_time_fields() {
    let schema = FormSchema::builder("T")
        .field("birthday", FieldSpec::scalar(Date))
        .field("anniversary", FieldSpec::scalar(Date).default("2020-01-01"))
        .field("created", FieldSpec::scalar(DateTime))
        .field("updated", FieldSpec::scalar(DateTime).default("2024-06-05T12:34:56"))
        .field("start", FieldSpec::scalar(Time))
        .field("end", FieldSpec::scalar(Time).default("17:00:00"))
        .build()
        .unwrap();
    let mut form = bind(
        schema,
        &[
            ("birthday", vec!["1990-05-15"]),
            ("created", vec!["2025-06-05T08:30:00"]),
            ("start", vec!["09:15"]),
        ],
    );
    let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
    let time = |h, m, s| NaiveTime::from_hms_opt(h, m, s).unwrap();
    assert_eq!(
        saved_data(&mut form),
        Value::map([
            ("birthday", Value::Date(date(1990, 5, 15))),
            ("anniversary", Value::Date(date(2020, 1, 1))),
            ("created", Value::DateTime(date(2025, 6, 5).and_time(time(8, 30, 0)))),
            ("updated", Value::DateTime(date(2024, 6, 5).and_time(time(12, 34, 56)))),
            ("start", Value::Time(time(9, 15, 0))),
            ("end", Value::Time(time(17, 0, 0))),
        ])
    );
}

#[test]
fn test_file_field_values() {
    let schema = FormSchema::builder("T")
        .field("photo", FieldSpec::scalar(File))
        .build()
        .unwrap();
    for submitted in ["photo.jpg", ""] {
        let mut form = bind(Arc::clone(&schema), &[("photo", vec![submitted])]);
        assert!(form.is_valid(), "{submitted:?}: {:?}", form.errors());
        assert_eq!(saved_data(&mut form)["photo"], Value::from(submitted));
    }
}

#[test]
fn test_file_field_with_object_value() {
    let schema = FormSchema::builder("T")
        .field("photo", FieldSpec::scalar(File))
        .build()
        .unwrap();
    let object = || Value::map([("photo", "saved_photo.jpg")]);

    let mut form = bind_with(Arc::clone(&schema), &[("photo", vec![""])], object());
    assert!(form.is_valid());
    assert_eq!(saved_data(&mut form)["photo"], Value::from("saved_photo.jpg"));

    let mut form = bind_with(schema, &[("photo", vec!["new_photo.jpg"])], object());
    assert!(form.is_valid());
    assert_eq!(saved_data(&mut form)["photo"], Value::from("new_photo.jpg"));
}

#[test]
fn test_slug_field() {
    let schema = FormSchema::builder("T")
        .field("slug", FieldSpec::scalar(Slug))
        .field("default_slug", FieldSpec::scalar(Slug).default("default-slug"))
        .build()
        .unwrap();
    let mut form = bind(Arc::clone(&schema), &[("slug", vec!["my-custom-slug"])]);
    assert!(form.is_valid());
    assert_eq!(
        saved_data(&mut form),
        Value::map([("slug", "my-custom-slug"), ("default_slug", "default-slug")])
    );

    let mut form = bind(Arc::clone(&schema), &[("slug", vec!["Not a valid slug!"])]);
    assert!(!form.is_valid());
    assert_eq!(form.errors()["slug"], messages::INVALID_SLUG);

    form.field_mut("slug")
        .unwrap()
        .set_value(Some(Value::from("valid-slug_123")), None);
    assert!(form.validate());
}

#[test]
fn test_request_object_default_precedence() {
    let schema = FormSchema::builder("T")
        .field("a", FieldSpec::scalar(Text::default()).default("dflt"))
        .field("b", FieldSpec::scalar(Text::default()).default("dflt"))
        .field("c", FieldSpec::scalar(Text::default()).default("dflt"))
        .field("d", FieldSpec::scalar(Text::default()).default("dflt"))
        .build()
        .unwrap();
    let object = Value::map([("a", "obj"), ("b", "obj"), ("c", "obj")]);
    let form = bind_with(
        schema,
        &[("a", vec!["req"]), ("b", vec![""])],
        object,
    );
    assert_eq!(value(&form, "a"), Some(&Value::from("req")));
    assert_eq!(value(&form, "b"), Some(&Value::from("obj")));
    assert_eq!(value(&form, "c"), Some(&Value::from("obj")));
    assert_eq!(value(&form, "d"), Some(&Value::from("dflt")));
}

#[test]
fn test_required_only_without_earlier_error() {
    let schema = FormSchema::builder("T")
        .field(
            "code",
            FieldSpec::scalar(Text::default()).before(|v| {
                if v.as_str().map_or(true, str::is_empty) {
                    Err(formidable_core::FieldError::new("blocked"))
                } else {
                    Ok(v)
                }
            }),
        )
        .field("name", FieldSpec::scalar(Text::default()))
        .field("nick", FieldSpec::scalar(Text::default()).required(false))
        .build()
        .unwrap();
    let mut form = bind(schema, &[("code", vec![""])]);
    assert!(!form.is_valid());
    let errors = form.errors();
    assert_eq!(errors["code"], "blocked");
    assert_eq!(errors["name"], messages::REQUIRED);
    assert!(!errors.contains_key("nick"));
}

// ============================================================================
// 3. Nested forms and form-sets
// ============================================================================

#[test]
fn test_form_field() {
    let schema = FormSchema::builder("T")
        .field("address", FieldSpec::form(address_schema()))
        .build()
        .unwrap();
    let mut form = bind(
        schema,
        &[
            ("address[street]", vec!["123 Main St"]),
            ("address[city]", vec!["Springfield"]),
        ],
    );

    let child = form.field("address").and_then(Field::as_form).unwrap();
    assert_eq!(name(child.form(), "street"), "address[street]");
    assert_eq!(value(child.form(), "city"), Some(&Value::from("Springfield")));
    assert_eq!(
        saved_data(&mut form),
        Value::map([(
            "address",
            Value::map([("street", "123 Main St"), ("city", "Springfield")]),
        )])
    );
}

#[test]
fn test_form_field_falls_back_to_object() {
    let schema = FormSchema::builder("T")
        .field("address", FieldSpec::form(address_schema()))
        .build()
        .unwrap();
    let object = Value::map([(
        "address",
        Value::map([("street", "Old St"), ("city", "Shelbyville")]),
    )]);
    let mut form = bind_with(schema, &[("address[street]", vec!["New St"])], object);
    assert!(form.is_valid());
    assert_eq!(
        saved_data(&mut form)["address"],
        Value::map([("street", "New St"), ("city", "Shelbyville")])
    );
}

#[test]
fn test_formset_field() {
    let schema = FormSchema::builder("T")
        .field("skills", FieldSpec::form_set(skill_schema()))
        .build()
        .unwrap();
    let mut form = bind(
        schema,
        &[
            ("skills[0][name]", vec!["Python"]),
            ("skills[0][level]", vec!["5"]),
            ("skills[1][name]", vec!["JavaScript"]),
            ("skills[1][level]", vec!["3"]),
        ],
    );

    let skills = form.field("skills").and_then(Field::as_form_set).unwrap();
    assert_eq!(name(skills.new_form(), "name"), "skills[NEW_INDEX][name]");
    assert_eq!(name(skills.new_form(), "level"), "skills[NEW_INDEX][level]");
    let first = skills.form("0").unwrap();
    assert_eq!(name(first, "level"), "skills[0][level]");
    assert_eq!(value(first, "level"), Some(&Value::Int(5)));

    assert_eq!(
        saved_data(&mut form),
        Value::map([(
            "skills",
            Value::List(vec![
                Value::map([("name", Value::from("Python")), ("level", Value::Int(5))]),
                Value::map([("name", Value::from("JavaScript")), ("level", Value::Int(3))]),
            ]),
        )])
    );
}

#[test]
fn test_formset_cardinality_with_object_items() {
    let schema = FormSchema::builder("T")
        .field(
            "skills",
            FieldSpec::form_set(skill_schema()).min_items(2).max_items(3),
        )
        .build()
        .unwrap();
    let object = || {
        Value::map([(
            "skills",
            Value::List(vec![
                Value::map([("id", Value::Int(1)), ("name", Value::from("Rust"))]),
                Value::map([("id", Value::Int(2)), ("name", Value::from("Go"))]),
            ]),
        )])
    };

    // Two objects plus one new item.
    let mut form = bind_with(Arc::clone(&schema), &[("skills[0][name]", vec!["C"])], object());
    assert!(form.is_valid());

    // Two new items plus two objects.
    let mut form = bind_with(
        Arc::clone(&schema),
        &[("skills[0][name]", vec!["C"]), ("skills[5][name]", vec!["D"])],
        object(),
    );
    assert!(!form.is_valid());
    assert_eq!(form.errors()["skills"], messages::MAX_ITEMS);
    assert_eq!(form.error_messages()["skills"], "Must have at most 3 items.");

    // One object deleted, no new items.
    let mut form = bind_with(
        Arc::clone(&schema),
        &[("skills[1][_deleted]", vec!["1"])],
        object(),
    );
    assert!(!form.is_valid());
    assert_eq!(form.errors()["skills"], messages::MIN_ITEMS);

    // Editing an object does not add an item.
    let mut form = bind_with(schema, &[("skills[2][name]", vec!["Zig"])], object());
    assert!(form.is_valid());
    assert_eq!(
        saved_data(&mut form)["skills"],
        Value::List(vec![
            Value::map([("name", Value::from("Zig")), ("level", Value::Int(1))]),
            Value::map([("name", Value::from("Rust")), ("level", Value::Int(1))]),
        ])
    );
}

#[test]
fn test_formset_edits_object_with_large_pk() {
    let schema = FormSchema::builder("T")
        .field("skills", FieldSpec::form_set(skill_schema()))
        .build()
        .unwrap();
    let object = Value::map([(
        "skills",
        Value::List(vec![Value::map([
            ("id", Value::Int(1500)),
            ("name", Value::from("Rust")),
        ])]),
    )]);

    let mut form = bind_with(schema, &[("skills[1500][name]", vec!["Zig"])], object);
    assert!(form.is_valid());
    assert_eq!(
        saved_data(&mut form)["skills"],
        Value::List(vec![Value::map([
            ("name", Value::from("Zig")),
            ("level", Value::Int(1)),
        ])])
    );
}

#[test]
fn test_formset_child_errors_use_bracket_names() {
    let schema = FormSchema::builder("T")
        .field("skills", FieldSpec::form_set(skill_schema()))
        .build()
        .unwrap();
    let mut form = bind(schema, &[("skills[0][level]", vec!["high"])]);
    assert!(!form.is_valid());
    let errors = form.errors();
    assert_eq!(errors["skills[0][name]"], messages::REQUIRED);
    assert_eq!(errors["skills[0][level]"], messages::INVALID);
    assert!(!errors.contains_key("skills"));
}

#[test]
fn test_round_trip_of_saved_value_tree() {
    let schema = FormSchema::builder("Person")
        .field("name", FieldSpec::scalar(Text::default()))
        .field("admin", FieldSpec::scalar(Boolean))
        .field("born", FieldSpec::scalar(Date))
        .field("score", FieldSpec::scalar(Float::default()))
        .field("tags", FieldSpec::scalar(List::default()))
        .field("address", FieldSpec::form(address_schema()))
        .field("skills", FieldSpec::form_set(skill_schema()))
        .build()
        .unwrap();
    let mut form = bind(
        Arc::clone(&schema),
        &[
            ("name", vec!["Ada"]),
            ("admin", vec!["off"]),
            ("born", vec!["1815-12-10"]),
            ("score", vec!["9.5"]),
            ("tags[]", vec!["math", "engines"]),
            ("address[street]", vec!["St James's Square"]),
            ("address[city]", vec!["London"]),
            ("skills[0][name]", vec!["analysis"]),
            ("skills[0][level]", vec!["5"]),
        ],
    );
    let first = saved_data(&mut form);

    let flat = RequestTree::from_value(&first).flatten();
    let mut again = Form::new(schema);
    again.bind(Some(&flat), None).unwrap();
    assert!(again.is_valid(), "{:?}", again.errors());
    assert_eq!(saved_data(&mut again), first);
}

// ============================================================================
// 4. Message layering
// ============================================================================

fn required_message(form: &Form, field: &str) -> String {
    form.error_messages()[field].clone()
}

#[test]
fn test_meta_and_field_messages() {
    let schema = FormSchema::builder("T")
        .message("required", "meta")
        .field("name1", FieldSpec::scalar(Text::default()).message("required", "field"))
        .field("name2", FieldSpec::scalar(Text::default()))
        .build()
        .unwrap();
    let mut form = bind(schema, &[]);
    form.validate();
    assert_eq!(required_message(&form, "name1"), "field");
    assert_eq!(required_message(&form, "name2"), "meta");
}

#[test]
fn test_messages_inherited_by_nested_forms() {
    let child = FormSchema::builder("Child")
        .field("name", FieldSpec::scalar(Text::default()))
        .build()
        .unwrap();
    let schema = FormSchema::builder("Parent")
        .message("required", "parent")
        .field("ff", FieldSpec::form(Arc::clone(&child)))
        .field("myset", FieldSpec::form_set(child))
        .build()
        .unwrap();
    let mut form = bind(schema, &[("ff[name]", vec![""]), ("myset[0][name]", vec![""])]);
    form.validate();
    assert_eq!(required_message(&form, "ff[name]"), "parent");
    assert_eq!(required_message(&form, "myset[0][name]"), "parent");
}

#[test]
fn test_child_meta_beats_inherited_messages() {
    let child = FormSchema::builder("Child")
        .message("required", "child")
        .field("name", FieldSpec::scalar(Text::default()))
        .build()
        .unwrap();
    let schema = FormSchema::builder("Parent")
        .message("required", "parent")
        .field("ff", FieldSpec::form(Arc::clone(&child)))
        .field("myset", FieldSpec::form_set(child))
        .build()
        .unwrap();
    let mut form = bind(schema, &[("ff[name]", vec![""]), ("myset[0][name]", vec![""])]);
    form.validate();
    assert_eq!(required_message(&form, "ff[name]"), "child");
    assert_eq!(required_message(&form, "myset[0][name]"), "child");
}

#[test]
fn test_explicit_parent_messages_beat_child_meta() {
    let child = FormSchema::builder("Child")
        .message("required", "child")
        .field("name", FieldSpec::scalar(Text::default()))
        .build()
        .unwrap();
    let schema = FormSchema::builder("Parent")
        .field(
            "ff",
            FieldSpec::form(Arc::clone(&child)).message("required", "explicit"),
        )
        .field(
            "myset",
            FieldSpec::form_set(child).message("required", "explicit"),
        )
        .build()
        .unwrap();
    let mut form = bind(schema, &[("ff[name]", vec![""]), ("myset[0][name]", vec![""])]);
    form.validate();
    assert_eq!(required_message(&form, "ff[name]"), "explicit");
    assert_eq!(required_message(&form, "myset[0][name]"), "explicit");
}

// ============================================================================
// 5. Deletion and object reconciliation
// ============================================================================

#[derive(Debug, Default)]
struct Store {
    created: Mutex<Vec<IndexMap<String, Value>>>,
}

#[derive(Debug)]
struct Article {
    attrs: IndexMap<String, Value>,
    deleted: bool,
}

impl Model for Article {
    fn get_attr(&self, name: &str) -> Option<Value> {
        self.attrs.get(name).cloned()
    }

    fn set_attr(&mut self, name: &str, value: Value) -> FormResult<()> {
        self.attrs.insert(name.to_string(), value);
        Ok(())
    }

    fn delete_instance(&mut self) -> FormResult<()> {
        self.deleted = true;
        Ok(())
    }
}

#[derive(Debug)]
struct ArticleFactory(Arc<Store>);

impl ModelFactory for ArticleFactory {
    fn create(&self, data: IndexMap<String, Value>) -> FormResult<Box<dyn Model>> {
        if let Ok(mut created) = self.0.created.lock() {
            created.push(data.clone());
        }
        Ok(Box::new(Article {
            attrs: data,
            deleted: false,
        }))
    }
}

fn article_schema(store: &Arc<Store>, allow_delete: bool) -> Arc<FormSchema> {
    FormSchema::builder("Article")
        .field("title", FieldSpec::scalar(Text::default()))
        .field("views", FieldSpec::scalar(Integer::default()).default(0))
        .model(Arc::new(ArticleFactory(Arc::clone(store))))
        .allow_delete(allow_delete)
        .build()
        .unwrap()
}

#[test]
fn test_top_level_deletion_marker() {
    let schema = FormSchema::builder("T")
        .field("name", FieldSpec::scalar(Text::default()))
        .field("age", FieldSpec::scalar(Integer::default()))
        .build()
        .unwrap();
    let mut form = bind(schema, &[(DELETED, vec!["1"]), ("age", vec!["whatever"])]);
    assert!(form.validate());
    assert!(form.errors().is_empty());
    assert!(form.save().unwrap().is_deleted());
    assert_eq!(form.data(), Value::map([(DELETED, true)]));
}

#[test]
fn test_model_is_created_without_object() {
    let store = Arc::new(Store::default());
    let mut form = bind(article_schema(&store, false), &[("title", vec!["Hello"])]);
    match form.save().unwrap() {
        Saved::Created(object) => {
            assert_eq!(object.get("title"), Some(Value::from("Hello")));
            assert_eq!(object.get("views"), Some(Value::Int(0)));
        }
        other => panic!("expected a created object, got {other:?}"),
    }
    assert_eq!(store.created.lock().unwrap().len(), 1);
}

#[test]
fn test_model_object_is_updated() {
    let store = Arc::new(Store::default());
    let article: Box<dyn Model> = Box::new(Article {
        attrs: [
            ("title".to_string(), Value::from("Old")),
            ("views".to_string(), Value::Int(7)),
        ]
        .into_iter()
        .collect(),
        deleted: false,
    });
    let mut form = Form::new(article_schema(&store, false));
    form.bind(
        Some(&dict(&[("title", vec!["New"])])),
        Some(Object::Model(article)),
    )
    .unwrap();

    assert!(matches!(form.save().unwrap(), Saved::Updated(_)));
    let object = form.into_object().unwrap();
    assert_eq!(object.get("title"), Some(Value::from("New")));
    assert_eq!(object.get("views"), Some(Value::Int(7)));
    assert!(store.created.lock().unwrap().is_empty());
}

#[test]
fn test_deletion_of_model_object() {
    let store = Arc::new(Store::default());
    let article = || -> Box<dyn Model> {
        Box::new(Article {
            attrs: IndexMap::new(),
            deleted: false,
        })
    };

    let mut form = Form::new(article_schema(&store, true));
    form.bind(Some(&dict(&[(DELETED, vec![""])])), Some(Object::Model(article())))
        .unwrap();
    assert!(form.save().unwrap().is_deleted());
    let debug = format!("{:?}", form.object().and_then(Object::as_model).unwrap());
    assert!(debug.contains("deleted: true"));

    let mut form = Form::new(article_schema(&store, false));
    form.bind(Some(&dict(&[(DELETED, vec![""])])), Some(Object::Model(article())))
        .unwrap();
    assert!(form.save().unwrap().is_deleted());
    let debug = format!("{:?}", form.object().and_then(Object::as_model).unwrap());
    assert!(debug.contains("deleted: false"));
}
