mod common;

use formrender_config::{EngineConfig, PropagationConfig};
use formrender_fields::{
    Binding, DisabledFetcher, Field, Fields, Operator, RenderUpdate, Rule, Schema, VisibleRule,
};
use serde_json::json;
use std::sync::Arc;

use common::{data_updates, mount, mount_all, offline_form};

fn visible_when(source: &str, operator: Operator, value: serde_json::Value) -> Binding {
    Binding::visible(VisibleRule::new(source, operator, value))
}

#[test]
fn rebuilding_keeps_one_path_and_model_per_field() {
    let fields = offline_form(vec![
        Field::new("name", "input"),
        Field::new("address", "group")
            .with_child(Field::new("city", "input"))
            .with_child(Field::new("zip", "input")),
    ]);
    assert_eq!(fields.len(), 4);
    assert_eq!(fields.path_count(), 4);

    let city = fields.resolve(&["address", "city"]).unwrap();
    let model = fields.model(&city).unwrap();

    let definitions = fields.schema().fields.clone();
    fields.build::<&str>(&definitions, &[]);
    fields.build(&definitions[1].children, &["address"]);

    assert_eq!(fields.len(), 4);
    assert_eq!(fields.path_count(), 4);
    assert_eq!(fields.roots().len(), 2);
    assert!(std::rc::Rc::ptr_eq(&model, &fields.model(&city).unwrap()));
}

#[test]
fn set_values_after_get_values_changes_nothing() {
    let fields = offline_form(vec![
        Field::new("name", "input").with_default(json!("Ada")),
        Field::new("tags", "checkbox").with_default(json!(["a"])),
        Field::new("address", "group").with_child(Field::new("city", "input")),
        Field::new("secret", "input"),
    ]);
    mount(&fields, &["name"]);
    mount(&fields, &["tags"]);
    mount(&fields, &["address", "city"]);

    fields.set_values(&json!({"address": {"city": "Oslo"}}));
    fields.set_value(&["secret"], json!("hidden"));

    let before = fields.get_values();
    assert_eq!(
        before,
        json!({"name": "Ada", "tags": ["a"], "address": {"city": "Oslo"}})
    );
    fields.set_values(&before);
    assert_eq!(fields.get_values(), before);
    assert!(before.get("secret").is_none());
}

#[test]
fn visibility_follows_source_field() {
    let fields = offline_form(vec![
        Field::new("source", "number").with_default(json!(5)),
        Field::new("eq", "input").with_binding(visible_when("source", Operator::Eq, json!(5))),
        Field::new("ne", "input").with_binding(visible_when("source", Operator::Ne, json!(5))),
        Field::new("has_two", "input")
            .with_binding(visible_when("source", Operator::Includes, json!(2))),
    ]);
    let visible = |name: &str| {
        let path = fields.resolve(&[name]).unwrap();
        fields.model(&path).unwrap().is_visible()
    };

    assert!(visible("eq"));
    assert!(!visible("ne"));
    assert!(!visible("has_two"));

    fields.set_value(&["source"], json!([1, 2, 3]));
    assert!(!visible("eq"));
    assert!(visible("ne"));
    assert!(visible("has_two"));
}

#[test]
fn visibility_change_requests_rerender_of_effect() {
    let fields = offline_form(vec![
        Field::new("toggle", "switch").with_default(json!(false)),
        Field::new("panel", "group").with_binding(visible_when("toggle", Operator::Eq, json!(true))),
    ]);
    let panel = mount(&fields, &["panel"]);
    fields.set_value(&["toggle"], json!(true));
    assert_eq!(panel.borrow().len(), 1);
    fields.set_value(&["toggle"], json!(true));
    assert_eq!(panel.borrow().len(), 1);
}

#[test]
fn change_reaches_each_dependent_exactly_once() {
    let fields = offline_form(vec![
        Field::new("a", "input"),
        Field::new("b", "select").with_binding(Binding::static_data(vec![
            json!("{{a}}"),
            json!("fixed"),
        ])),
        Field::new("c", "input"),
    ]);
    let a = mount(&fields, &["a"]);
    let b = mount(&fields, &["b"]);
    let c = mount(&fields, &["c"]);

    assert!(fields.set_value(&["a"], json!("x")));

    assert_eq!(a.borrow().len(), 1);
    assert_eq!(data_updates(&b), vec![json!(["x", "fixed"])]);
    assert_eq!(b.borrow().len(), 1);
    assert!(c.borrow().is_empty());

    let b_path = fields.resolve(&["b"]).unwrap();
    let context = fields.get_field_context(&b_path).unwrap();
    assert_eq!(context.data(), Some(json!(["x", "fixed"])));
}

#[test]
fn unchanged_write_does_not_propagate() {
    let fields = offline_form(vec![
        Field::new("a", "input").with_default(json!(1)),
        Field::new("b", "select").with_binding(Binding::static_data(vec![json!("{{a}}")])),
    ]);
    let b = mount(&fields, &["b"]);
    fields.set_value(&["a"], json!(2));
    assert!(!fields.set_value(&["a"], json!(2)));
    assert_eq!(b.borrow().len(), 1);
}

#[test]
fn chains_propagate_through_visibility() {
    let fields = offline_form(vec![
        Field::new("a", "input").with_default(json!("off")),
        Field::new("b", "input").with_binding(visible_when("a", Operator::Eq, json!("on"))),
        Field::new("c", "select").with_binding(Binding::static_data(vec![json!("{{b}}")])),
    ]);
    let c = mount(&fields, &["c"]);
    fields.set_value(&["a"], json!("on"));
    assert_eq!(data_updates(&c), vec![json!([null])]);
}

#[test]
fn recursion_guard_stops_feedback_loops() {
    let config = EngineConfig {
        propagation: PropagationConfig { max_depth: 3 },
        ..EngineConfig::default()
    };
    let fields = Fields::builder(Schema::new(vec![
        Field::new("a", "number").with_default(json!(0)),
        Field::new("b", "select").with_binding(Binding::static_data(vec![json!("{{a}}")])),
    ]))
    .fetcher(Arc::new(DisabledFetcher))
    .config(config)
    .build()
    .unwrap();

    let handle = fields.clone();
    let b = fields.resolve(&["b"]).unwrap();
    fields.get_field_context(&b).unwrap().register(move |_| {
        let next = handle.get_value(&["a"]).and_then(|v| v.as_i64()).unwrap_or(0) + 1;
        handle.set_value(&["a"], json!(next));
    });

    fields.set_value(&["a"], json!(1));
    assert_eq!(fields.get_value(&["a"]), Some(json!(4)));
    assert_eq!(fields.item(&b).unwrap().data(), Some(json!([3])));
}

#[test]
fn later_dependents_see_values_written_by_earlier_ones() {
    let fields = offline_form(vec![
        Field::new("a", "input"),
        Field::new("b", "select").with_binding(Binding::static_data(vec![json!("{{a}}")])),
        Field::new("c", "select").with_binding(Binding::static_data(vec![
            json!("{{a}}"),
            json!("{{b}}"),
        ])),
    ]);

    let handle = fields.clone();
    let b = fields.resolve(&["b"]).unwrap();
    fields.get_field_context(&b).unwrap().register(move |update| {
        if let RenderUpdate::Data(data) = update {
            handle.set_value(&["b"], data[0].clone());
        }
    });
    mount(&fields, &["c"]);

    fields.set_value(&["a"], json!("x"));

    assert_eq!(fields.get_value(&["b"]), Some(json!("x")));
    let c = fields.resolve(&["c"]).unwrap();
    assert_eq!(fields.item(&c).unwrap().data(), Some(json!(["x", "x"])));
}

#[test]
fn declared_dependency_rerenders_without_binding() {
    let fields = offline_form(vec![
        Field::new("a", "input"),
        Field::new("summary", "text").depends_on("a"),
    ]);
    let summary = mount(&fields, &["summary"]);

    fields.set_value(&["a"], json!("x"));

    assert_eq!(*summary.borrow(), vec![RenderUpdate::Changed]);
}

#[test]
fn reset_restores_defaults_and_keeps_state() {
    let fields = offline_form(vec![
        Field::new("a", "input").with_default(json!("x")),
        Field::new("b", "input").with_binding(visible_when("a", Operator::Eq, json!("y"))),
        Field::new("c", "input"),
    ]);
    mount_all(&fields);
    let b = fields.resolve(&["b"]).unwrap();

    fields.set_value(&["a"], json!("y"));
    fields.set_value(&["c"], json!("typed"));
    assert!(fields.model(&b).unwrap().is_visible());

    fields.reset_values();
    assert_eq!(fields.get_values(), json!({"a": "x"}));
    assert!(fields.model(&b).unwrap().is_visible());
    assert!(fields.model(&b).unwrap().is_mounted());
    assert_eq!(fields.len(), 3);
}

#[tokio::test]
async fn validate_all_reports_mounted_visible_fields() {
    let fields = offline_form(vec![
        Field::new("name", "input").with_rule(Rule::required().with_message("name required")),
        Field::new("age", "number").with_rule(Rule::min(18.0)),
        Field::new("unmounted", "input").with_rule(Rule::required()),
        Field::new("extra", "input")
            .with_rule(Rule::required())
            .with_binding(visible_when("age", Operator::Gt, json!(60))),
    ]);
    mount(&fields, &["name"]);
    mount(&fields, &["age"]);
    mount(&fields, &["extra"]);
    fields.set_value(&["age"], json!(20));

    let report = fields.validate_all().await;
    assert_eq!(report.keys().collect::<Vec<_>>(), vec!["name", "age"]);
    assert_eq!(report["name"].error_message.as_deref(), Some("name required"));
    assert!(report["age"].is_valid);
}
