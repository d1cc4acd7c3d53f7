//! The surfaces the rendering layer and host application talk to.
//!
//! A [`FieldContext`] is handed to the renderer of one field. [`FieldRef`] is
//! the form-wide handle exposed to host code.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::fields::{FieldItem, Fields, RenderUpdate};
use crate::model::FieldModel;
use crate::path::Path;
use crate::types::Field;
use crate::validator::ValidationResult;

/// Capabilities of a single field.
#[derive(Clone)]
pub struct FieldContext {
    fields: Fields,
    item: Rc<FieldItem>,
    model: Rc<FieldModel>,
}

impl fmt::Debug for FieldContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldContext")
            .field("path", self.item.path())
            .field("mounted", &self.model.is_mounted())
            .finish()
    }
}

impl FieldContext {
    pub(crate) fn new(fields: Fields, item: Rc<FieldItem>, model: Rc<FieldModel>) -> Self {
        Self {
            fields,
            item,
            model,
        }
    }

    /// Path of the bound field.
    pub fn path(&self) -> &Path {
        self.item.path()
    }

    /// Definition of the bound field.
    pub fn field(&self) -> &Field {
        self.item.field()
    }

    /// Current value, default included.
    pub fn value(&self) -> Option<Value> {
        self.model.current()
    }

    /// Write a new value. Returns whether it changed anything.
    pub fn on_change(&self, value: Value) -> bool {
        self.model.value_cell().set(Some(value))
    }

    /// Current visible flag.
    pub fn visible(&self) -> bool {
        self.model.is_visible()
    }

    /// Last data a binding forwarded to this field.
    pub fn data(&self) -> Option<Value> {
        self.item.data()
    }

    /// Check `value` against this field's rules.
    pub async fn validate(&self, value: &Value) -> ValidationResult {
        let rules = self.item.field().rules();
        let context = self.fields.validation_context();
        self.fields
            .validator()
            .validate(Some(value), &rules, &context)
            .await
    }

    /// Record the re-render callback and mark the field mounted. Only
    /// mounted fields appear in [`Fields::get_values`].
    pub fn register(&self, rerender: impl Fn(&RenderUpdate) + 'static) {
        self.item.set_rerender(Rc::new(rerender));
        self.model.set_mounted(true);
    }
}

/// Form-wide value access for host code.
pub trait FieldRef {
    fn get_value(&self, segments: &[String]) -> Option<Value>;
    fn get_values(&self) -> Value;
    fn set_value(&self, segments: &[String], value: Value) -> bool;
    fn set_values(&self, values: &Value);
    fn reset_values(&self);
}

impl FieldRef for Fields {
    fn get_value(&self, segments: &[String]) -> Option<Value> {
        Fields::get_value(self, segments)
    }

    fn get_values(&self) -> Value {
        Fields::get_values(self)
    }

    fn set_value(&self, segments: &[String], value: Value) -> bool {
        Fields::set_value(self, segments, value)
    }

    fn set_values(&self, values: &Value) {
        Fields::set_values(self, values)
    }

    fn reset_values(&self) {
        Fields::reset_values(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::DisabledFetcher;
    use crate::types::{Rule, Schema};
    use serde_json::json;
    use std::cell::RefCell;
    use std::sync::Arc;

    fn form() -> Fields {
        Fields::builder(Schema::new(vec![
            Field::new("name", "input").with_rule(Rule::required()),
            Field::new("age", "number").with_default(json!(30)),
        ]))
        .fetcher(Arc::new(DisabledFetcher))
        .build()
        .unwrap()
    }

    #[test]
    fn on_change_writes_through_and_rerenders() {
        let fields = form();
        let path = fields.resolve(&["name"]).unwrap();
        let ctx = fields.get_field_context(&path).unwrap();
        let updates = Rc::new(RefCell::new(Vec::new()));
        let log = updates.clone();
        ctx.register(move |update| log.borrow_mut().push(update.clone()));

        assert!(ctx.on_change(json!("Ada")));
        assert!(!ctx.on_change(json!("Ada")));
        assert_eq!(ctx.value(), Some(json!("Ada")));
        assert_eq!(fields.get_value(&["name"]), Some(json!("Ada")));
        assert_eq!(*updates.borrow(), vec![RenderUpdate::Changed]);
    }

    #[tokio::test]
    async fn validate_uses_field_rules() {
        let fields = form();
        let ctx = fields
            .get_field_context(&fields.resolve(&["name"]).unwrap())
            .unwrap();
        assert!(!ctx.validate(&json!("")).await.is_valid);
        assert!(ctx.validate(&json!("Ada")).await.is_valid);
    }

    #[test]
    fn field_ref_is_object_safe() {
        let fields = form();
        let age = fields.resolve(&["age"]).unwrap();
        fields.get_field_context(&age).unwrap().register(|_| {});

        let handle: &dyn FieldRef = &fields;
        assert!(handle.set_value(&["age".to_string()], json!(31)));
        assert_eq!(handle.get_values(), json!({"age": 31}));
        handle.reset_values();
        assert_eq!(handle.get_value(&["age".to_string()]), Some(json!(30)));
    }
}
