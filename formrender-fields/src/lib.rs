//! Reactive field-dependency engine for declarative forms
//!
//! `formrender-fields` turns a form [`Schema`] into a live, path-addressed
//! tree of field models, tracks which fields depend on which (visibility,
//! static data and remote data bindings), and propagates value changes
//! through that graph. It has no UI of its own: a rendering layer talks to
//! it through [`FieldContext`], host code through [`FieldRef`].
//!
//! # Architecture
//!
//! - **Path-addressed**: every field lives at a [`Path`]; one model per path
//! - **Explicit observation**: models hold [`Observable`] cells, writes notify
//! - **Graph-driven**: [`DataRelation`] maps source fields to their dependents
//! - **Fail-soft boundaries**: hook and async binding failures are logged, never raised
//!
//! # Example
//!
//! ```no_run
//! use formrender_fields::{Binding, Field, Fields, Operator, Schema, VisibleRule};
//! use serde_json::json;
//!
//! let schema = Schema::new(vec![
//!     Field::new("kind", "select").with_default(json!("basic")),
//!     Field::new("detail", "input").with_binding(Binding::visible(VisibleRule::new(
//!         "kind",
//!         Operator::Eq,
//!         json!("pro"),
//!     ))),
//! ]);
//! let fields = Fields::new(schema)?;
//! fields.set_value(&["kind"], json!("pro"));
//! # Ok::<(), formrender_fields::FieldsError>(())
//! ```

pub mod context;
pub mod error;
pub mod fetch;
pub mod fields;
pub mod lifecycle;
pub mod model;
pub mod observable;
pub mod path;
pub mod relation;
pub mod template;
pub mod types;
pub mod validator;

pub use context::{FieldContext, FieldRef};
pub use error::{FieldsError, Result};
pub use fetch::{fetcher_for, DisabledFetcher, FetchRequest, Fetcher, HttpFetcher};
pub use fields::{FieldItem, Fields, FieldsBuilder, RenderUpdate, RerenderFn};
pub use lifecycle::{HookEvent, HookFn, HookName, Hooks, Lifecycle};
pub use model::FieldModel;
pub use observable::{Observable, Subscription};
pub use path::{Path, PathRegistry, SEPARATOR};
pub use relation::{
    evaluate_visibility, BindingEffect, DataRelation, FieldDependency, PlannedUpdate, ValueLookup,
};
pub use types::{
    AsyncBinding, Binding, ConditionFn, Context, Control, Field, HttpMethod, ModelDef, Operator,
    ParamFn, ParamValue, Pattern, Rule, Schema, SelectOption, TransformFn, ValidatorFn,
    ValidatorOutcome, VisibleRule,
};
pub use validator::{ValidationReport, ValidationResult, Validator};
