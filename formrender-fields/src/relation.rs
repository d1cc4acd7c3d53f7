//! Cross-field dependency graph and binding resolution.
//!
//! Edges run from a source field to every field whose binding references
//! it. The graph itself never touches models: resolving a binding produces
//! [`BindingEffect`]s that the owner applies. Cycles between distinct fields
//! are allowed here; bounding them is the owner's job.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::trace;

use crate::fetch::FetchRequest;
use crate::path::{dotted_segments, Path};
use crate::template::{substitute_tokens, token_references, whole_token, whole_token_value};
use crate::types::{
    AsyncBinding, Binding, Field, Operator, ParamValue, TransformFn, VisibleRule,
};

/// Read access to current field values, as seen by binding resolution.
pub trait ValueLookup {
    /// Current value of the field at `segments`, default included.
    fn lookup(&self, segments: &[String]) -> Option<Value>;

    /// Nested object of all values, handed to computed params.
    fn snapshot(&self) -> Value;

    fn lookup_dotted(&self, dotted: &str) -> Option<Value> {
        self.lookup(&dotted_segments(dotted))
    }
}

/// Looks values up inside a nested JSON object.
impl ValueLookup for Value {
    fn lookup(&self, segments: &[String]) -> Option<Value> {
        let mut current = self;
        for segment in segments {
            current = current.get(segment)?;
        }
        Some(current.clone())
    }

    fn snapshot(&self) -> Value {
        self.clone()
    }
}

/// One registered effect: the field to update and what it is bound to.
#[derive(Debug, Clone)]
pub struct FieldDependency {
    pub effect: Path,
    /// Dotted source references extracted from the binding.
    pub dependencies: Vec<String>,
    pub binding: Binding,
}

impl FieldDependency {
    /// Resolve the effect's binding against current values. A dependency
    /// without anything to resolve still asks the effect to re-render.
    pub fn resolve(&self, lookup: &dyn ValueLookup) -> PlannedUpdate {
        trace!(effect = %self.effect, "re-resolving binding");
        let mut effects = DataRelation::resolve_binding(&self.binding, lookup);
        if effects.is_empty() {
            effects.push(BindingEffect::Rerender);
        }
        PlannedUpdate {
            effect: self.effect.clone(),
            effects,
        }
    }
}

/// What re-resolving a binding asks the owner to do.
#[derive(Debug, Clone)]
pub enum BindingEffect {
    /// Write the effect field's visible flag.
    Visibility(bool),
    /// Forward resolved data to the effect field.
    Data(Value),
    /// Issue a request, transform the body, then forward it.
    Fetch {
        request: FetchRequest,
        transform: Option<TransformFn>,
    },
    /// Nothing to resolve; the effect field should just re-render.
    Rerender,
}

/// Effects planned for one dependent field.
#[derive(Debug, Clone)]
pub struct PlannedUpdate {
    pub effect: Path,
    pub effects: Vec<BindingEffect>,
}

/// Source key → dependents, in registration order.
#[derive(Debug, Default)]
pub struct DataRelation {
    edges: IndexMap<String, Vec<FieldDependency>>,
}

impl DataRelation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an edge from every source the field depends on: references
    /// in its binding plus the field-level and model-level `dependencies`.
    /// A field is listed at most once per source, and never depends on itself.
    pub fn register_field_dependencies(&mut self, effect: &Path, field: &Field) {
        let dependencies = Self::field_dependencies(field);
        if dependencies.is_empty() {
            return;
        }
        let binding = field.binding().cloned().unwrap_or_default();

        for source in &dependencies {
            let source_key = Path::from_dotted(source).key().to_string();
            if source_key == effect.key() {
                trace!(field = %effect, "ignoring self reference in binding");
                continue;
            }
            let listeners = self.edges.entry(source_key).or_default();
            if listeners.iter().any(|dep| dep.effect.key() == effect.key()) {
                continue;
            }
            listeners.push(FieldDependency {
                effect: effect.clone(),
                dependencies: dependencies.clone(),
                binding: binding.clone(),
            });
        }
    }

    /// Every source of a field: binding references first, then
    /// `field.dependencies`, then `model.dependencies`. No duplicates.
    pub fn field_dependencies(field: &Field) -> Vec<String> {
        let mut dependencies = field
            .binding()
            .map(Self::extract_dependencies)
            .unwrap_or_default();
        let declared = field
            .dependencies
            .iter()
            .chain(field.model.iter().flat_map(|model| model.dependencies.iter()));
        for name in declared {
            let name = name.trim();
            if !name.is_empty() && !dependencies.iter().any(|d| d == name) {
                dependencies.push(name.to_string());
            }
        }
        dependencies
    }

    /// Dotted source references of a binding, first occurrence order, no
    /// duplicates.
    pub fn extract_dependencies(binding: &Binding) -> Vec<String> {
        let mut dependencies: Vec<String> = Vec::new();
        let mut push = |name: &str| {
            let name = name.trim();
            if !name.is_empty() && !dependencies.iter().any(|d| d == name) {
                dependencies.push(name.to_string());
            }
        };

        if let Some(entries) = &binding.static_ {
            for entry in entries {
                if let Some(name) = whole_token_value(entry) {
                    push(name);
                }
            }
        }

        if let Some(remote) = &binding.async_ {
            for name in token_references(&remote.url) {
                push(&name);
            }
            for param in remote.params.values() {
                if let ParamValue::Literal(value) = param {
                    if let Some(name) = whole_token_value(value) {
                        push(name);
                    }
                }
            }
            for name in &remote.dependencies {
                push(name);
            }
        }

        if let Some(visible) = &binding.visible {
            push(&visible.field);
        }

        dependencies
    }

    /// Dependents registered for a source key.
    pub fn dependents(&self, source_key: &str) -> &[FieldDependency] {
        self.edges
            .get(source_key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Re-resolve the binding of every field depending on `changed`, all
    /// against the same `lookup`. Callers that apply effects between edges
    /// should resolve each [`FieldDependency`] at its turn instead.
    pub fn trigger_dependency_updates(
        &self,
        changed: &Path,
        lookup: &dyn ValueLookup,
    ) -> Vec<PlannedUpdate> {
        self.dependents(changed.key())
            .iter()
            .map(|dep| dep.resolve(lookup))
            .collect()
    }

    /// Visibility is always evaluated when declared; data comes from the
    /// async source if there is one, otherwise from the static entries.
    pub fn resolve_binding(binding: &Binding, lookup: &dyn ValueLookup) -> Vec<BindingEffect> {
        let mut effects = Vec::new();
        if let Some(rule) = &binding.visible {
            effects.push(BindingEffect::Visibility(evaluate_visibility(
                rule,
                lookup.lookup_dotted(&rule.field).as_ref(),
            )));
        }
        if let Some(remote) = &binding.async_ {
            effects.push(BindingEffect::Fetch {
                request: resolve_request(remote, lookup),
                transform: remote.transform.clone(),
            });
        } else if let Some(entries) = &binding.static_ {
            effects.push(BindingEffect::Data(resolve_static(entries, lookup)));
        }
        effects
    }

    /// Visibility a field starts with. Fields without a rule are visible.
    pub fn initial_set_visible(
        &self,
        visible: Option<&VisibleRule>,
        lookup: &dyn ValueLookup,
    ) -> bool {
        match visible {
            Some(rule) => evaluate_visibility(rule, lookup.lookup_dotted(&rule.field).as_ref()),
            None => true,
        }
    }

    /// Drop every edge whose effect is the field at `effect_segments`.
    pub fn remove_field_dependencies<S: AsRef<str>>(&mut self, effect_segments: &[S]) {
        let key = Path::parse(effect_segments);
        self.edges.retain(|_, listeners| {
            listeners.retain(|dep| dep.effect.key() != key);
            !listeners.is_empty()
        });
    }

    pub fn clear_all_dependencies(&mut self) {
        self.edges.clear();
    }

    /// Number of source keys with at least one dependent.
    pub fn source_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Compare the source value against a visibility rule.
pub fn evaluate_visibility(rule: &VisibleRule, source: Option<&Value>) -> bool {
    let source = source.unwrap_or(&Value::Null);
    let expected = &rule.value;
    match rule.operator {
        Operator::Eq => loose_eq(source, expected),
        Operator::Ne => !loose_eq(source, expected),
        Operator::Gt => compare(source, expected).is_some_and(|o| o.is_gt()),
        Operator::Lt => compare(source, expected).is_some_and(|o| o.is_lt()),
        Operator::Ge => compare(source, expected).is_some_and(|o| o.is_ge()),
        Operator::Le => compare(source, expected).is_some_and(|o| o.is_le()),
        Operator::Includes => match source {
            Value::Array(items) => items.iter().any(|item| same_value(item, expected)),
            _ => false,
        },
        Operator::Excludes => match source {
            Value::Array(items) => !items.iter().any(|item| same_value(item, expected)),
            _ => false,
        },
    }
}

/// Equality that treats numbers by value and lets numeric strings and
/// booleans meet numbers.
fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => same_value(a, b),
        (Value::Number(_), Value::String(_) | Value::Bool(_))
        | (Value::String(_) | Value::Bool(_), Value::Number(_))
        | (Value::Bool(_), Value::String(_))
        | (Value::String(_), Value::Bool(_)) => match (to_number(a), to_number(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
        _ => a == b,
    }
}

fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => to_number(a)?.partial_cmp(&to_number(b)?),
    }
}

fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) if s.trim().is_empty() => Some(0.0),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn resolve_static(entries: &[Value], lookup: &dyn ValueLookup) -> Value {
    Value::Array(
        entries
            .iter()
            .map(|entry| match whole_token_value(entry) {
                Some(name) => lookup.lookup_dotted(name).unwrap_or(Value::Null),
                None => entry.clone(),
            })
            .collect(),
    )
}

fn resolve_request(remote: &AsyncBinding, lookup: &dyn ValueLookup) -> FetchRequest {
    let substitute = |text: &str| substitute_tokens(text, |name| lookup.lookup_dotted(name));

    let mut snapshot = None;
    let mut params = Map::new();
    for (name, param) in &remote.params {
        let value = match param {
            ParamValue::Computed(f) => {
                let values = snapshot.get_or_insert_with(|| lookup.snapshot());
                f.call(values)
            }
            ParamValue::Literal(Value::String(text)) => match whole_token(text) {
                Some(reference) => lookup.lookup_dotted(reference).unwrap_or(Value::Null),
                None if text.contains("{{") => Value::String(substitute(text)),
                None => Value::String(text.clone()),
            },
            ParamValue::Literal(other) => other.clone(),
        };
        params.insert(name.clone(), value);
    }

    FetchRequest {
        method: remote.effective_method(),
        url: substitute(&remote.url),
        params,
    }
}
