//! The form aggregate: field tree, models, dependency graph and the
//! propagation loop tying them together.
//!
//! `Fields` is single-threaded. It is a cheap handle over shared state, and
//! model subscriptions reach back into that state through a weak reference,
//! so dropping the last handle tears everything down.
//!
//! A value write flows like this: the model's observable cell notifies its
//! subscriber, which asks the [`DataRelation`] for the dependents of the
//! changed path, applies the resulting effects (visibility writes re-enter
//! the same loop), then requests a re-render of the changed field and fires
//! the `Update` hook.
//!
//! Async bindings start the moment they fire when the form was built with a
//! [`LocalSet`](tokio::task::LocalSet); their responses are applied as they
//! arrive. Without one they wait, one per effect field, for
//! [`Fields::settle`].

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;

use formrender_config::EngineConfig;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tokio::task::{JoinHandle, LocalSet};
use tracing::{debug, trace, warn};

use crate::context::FieldContext;
use crate::error::{FieldsError, Result};
use crate::fetch::{fetcher_for, FetchRequest, Fetcher};
use crate::lifecycle::{HookEvent, Hooks, Lifecycle};
use crate::model::FieldModel;
use crate::path::{Path, PathRegistry};
use crate::relation::{BindingEffect, DataRelation, PlannedUpdate, ValueLookup};
use crate::types::{Context, Field, Rule, Schema, TransformFn};
use crate::validator::{ValidationReport, Validator};

/// What a re-render request carries to the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderUpdate {
    /// The field's own value or visibility changed.
    Changed,
    /// A binding produced new data for the field (options, list entries).
    Data(Value),
}

/// Re-render callback registered by the rendering layer.
pub type RerenderFn = Rc<dyn Fn(&RenderUpdate)>;

/// One node of the live field tree.
pub struct FieldItem {
    path: Path,
    field: Arc<Field>,
    rerender: RefCell<Option<RerenderFn>>,
    data: RefCell<Option<Value>>,
    children: Vec<Rc<FieldItem>>,
}

impl fmt::Debug for FieldItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldItem")
            .field("path", &self.path)
            .field("registered", &self.rerender.borrow().is_some())
            .field("children", &self.children.len())
            .finish()
    }
}

impl FieldItem {
    fn new(path: Path, field: Arc<Field>, children: Vec<Rc<FieldItem>>) -> Self {
        Self {
            path,
            field,
            rerender: RefCell::new(None),
            data: RefCell::new(None),
            children,
        }
    }

    /// Path of this item.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Definition this item was built from.
    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Child items, in schema order.
    pub fn children(&self) -> &[Rc<FieldItem>] {
        &self.children
    }

    /// Last data forwarded by a binding.
    pub fn data(&self) -> Option<Value> {
        self.data.borrow().clone()
    }

    pub(crate) fn set_rerender(&self, rerender: RerenderFn) {
        *self.rerender.borrow_mut() = Some(rerender);
    }

    /// Record forwarded data, then call the registered callback if any.
    pub fn request_render(&self, update: RenderUpdate) {
        if let RenderUpdate::Data(data) = &update {
            *self.data.borrow_mut() = Some(data.clone());
        }
        let callback = self.rerender.borrow().clone();
        match callback {
            Some(callback) => callback(&update),
            None => trace!(field = %self.path, "re-render requested before registration"),
        }
    }
}

/// A fired async binding that has not been sent yet.
struct QueuedBinding {
    effect: Path,
    request: FetchRequest,
    transform: Option<TransformFn>,
}

/// Outcome of one async binding.
struct BindingResolution {
    effect: Path,
    outcome: Result<Value>,
}

fn resolve_binding(
    fetcher: Arc<dyn Fetcher>,
    binding: QueuedBinding,
) -> impl Future<Output = BindingResolution> {
    let QueuedBinding {
        effect,
        request,
        transform,
    } = binding;
    async move {
        let field = effect.dotted();
        let outcome = fetcher.fetch(request).await.and_then(|body| match transform {
            Some(transform) => transform
                .call(body)
                .map_err(|message| FieldsError::Transform { field, message }),
            None => Ok(body),
        });
        BindingResolution { effect, outcome }
    }
}

struct FieldsInner {
    schema: Schema,
    config: EngineConfig,
    registry: RefCell<PathRegistry>,
    models: RefCell<IndexMap<String, Rc<FieldModel>>>,
    items: RefCell<IndexMap<String, Rc<FieldItem>>>,
    roots: RefCell<Vec<Rc<FieldItem>>>,
    relation: RefCell<DataRelation>,
    validator: Validator,
    lifecycle: Lifecycle,
    fetcher: Arc<dyn Fetcher>,
    local: Option<Rc<LocalSet>>,
    queued: RefCell<IndexMap<String, QueuedBinding>>,
    tasks: RefCell<Vec<JoinHandle<()>>>,
    depth: Cell<usize>,
}

/// Builder for [`Fields`].
pub struct FieldsBuilder {
    schema: Schema,
    hooks: Hooks,
    fetcher: Option<Arc<dyn Fetcher>>,
    config: EngineConfig,
    local: Option<Rc<LocalSet>>,
}

impl FieldsBuilder {
    /// Lifecycle hooks fired by the form.
    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Use this fetcher instead of the one selected by the configuration.
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Engine settings; also picks the default fetcher.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Start async bindings as tasks on `local` the moment they fire. Each
    /// response is applied when it arrives, as long as `local` is driven.
    pub fn local_set(mut self, local: Rc<LocalSet>) -> Self {
        self.local = Some(local);
        self
    }

    /// Build the field tree and fire the `Init` hook.
    pub fn build(self) -> Result<Fields> {
        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => fetcher_for(&self.config.http)?,
        };

        let fields = Fields {
            inner: Rc::new(FieldsInner {
                schema: self.schema,
                config: self.config,
                registry: RefCell::new(PathRegistry::new()),
                models: RefCell::new(IndexMap::new()),
                items: RefCell::new(IndexMap::new()),
                roots: RefCell::new(Vec::new()),
                relation: RefCell::new(DataRelation::new()),
                validator: Validator::new(),
                lifecycle: Lifecycle::new(self.hooks),
                fetcher,
                local: self.local,
                queued: RefCell::new(IndexMap::new()),
                tasks: RefCell::new(Vec::new()),
                depth: Cell::new(0),
            }),
        };

        let definitions = fields.inner.schema.fields.clone();
        fields.build::<&str>(&definitions, &[]);
        fields.inner.lifecycle.execute(&HookEvent::Init {
            context: &fields.inner.schema.context,
        });
        Ok(fields)
    }
}

/// Live form state for one schema.
#[derive(Clone)]
pub struct Fields {
    inner: Rc<FieldsInner>,
}

impl fmt::Debug for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fields")
            .field("models", &self.inner.models.borrow().len())
            .field("roots", &self.inner.roots.borrow().len())
            .field("pending", &self.pending_bindings())
            .finish()
    }
}

impl Fields {
    /// Start configuring a form for `schema`.
    pub fn builder(schema: Schema) -> FieldsBuilder {
        FieldsBuilder {
            schema,
            hooks: Hooks::default(),
            fetcher: None,
            config: EngineConfig::default(),
            local: None,
        }
    }

    /// Build with default hooks and configuration.
    pub fn new(schema: Schema) -> Result<Self> {
        Self::builder(schema).build()
    }

    /// Schema the form was built from.
    pub fn schema(&self) -> &Schema {
        &self.inner.schema
    }

    /// Settings the form runs with.
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Walk `definitions` depth-first under `parent_segments`, creating the
    /// path, model, dependency edges and item of every field not seen yet.
    /// Building the same definitions again changes nothing.
    pub fn build<S: AsRef<str>>(&self, definitions: &[Arc<Field>], parent_segments: &[S]) {
        let parent: Vec<String> = parent_segments
            .iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        let items = self.build_items(definitions, &parent);

        if parent.is_empty() {
            let mut roots = self.inner.roots.borrow_mut();
            for item in items {
                if !roots.iter().any(|root| Rc::ptr_eq(root, &item)) {
                    roots.push(item);
                }
            }
        }

        self.seed_visibility();
        debug!(fields = self.len(), "field tree built");
    }

    fn build_items(&self, definitions: &[Arc<Field>], parent: &[String]) -> Vec<Rc<FieldItem>> {
        definitions
            .iter()
            .map(|definition| self.build_item(definition, parent))
            .collect()
    }

    fn build_item(&self, definition: &Arc<Field>, parent: &[String]) -> Rc<FieldItem> {
        let mut segments = parent.to_vec();
        segments.push(definition.field_name.clone());
        let path = self.inner.registry.borrow_mut().register(&segments);

        let existing = self.inner.items.borrow().get(path.key()).cloned();
        if let Some(item) = existing {
            return item;
        }

        self.ensure_model(&path, definition);
        self.inner
            .relation
            .borrow_mut()
            .register_field_dependencies(&path, definition);

        let children = self.build_items(&definition.children, &segments);
        let item = Rc::new(FieldItem::new(path.clone(), Arc::clone(definition), children));
        self.inner
            .items
            .borrow_mut()
            .insert(path.key().to_string(), Rc::clone(&item));
        item
    }

    fn ensure_model(&self, path: &Path, definition: &Field) {
        if self.inner.models.borrow().contains_key(path.key()) {
            return;
        }

        let (value, default_value) = match &definition.model {
            Some(model) => (
                model.value.clone().or_else(|| model.default_value.clone()),
                model.default_value.clone(),
            ),
            None => (None, None),
        };
        let model = Rc::new(FieldModel::new(
            path.clone(),
            value,
            default_value,
            !definition.control.hidden,
        ));

        let weak = Rc::downgrade(&self.inner);
        let changed = path.clone();
        model.hold(model.value_cell().subscribe(move |value: &Option<Value>| {
            if let Some(inner) = weak.upgrade() {
                Fields { inner }.on_value_changed(&changed, value.as_ref());
            }
        }));

        let weak = Rc::downgrade(&self.inner);
        let changed = path.clone();
        model.hold(model.visible_cell().subscribe(move |_: &bool| {
            if let Some(inner) = weak.upgrade() {
                Fields { inner }.on_visibility_changed(&changed);
            }
        }));

        self.inner
            .models
            .borrow_mut()
            .insert(path.key().to_string(), model);
    }

    /// Evaluate visibility rules once every model exists.
    fn seed_visibility(&self) {
        let items: Vec<Rc<FieldItem>> = self.inner.items.borrow().values().cloned().collect();
        for item in items {
            let Some(rule) = item.field().binding().and_then(|b| b.visible.as_ref()) else {
                continue;
            };
            let visible = self
                .inner
                .relation
                .borrow()
                .initial_set_visible(Some(rule), self);
            if let Some(model) = self.model(item.path()) {
                model.visible_cell().set_silently(visible);
            }
        }
    }

    fn on_value_changed(&self, path: &Path, value: Option<&Value>) {
        if let Err(e) = self.propagate(path) {
            warn!(field = %path, %e, "dependency propagation stopped");
        }
        if let Some(item) = self.item(path) {
            item.request_render(RenderUpdate::Changed);
        }
        self.inner
            .lifecycle
            .execute(&HookEvent::Update { path, value });
    }

    fn on_visibility_changed(&self, path: &Path) {
        if let Err(e) = self.propagate(path) {
            warn!(field = %path, %e, "dependency propagation stopped");
        }
        if let Some(item) = self.item(path) {
            item.request_render(RenderUpdate::Changed);
        }
    }

    /// Apply the bindings of every dependent of `changed` in registration
    /// order, bounded by the configured propagation depth. Each binding is
    /// resolved at its turn, so it sees what earlier dependents cascaded.
    fn propagate(&self, changed: &Path) -> Result<()> {
        let depth = self.inner.depth.get();
        let max_depth = self.inner.config.propagation.max_depth;
        if depth >= max_depth {
            return Err(FieldsError::PropagationDepth {
                path: changed.dotted(),
                max_depth,
            });
        }

        let dependents = self.inner.relation.borrow().dependents(changed.key()).to_vec();
        if dependents.is_empty() {
            return Ok(());
        }

        self.inner.depth.set(depth + 1);
        for dependent in &dependents {
            self.apply_update(dependent.resolve(self));
        }
        self.inner.depth.set(depth);
        Ok(())
    }

    fn apply_update(&self, update: PlannedUpdate) {
        let PlannedUpdate { effect, effects } = update;
        for binding_effect in effects {
            match binding_effect {
                BindingEffect::Visibility(visible) => {
                    if let Some(model) = self.model(&effect) {
                        model.visible_cell().set(visible);
                    }
                }
                BindingEffect::Data(data) => self.forward_data(&effect, data),
                BindingEffect::Fetch { request, transform } => {
                    self.queue_fetch(effect.clone(), request, transform)
                }
                BindingEffect::Rerender => {
                    if let Some(item) = self.item(&effect) {
                        item.request_render(RenderUpdate::Changed);
                    }
                }
            }
        }
    }

    fn forward_data(&self, effect: &Path, data: Value) {
        match self.item(effect) {
            Some(item) => item.request_render(RenderUpdate::Data(data)),
            None => trace!(field = %effect, "dropping data for a field that no longer exists"),
        }
    }

    fn queue_fetch(&self, effect: Path, request: FetchRequest, transform: Option<TransformFn>) {
        let binding = QueuedBinding {
            effect,
            request,
            transform,
        };
        if let Some(local) = &self.inner.local {
            self.spawn_binding(local, binding);
            return;
        }

        debug!(field = %binding.effect, url = %binding.request.url, "queueing async binding");
        let key = binding.effect.key().to_string();
        let mut queued = self.inner.queued.borrow_mut();
        if queued.shift_remove(&key).is_some() {
            trace!(field = %binding.effect, "superseding unsent async binding");
        }
        queued.insert(key, binding);
    }

    fn spawn_binding(&self, local: &LocalSet, binding: QueuedBinding) {
        debug!(field = %binding.effect, url = %binding.request.url, "starting async binding");
        let resolution = resolve_binding(Arc::clone(&self.inner.fetcher), binding);
        let weak = Rc::downgrade(&self.inner);
        let task = local.spawn_local(async move {
            let resolution = resolution.await;
            match weak.upgrade() {
                Some(inner) => Fields { inner }.apply_resolution(resolution),
                None => trace!("form dropped before async binding resolved"),
            }
        });

        let mut tasks = self.inner.tasks.borrow_mut();
        tasks.retain(|task| !task.is_finished());
        tasks.push(task);
    }

    /// Drive async bindings to completion: send every queued binding and
    /// apply each response as it arrives, then wait for bindings already
    /// running on the attached `LocalSet` (call this from inside it).
    /// Bindings fired while applying are driven too.
    pub async fn settle(&self) {
        loop {
            let queued = std::mem::take(&mut *self.inner.queued.borrow_mut());
            let tasks = std::mem::take(&mut *self.inner.tasks.borrow_mut());
            if queued.is_empty() && tasks.is_empty() {
                break;
            }

            let mut resolutions: FuturesUnordered<_> = queued
                .into_values()
                .map(|binding| resolve_binding(Arc::clone(&self.inner.fetcher), binding))
                .collect();
            while let Some(resolution) = resolutions.next().await {
                self.apply_resolution(resolution);
            }

            for task in tasks {
                if let Err(e) = task.await {
                    if !e.is_cancelled() {
                        warn!(%e, "async binding task failed");
                    }
                }
            }
        }
    }

    fn apply_resolution(&self, resolution: BindingResolution) {
        let BindingResolution { effect, outcome } = resolution;
        match outcome {
            Ok(data) => {
                debug!(field = %effect, "async binding resolved");
                self.forward_data(&effect, data);
            }
            Err(e) => warn!(field = %effect, %e, "async binding failed"),
        }
    }

    /// Async bindings fired but not yet applied: queued ones plus running
    /// tasks.
    pub fn pending_bindings(&self) -> usize {
        let running = self
            .inner
            .tasks
            .borrow()
            .iter()
            .filter(|task| !task.is_finished())
            .count();
        self.inner.queued.borrow().len() + running
    }

    /// Current value at `segments`, falling back to the default.
    pub fn get_value<S: AsRef<str>>(&self, segments: &[S]) -> Option<Value> {
        let model = self.model_by_key(&Path::parse(segments))?;
        model.current()
    }

    /// Nested object of every mounted field that has a value.
    pub fn get_values(&self) -> Value {
        let models: Vec<Rc<FieldModel>> = self.inner.models.borrow().values().cloned().collect();
        let mut values = Map::new();
        for model in models {
            if !model.is_mounted() {
                continue;
            }
            if let Some(value) = model.current() {
                insert_at_path(&mut values, model.path().segments(), value);
            }
        }
        Value::Object(values)
    }

    /// Write one field. Returns `false` when the field does not exist or the
    /// value is unchanged.
    pub fn set_value<S: AsRef<str>>(&self, segments: &[S], value: Value) -> bool {
        let key = Path::parse(segments);
        match self.model_by_key(&key) {
            Some(model) => model.value_cell().set(Some(value)),
            None => {
                trace!(key = %key, "set_value on unknown field");
                false
            }
        }
    }

    /// Write every leaf of a nested object, in traversal order. Arrays are
    /// leaves. Each write propagates on its own.
    pub fn set_values(&self, values: &Value) {
        let mut leaves = Vec::new();
        collect_leaves(values, &mut Vec::new(), &mut leaves);
        for (segments, value) in leaves {
            self.set_value(&segments, value);
        }
    }

    /// Restore every value to its default without propagating, then ask each
    /// changed field to re-render.
    pub fn reset_values(&self) {
        let models: Vec<Rc<FieldModel>> = self.inner.models.borrow().values().cloned().collect();
        let changed: Vec<Path> = models
            .iter()
            .filter(|model| {
                model
                    .value_cell()
                    .set_silently(model.default_value().cloned())
            })
            .map(|model| model.path().clone())
            .collect();

        for path in &changed {
            if let Some(item) = self.item(path) {
                item.request_render(RenderUpdate::Changed);
            }
        }
        debug!(changed = changed.len(), "values reset to defaults");

        let values = self.get_values();
        self.inner
            .lifecycle
            .execute(&HookEvent::Reset { values: &values });
    }

    /// Capability object handed to the renderer of one field.
    pub fn get_field_context(&self, path: &Path) -> Option<FieldContext> {
        let item = self.item(path)?;
        let model = self.model(path)?;
        Some(FieldContext::new(self.clone(), item, model))
    }

    /// Fire the `Mounted` hook.
    pub fn mount(&self) {
        let values = self.get_values();
        self.inner
            .lifecycle
            .execute(&HookEvent::Mounted { values: &values });
    }

    /// Fire the `Unmounted` hook, then [`Fields::clear`].
    pub fn unmount(&self) {
        self.inner.lifecycle.execute(&HookEvent::Unmounted);
        self.clear();
    }

    /// Forget every edge, model, item, root, path and queued binding.
    pub fn clear(&self) {
        self.inner.relation.borrow_mut().clear_all_dependencies();
        let models = std::mem::take(&mut *self.inner.models.borrow_mut());
        for model in models.values() {
            model.release();
        }
        self.inner.items.borrow_mut().clear();
        self.inner.roots.borrow_mut().clear();
        self.inner.registry.borrow_mut().clear();
        let mut dropped = std::mem::take(&mut *self.inner.queued.borrow_mut()).len();
        for task in std::mem::take(&mut *self.inner.tasks.borrow_mut()) {
            if !task.is_finished() {
                task.abort();
                dropped += 1;
            }
        }
        debug!(models = models.len(), dropped, "fields cleared");
    }

    /// Validate every mounted, visible field that has rules. Keys are dotted
    /// paths in build order.
    pub async fn validate_all(&self) -> ValidationReport {
        let items: Vec<Rc<FieldItem>> = self.inner.items.borrow().values().cloned().collect();
        let mut values = Map::new();
        let mut rules: IndexMap<String, Vec<Rule>> = IndexMap::new();
        for item in items {
            let field_rules = item.field().rules();
            if field_rules.is_empty() {
                continue;
            }
            let Some(model) = self.model(item.path()) else {
                continue;
            };
            if !model.is_mounted() || !model.is_visible() {
                continue;
            }
            let key = item.path().dotted();
            if let Some(value) = model.current() {
                values.insert(key.clone(), value);
            }
            rules.insert(key, field_rules);
        }

        let context = self.validation_context();
        self.inner
            .validator
            .validate_fields(&values, &rules, &context)
            .await
    }

    /// Schema context plus the current `values`.
    pub(crate) fn validation_context(&self) -> Context {
        let mut context = self.inner.schema.context.clone();
        context.insert("values".to_string(), self.get_values());
        context
    }

    pub(crate) fn validator(&self) -> Validator {
        self.inner.validator
    }

    /// Top-level items in schema order.
    pub fn roots(&self) -> Vec<Rc<FieldItem>> {
        self.inner.roots.borrow().clone()
    }

    /// Item at `path`, if it was built.
    pub fn item(&self, path: &Path) -> Option<Rc<FieldItem>> {
        self.inner.items.borrow().get(path.key()).cloned()
    }

    /// Every item in build order.
    pub fn items(&self) -> Vec<Rc<FieldItem>> {
        self.inner.items.borrow().values().cloned().collect()
    }

    /// Model at `path`.
    pub fn model(&self, path: &Path) -> Option<Rc<FieldModel>> {
        self.model_by_key(path.key())
    }

    fn model_by_key(&self, key: &str) -> Option<Rc<FieldModel>> {
        self.inner.models.borrow().get(key).cloned()
    }

    /// Registered path for `segments`, if the field exists.
    pub fn resolve<S: AsRef<str>>(&self, segments: &[S]) -> Option<Path> {
        self.inner.registry.borrow().resolve(segments)
    }

    /// Number of models, one per distinct path.
    pub fn len(&self) -> usize {
        self.inner.models.borrow().len()
    }

    /// Whether the form has no models.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distinct paths in the registry.
    pub fn path_count(&self) -> usize {
        self.inner.registry.borrow().len()
    }
}

impl ValueLookup for Fields {
    fn lookup(&self, segments: &[String]) -> Option<Value> {
        self.get_value(segments)
    }

    fn snapshot(&self) -> Value {
        self.get_values()
    }
}

fn collect_leaves(value: &Value, prefix: &mut Vec<String>, out: &mut Vec<(Vec<String>, Value)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                prefix.push(key.clone());
                collect_leaves(child, prefix, out);
                prefix.pop();
            }
        }
        leaf if !prefix.is_empty() => out.push((prefix.clone(), leaf.clone())),
        _ => {}
    }
}

fn insert_at_path(target: &mut Map<String, Value>, segments: &[String], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    let mut current = target;
    for segment in parents {
        let entry = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        match entry {
            Value::Object(map) => current = map,
            _ => return,
        }
    }
    current.insert(last.clone(), value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::DisabledFetcher;
    use crate::types::{Binding, Operator, VisibleRule};
    use serde_json::json;

    fn build(fields: Vec<Field>) -> Fields {
        Fields::builder(Schema::new(fields))
            .fetcher(Arc::new(DisabledFetcher))
            .build()
            .unwrap()
    }

    fn mount_all(fields: &Fields) {
        for item in fields.items() {
            let ctx = fields.get_field_context(item.path()).unwrap();
            ctx.register(|_| {});
        }
    }

    #[test]
    fn model_seeded_from_value_then_default() {
        let fields = build(vec![
            Field::new("a", "input").with_default(json!("d")),
            Field::new("b", "input")
                .with_default(json!("d"))
                .with_value(json!("v")),
            Field::new("c", "input"),
        ]);
        assert_eq!(fields.get_value(&["a"]), Some(json!("d")));
        assert_eq!(fields.get_value(&["b"]), Some(json!("v")));
        assert_eq!(fields.get_value(&["c"]), None);
        assert_eq!(fields.get_value(&["missing"]), None);
    }

    #[test]
    fn nested_fields_get_nested_paths() {
        let fields = build(vec![Field::new("address", "group")
            .with_child(Field::new("city", "input").with_default(json!("Berlin")))]);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.roots().len(), 1);
        assert_eq!(fields.roots()[0].children().len(), 1);
        assert_eq!(fields.get_value(&["address", "city"]), Some(json!("Berlin")));
        assert!(fields.resolve(&["address", "city"]).is_some());
    }

    #[test]
    fn get_values_only_contains_mounted_fields() {
        let fields = build(vec![
            Field::new("a", "input").with_default(json!(1)),
            Field::new("b", "input").with_default(json!(2)),
        ]);
        assert_eq!(fields.get_values(), json!({}));

        let a = fields.resolve(&["a"]).unwrap();
        fields.get_field_context(&a).unwrap().register(|_| {});
        fields.set_value(&["b"], json!(3));
        assert_eq!(fields.get_values(), json!({"a": 1}));
    }

    #[test]
    fn set_values_flattens_objects_but_not_arrays() {
        let fields = build(vec![
            Field::new("tags", "checkbox"),
            Field::new("address", "group").with_child(Field::new("city", "input")),
        ]);
        mount_all(&fields);
        fields.set_values(&json!({"tags": ["a", "b"], "address": {"city": "Paris"}, "unknown": 1}));
        assert_eq!(fields.get_value(&["tags"]), Some(json!(["a", "b"])));
        assert_eq!(
            fields.get_values(),
            json!({"tags": ["a", "b"], "address": {"city": "Paris"}})
        );
    }

    #[test]
    fn initial_visibility_uses_other_fields() {
        let fields = build(vec![
            Field::new("detail", "input").with_binding(Binding::visible(VisibleRule::new(
                "kind",
                Operator::Eq,
                json!("pro"),
            ))),
            Field::new("kind", "select").with_default(json!("basic")),
        ]);
        let detail = fields.resolve(&["detail"]).unwrap();
        assert!(!fields.model(&detail).unwrap().is_visible());

        fields.set_value(&["kind"], json!("pro"));
        assert!(fields.model(&detail).unwrap().is_visible());
    }

    #[test]
    fn clear_empties_everything() {
        let fields = build(vec![Field::new("a", "input")
            .with_binding(Binding::static_data(vec![json!("{{b}}")]))]);
        fields.clear();
        assert!(fields.is_empty());
        assert!(fields.roots().is_empty());
        assert_eq!(fields.path_count(), 0);
        assert!(fields.get_value(&["a"]).is_none());
    }

    #[test]
    fn insert_at_path_replaces_scalars_with_objects() {
        let mut map = Map::new();
        insert_at_path(&mut map, &["a".to_string()], json!(1));
        insert_at_path(&mut map, &["a".to_string(), "b".to_string()], json!(2));
        assert_eq!(Value::Object(map), json!({"a": {"b": 2}}));
    }
}
