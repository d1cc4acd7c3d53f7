//! Per-field live state.

use std::cell::{Cell, RefCell};

use serde_json::Value;

use crate::observable::{Observable, Subscription};
use crate::path::Path;

/// Mutable state of one field. Exactly one exists per distinct [`Path`].
#[derive(Debug)]
pub struct FieldModel {
    path: Path,
    value: Observable<Option<Value>>,
    default_value: Option<Value>,
    mounted: Cell<bool>,
    visible: Observable<bool>,
    subscriptions: RefCell<Vec<Subscription>>,
}

impl FieldModel {
    /// Model holding `value`, starting visible or not.
    pub fn new(path: Path, value: Option<Value>, default_value: Option<Value>, visible: bool) -> Self {
        Self {
            path,
            value: Observable::new(value),
            default_value,
            mounted: Cell::new(false),
            visible: Observable::new(visible),
            subscriptions: RefCell::new(Vec::new()),
        }
    }

    /// Path this model is stored under.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The value, or the default when nothing was ever set.
    pub fn current(&self) -> Option<Value> {
        self.value.get().or_else(|| self.default_value.clone())
    }

    /// Schema default, restored by a reset.
    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    /// Observable current value.
    pub fn value_cell(&self) -> &Observable<Option<Value>> {
        &self.value
    }

    /// Observable visible flag.
    pub fn visible_cell(&self) -> &Observable<bool> {
        &self.visible
    }

    /// Current visible flag.
    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    /// Whether a component has registered for this field.
    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    /// Mark the field as mounted or unmounted.
    pub fn set_mounted(&self, mounted: bool) {
        self.mounted.set(mounted);
    }

    /// Keep a subscription alive for as long as the model.
    pub fn hold(&self, subscription: Subscription) {
        self.subscriptions.borrow_mut().push(subscription);
    }

    /// Drop every held subscription.
    pub fn release(&self) {
        self.subscriptions.borrow_mut().clear();
    }
}
