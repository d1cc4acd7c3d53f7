//! Lifecycle hook dispatch.
//!
//! Hooks are optional user callbacks fired at fixed points of a form
//! session. A hook that returns an error or panics must never break the
//! form: [`Lifecycle::execute`] logs the failure and carries on, while
//! [`Lifecycle::try_execute`] surfaces it as a [`FieldsError`].

use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use serde_json::Value;
use tracing::{trace, warn};

use crate::error::{FieldsError, Result};
use crate::path::Path;
use crate::types::Context;

/// Points in a form session where hooks fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookName {
    /// After the field tree is built.
    Init,
    /// After the form is mounted.
    Mounted,
    /// After any field value changes.
    Update,
    /// Before the form is torn down.
    Unmounted,
    /// After values are reset to their defaults.
    Reset,
}

impl HookName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "onInit",
            Self::Mounted => "onMounted",
            Self::Update => "onUpdate",
            Self::Unmounted => "onUnmounted",
            Self::Reset => "onReset",
        }
    }
}

impl fmt::Display for HookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments handed to a hook.
#[derive(Debug, Clone, Copy)]
pub enum HookEvent<'a> {
    Init { context: &'a Context },
    Mounted { values: &'a Value },
    Update { path: &'a Path, value: Option<&'a Value> },
    Unmounted,
    Reset { values: &'a Value },
}

impl HookEvent<'_> {
    pub fn name(&self) -> HookName {
        match self {
            Self::Init { .. } => HookName::Init,
            Self::Mounted { .. } => HookName::Mounted,
            Self::Update { .. } => HookName::Update,
            Self::Unmounted => HookName::Unmounted,
            Self::Reset { .. } => HookName::Reset,
        }
    }
}

/// A hook callback. `Err` carries a message that is logged and dropped.
pub type HookFn = Rc<dyn Fn(&HookEvent<'_>) -> std::result::Result<(), String>>;

/// Set of hooks keyed by name.
#[derive(Clone, Default)]
pub struct Hooks {
    hooks: HashMap<HookName, HookFn>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.hooks.keys()).finish()
    }
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `hook` under `name`, replacing any previous one.
    pub fn on(
        mut self,
        name: HookName,
        hook: impl Fn(&HookEvent<'_>) -> std::result::Result<(), String> + 'static,
    ) -> Self {
        self.hooks.insert(name, Rc::new(hook));
        self
    }

    pub fn get(&self, name: HookName) -> Option<&HookFn> {
        self.hooks.get(&name)
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

/// Dispatcher over a [`Hooks`] set.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    hooks: Hooks,
}

impl Lifecycle {
    pub fn new(hooks: Hooks) -> Self {
        Self { hooks }
    }

    /// Run the hook for `event`, reporting failures. Absent hooks succeed.
    pub fn try_execute(&self, event: &HookEvent<'_>) -> Result<()> {
        let name = event.name();
        let Some(hook) = self.hooks.get(name) else {
            return Ok(());
        };
        trace!(hook = %name, "running lifecycle hook");
        match catch_unwind(AssertUnwindSafe(|| hook(event))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(message)) => Err(FieldsError::HookFailed {
                hook: name.to_string(),
                message,
            }),
            Err(_) => Err(FieldsError::HookPanicked {
                hook: name.to_string(),
            }),
        }
    }

    /// Run the hook for `event`; failures are logged and swallowed.
    pub fn execute(&self, event: &HookEvent<'_>) {
        if let Err(e) = self.try_execute(event) {
            warn!(hook = %event.name(), %e, "lifecycle hook failed");
        }
    }
}
