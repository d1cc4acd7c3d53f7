//! Shared helpers for form engine integration tests

#![allow(dead_code)] // Not every test file uses every helper

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use formrender_fields::{
    DisabledFetcher, FetchRequest, Fetcher, Field, Fields, FieldsError, RenderUpdate, Result,
    Schema,
};
use serde_json::Value;
use tokio::task::LocalSet;

/// Fetcher that answers every request with a fixed body and remembers what
/// it was asked.
#[derive(Default)]
pub struct RecordingFetcher {
    response: Value,
    fail_with_status: Option<u16>,
    delay_for: Option<(Value, Duration)>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl RecordingFetcher {
    pub fn responding(response: Value) -> Self {
        Self {
            response,
            ..Self::default()
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            fail_with_status: Some(status),
            ..Self::default()
        }
    }

    /// Echo the `v` param back, delaying requests whose `v` equals `slow`.
    pub fn echo_with_delay(slow: Value, delay: Duration) -> Self {
        Self {
            delay_for: Some((slow, delay)),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for RecordingFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<Value> {
        self.requests.lock().unwrap().push(request.clone());
        tokio::task::yield_now().await;

        if let Some(status) = self.fail_with_status {
            return Err(FieldsError::HttpStatus {
                url: request.url,
                status,
            });
        }

        if let Some((slow, delay)) = &self.delay_for {
            let echoed = request.params.get("v").cloned().unwrap_or(Value::Null);
            if &echoed == slow {
                tokio::time::sleep(*delay).await;
            }
            return Ok(echoed);
        }

        Ok(self.response.clone())
    }
}

/// Re-render requests seen by one field.
pub type RenderLog = Rc<RefCell<Vec<RenderUpdate>>>;

/// Build a form that never reaches the network.
pub fn offline_form(fields: Vec<Field>) -> Fields {
    form_with_fetcher(fields, Arc::new(DisabledFetcher))
}

pub fn form_with_fetcher(fields: Vec<Field>, fetcher: Arc<dyn Fetcher>) -> Fields {
    Fields::builder(Schema::new(fields))
        .fetcher(fetcher)
        .build()
        .unwrap()
}

/// Build a form whose async bindings run as tasks on `local`.
pub fn form_on_local_set(
    fields: Vec<Field>,
    fetcher: Arc<dyn Fetcher>,
    local: Rc<LocalSet>,
) -> Fields {
    Fields::builder(Schema::new(fields))
        .fetcher(fetcher)
        .local_set(local)
        .build()
        .unwrap()
}

/// Register a recording re-render callback on the field at `segments`,
/// which also mounts it.
pub fn mount(fields: &Fields, segments: &[&str]) -> RenderLog {
    let path = fields.resolve(segments).unwrap();
    let context = fields.get_field_context(&path).unwrap();
    let log: RenderLog = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    context.register(move |update| sink.borrow_mut().push(update.clone()));
    log
}

/// Mount every field, discarding re-render requests.
pub fn mount_all(fields: &Fields) {
    for item in fields.items() {
        fields
            .get_field_context(item.path())
            .unwrap()
            .register(|_| {});
    }
}

/// Only the data payloads in a render log.
pub fn data_updates(log: &RenderLog) -> Vec<Value> {
    log.borrow()
        .iter()
        .filter_map(|update| match update {
            RenderUpdate::Data(data) => Some(data.clone()),
            RenderUpdate::Changed => None,
        })
        .collect()
}
