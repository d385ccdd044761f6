//! In-memory capabilities for testing controllers without a server

use crate::backend::{Backend, WireLink, WirePage};
use crate::capabilities::{Confirm, ConfirmPrompt, Notifier};
use crate::error::ApiResult;
use async_trait::async_trait;
use chrono::NaiveDate;
use repodesk_core::{BookingSlot, ListQuery};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

type ListHandler = Box<dyn Fn(&str, &ListQuery) -> ApiResult<WirePage> + Send + Sync>;
type SlotsHandler = Box<dyn Fn(NaiveDate) -> ApiResult<Vec<BookingSlot>> + Send + Sync>;
type DeleteHandler = Box<dyn Fn(&str) -> ApiResult<()> + Send + Sync>;
type BodyHandler = Box<dyn Fn(&str, &Value) -> ApiResult<Value> + Send + Sync>;
type DelayFn = Box<dyn Fn(&ListQuery) -> Duration + Send + Sync>;

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A request seen by [`MockBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// List read
    FetchPage {
        /// Endpoint path
        path: String,
        /// Query sent
        query: ListQuery,
    },
    /// Slot read
    FetchSlots {
        /// Requested date
        date: NaiveDate,
    },
    /// Delete
    Delete {
        /// Endpoint path
        path: String,
    },
    /// Create
    Create {
        /// Endpoint path
        path: String,
        /// Body sent
        body: Value,
    },
    /// Update
    Update {
        /// Endpoint path
        path: String,
        /// Body sent
        body: Value,
    },
}

/// Backend answering from closures and recording every call
pub struct MockBackend {
    list: ListHandler,
    slots: SlotsHandler,
    delete: DeleteHandler,
    create: BodyHandler,
    update: BodyHandler,
    list_delay: Option<DelayFn>,
    calls: Mutex<Vec<Call>>,
}

impl fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockBackend")
            .field("calls", &locked(&self.calls).len())
            .finish_non_exhaustive()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Backend that returns one empty page, no slots, and accepts every mutation
    pub fn new() -> Self {
        Self {
            list: Box::new(|_, _| Ok(wire_page(Vec::new(), 1, 1))),
            slots: Box::new(|_| Ok(Vec::new())),
            delete: Box::new(|_| Ok(())),
            create: Box::new(|_, _| Ok(Value::Null)),
            update: Box::new(|_, _| Ok(Value::Null)),
            list_delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer list reads with `handler`
    #[must_use]
    pub fn on_list(
        mut self,
        handler: impl Fn(&str, &ListQuery) -> ApiResult<WirePage> + Send + Sync + 'static,
    ) -> Self {
        self.list = Box::new(handler);
        self
    }

    /// Delay each list read by the duration `delay` picks for its query
    #[must_use]
    pub fn with_list_delay(
        mut self,
        delay: impl Fn(&ListQuery) -> Duration + Send + Sync + 'static,
    ) -> Self {
        self.list_delay = Some(Box::new(delay));
        self
    }

    /// Answer slot reads with `handler`
    #[must_use]
    pub fn on_slots(
        mut self,
        handler: impl Fn(NaiveDate) -> ApiResult<Vec<BookingSlot>> + Send + Sync + 'static,
    ) -> Self {
        self.slots = Box::new(handler);
        self
    }

    /// Answer deletes with `handler`
    #[must_use]
    pub fn on_delete(
        mut self,
        handler: impl Fn(&str) -> ApiResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.delete = Box::new(handler);
        self
    }

    /// Answer creates with `handler`
    #[must_use]
    pub fn on_create(
        mut self,
        handler: impl Fn(&str, &Value) -> ApiResult<Value> + Send + Sync + 'static,
    ) -> Self {
        self.create = Box::new(handler);
        self
    }

    /// Answer updates with `handler`
    #[must_use]
    pub fn on_update(
        mut self,
        handler: impl Fn(&str, &Value) -> ApiResult<Value> + Send + Sync + 'static,
    ) -> Self {
        self.update = Box::new(handler);
        self
    }

    fn record(&self, call: Call) {
        locked(&self.calls).push(call);
    }

    /// Every call so far, oldest first
    pub fn calls(&self) -> Vec<Call> {
        locked(&self.calls).clone()
    }

    /// Queries of every list read so far
    pub fn list_calls(&self) -> Vec<ListQuery> {
        locked(&self.calls)
            .iter()
            .filter_map(|call| match call {
                Call::FetchPage { query, .. } => Some(query.clone()),
                _ => None,
            })
            .collect()
    }

    /// Paths of every delete so far
    pub fn deleted_paths(&self) -> Vec<String> {
        locked(&self.calls)
            .iter()
            .filter_map(|call| match call {
                Call::Delete { path } => Some(path.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn fetch_page(&self, path: &str, query: &ListQuery) -> ApiResult<WirePage> {
        self.record(Call::FetchPage {
            path: path.to_string(),
            query: query.clone(),
        });
        if let Some(delay) = &self.list_delay {
            tokio::time::sleep(delay(query)).await;
        }
        (self.list)(path, query)
    }

    async fn fetch_slots(&self, date: NaiveDate) -> ApiResult<Vec<BookingSlot>> {
        self.record(Call::FetchSlots { date });
        (self.slots)(date)
    }

    async fn delete(&self, path: &str) -> ApiResult<()> {
        self.record(Call::Delete {
            path: path.to_string(),
        });
        (self.delete)(path)
    }

    async fn create(&self, path: &str, body: &Value) -> ApiResult<Value> {
        self.record(Call::Create {
            path: path.to_string(),
            body: body.clone(),
        });
        (self.create)(path, body)
    }

    async fn update(&self, path: &str, body: &Value) -> ApiResult<Value> {
        self.record(Call::Update {
            path: path.to_string(),
            body: body.clone(),
        });
        (self.update)(path, body)
    }
}

/// Page in backend shape with one numbered link per page
pub fn wire_page(items: Vec<Value>, current_page: u32, last_page: u32) -> WirePage {
    let links = (1..=last_page)
        .map(|page| WireLink {
            url: Some(format!("http://api.test/fetch?page={page}")),
            label: page.to_string(),
            active: page == current_page,
        })
        .collect();

    WirePage {
        data: Some(items),
        current_page: Some(current_page),
        last_page: Some(last_page),
        links,
    }
}

/// A notification captured by [`RecordingNotifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// `success(..)`
    Success(String),
    /// `error(..)`
    Error(String),
}

/// Notifier that keeps every message
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    /// Everything notified so far, oldest first
    pub fn notices(&self) -> Vec<Notice> {
        locked(&self.notices).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        locked(&self.notices).push(Notice::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        locked(&self.notices).push(Notice::Error(message.to_string()));
    }
}

/// Confirmation that always gives the same answer
#[derive(Debug)]
pub struct FixedConfirm {
    answer: bool,
    asked: AtomicUsize,
}

impl FixedConfirm {
    /// Always answer `answer`
    pub const fn new(answer: bool) -> Self {
        Self {
            answer,
            asked: AtomicUsize::new(0),
        }
    }

    /// How many prompts were shown
    pub fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Confirm for FixedConfirm {
    async fn confirm(&self, _prompt: &ConfirmPrompt) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}
