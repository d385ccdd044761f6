//! Shared fixtures for the controller integration tests

#![allow(dead_code, clippy::unwrap_used)]

use repodesk_admin::AdminContext;
use repodesk_admin::backend::WirePage;
use repodesk_admin::mock::{FixedConfirm, MockBackend, RecordingNotifier, wire_page};
use serde_json::{Value, json};
use std::sync::{Arc, Once};

static INIT_LOGGER: Once = Once::new();

/// Initialize test logging (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    });
}

/// Capabilities handed to a controller, plus handles to inspect them
pub struct Harness {
    pub ctx: AdminContext,
    pub backend: Arc<MockBackend>,
    pub notifier: Arc<RecordingNotifier>,
    pub confirm: Arc<FixedConfirm>,
}

impl Harness {
    /// Wire `backend` with a recording notifier and a confirmation answering `confirm`
    pub fn new(backend: MockBackend, confirm: bool) -> Self {
        init_test_logging();

        let backend = Arc::new(backend);
        let notifier = Arc::new(RecordingNotifier::default());
        let confirm = Arc::new(FixedConfirm::new(confirm));
        let ctx = AdminContext::new(backend.clone(), notifier.clone(), confirm.clone());

        Self {
            ctx,
            backend,
            notifier,
            confirm,
        }
    }
}

/// Organisation repository item as the backend sends it
pub fn repo(id: u64, name: &str) -> Value {
    json!({"id": id, "name": name, "visibility": "public", "language": "Rust"})
}

/// `per_page` repositories named `<filter>-<n>`, paginated over `total` records
pub fn repo_pages(filter: &str, page: u32, per_page: u32, total: u32) -> WirePage {
    let last_page = total.div_ceil(per_page).max(1);
    let first = (page.saturating_sub(1)) * per_page + 1;
    let items = (first..=total.min(page * per_page))
        .map(|n| repo(u64::from(n), &format!("{filter}-{n}")))
        .collect();
    wire_page(items, page, last_page)
}
