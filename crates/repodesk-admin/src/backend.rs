//! The backend contract the controllers depend on

use crate::error::ApiResult;
use async_trait::async_trait;
use chrono::NaiveDate;
use repodesk_core::{BookingSlot, FieldErrors, ListQuery};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Remote API consumed by the list controller, the slot controller and the forms
///
/// Paths are endpoint paths such as `/user/booking/fetch`; implementations
/// resolve them against their base URL.
#[async_trait]
pub trait Backend: Send + Sync + fmt::Debug {
    /// `GET <path>?page=<page>&filter=<filter>`
    async fn fetch_page(&self, path: &str, query: &ListQuery) -> ApiResult<WirePage>;

    /// `GET /user/booking/slots?date=<date>`
    async fn fetch_slots(&self, date: NaiveDate) -> ApiResult<Vec<BookingSlot>>;

    /// `DELETE <path>`; only success or failure matters
    async fn delete(&self, path: &str) -> ApiResult<()>;

    /// `POST <path>` with a draft body
    async fn create(&self, path: &str, body: &serde_json::Value) -> ApiResult<serde_json::Value>;

    /// `PUT <path>` with a draft body
    async fn update(&self, path: &str, body: &serde_json::Value) -> ApiResult<serde_json::Value>;
}

/// Slot availability endpoint
pub const SLOTS_PATH: &str = "/user/booking/slots";

/// `{ data: <page> }` wrapper around a list response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListEnvelope {
    /// The page itself
    pub data: WirePage,
}

/// List page as sent by the backend, items still untyped
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct WirePage {
    /// Items on the page; `null` is treated as empty
    #[serde(default)]
    pub data: Option<Vec<serde_json::Value>>,
    /// Current page (1-based)
    #[serde(default)]
    pub current_page: Option<u32>,
    /// Last available page
    #[serde(default)]
    pub last_page: Option<u32>,
    /// Pagination bar entries
    #[serde(default)]
    pub links: Vec<WireLink>,
}

/// Pagination entry as sent by the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct WireLink {
    /// Target URL carrying a `page` query parameter, `null` for disabled entries
    #[serde(default)]
    pub url: Option<String>,
    /// Label, possibly containing HTML entities
    #[serde(default)]
    pub label: String,
    /// Whether this is the current page
    #[serde(default)]
    pub active: bool,
}

/// `{ data: { values: [...] } }` wrapper around slot availability
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SlotsEnvelope {
    /// Inner object
    pub data: SlotValues,
}

/// Slot list holder
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SlotValues {
    /// Slots for the requested date
    #[serde(default)]
    pub values: Vec<BookingSlot>,
}

/// Error body of a rejected request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    /// Field-level messages
    #[serde(default)]
    pub errors: Option<FieldErrors>,
    /// General message
    #[serde(default)]
    pub message: Option<String>,
}
