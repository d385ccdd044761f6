//! Repodesk admin client
//!
//! Controllers for paginated, filtered resource lists and for the booking
//! form's date-dependent slot set, driven against the repodesk REST API.
//!
//! Controllers never await on their own. Every state change that needs the
//! network returns a pending request; the caller runs it (possibly
//! concurrently with others) and hands the outcome back with `commit`, which
//! drops outcomes that have been superseded in the meantime.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod api_client;
pub mod backend;
pub mod capabilities;
pub mod debounce;
pub mod error;
pub mod forms;
pub mod mock;
pub mod pagination;
pub mod resource_list;
pub mod slots;

// Re-export the main types
pub use api_client::ApiClient;
pub use backend::Backend;
pub use capabilities::{AdminContext, Confirm, ConfirmPrompt, Notifier, TracingNotifier};
pub use debounce::FilterDebounce;
pub use error::{ApiError, ApiResult, ErrorKind};
pub use forms::{BookingForm, FormMode, RecordForm, SubmitOutcome};
pub use resource_list::{CommitStatus, DeleteOutcome, PendingFetch, ResourceListController};
pub use slots::{SlotAvailabilityController, SlotRejection, SlotState};
