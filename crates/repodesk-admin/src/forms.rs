//! Create and edit forms
//!
//! A form holds a draft, sends it on submit and turns every failure into form
//! state: field messages for rejected input, a notification for anything else.
//! After a successful submit the caller refreshes the affected list with
//! [`ResourceListController::notify_mutated`](crate::ResourceListController::notify_mutated).

use std::collections::BTreeMap;

use chrono::NaiveDate;
use repodesk_core::{BookingDraft, Draft, RecordDraft, ResourceKind, drafts::parse_date};
use tracing::{debug, info, warn};

use crate::capabilities::AdminContext;
use crate::error::{ApiError, ApiResult, ErrorKind};
use crate::resource_list::CommitStatus;
use crate::slots::{PendingSlots, SlotAvailabilityController, SlotRejection, SlotsOutcome};

/// Result of submitting a form
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The backend accepted the draft; the form has been reset and closed
    Saved(serde_json::Value),
    /// The draft was rejected field by field; the form stays open
    Invalid,
    /// Anything else went wrong; the draft was not applied
    Failed,
}

/// Whether a form creates a new record or edits an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    /// POST to the create endpoint
    Create,
    /// PUT to the update endpoint of record `id`
    Edit {
        /// Record being edited
        id: u64,
    },
}

/// Create/edit form for one record
///
/// The collection is fixed by the draft type, see [`RecordDraft::KIND`].
#[derive(Debug)]
pub struct RecordForm<D> {
    mode: FormMode,
    ctx: AdminContext,
    draft: D,
    field_errors: BTreeMap<String, String>,
    open: bool,
}

impl<D: RecordDraft> RecordForm<D> {
    /// Open an empty create form
    pub fn create(ctx: AdminContext) -> Self {
        Self {
            mode: FormMode::Create,
            ctx,
            draft: D::default(),
            field_errors: BTreeMap::new(),
            open: true,
        }
    }

    /// Open an edit form seeded with `draft`
    ///
    /// # Errors
    ///
    /// Returns an error if records of the draft's kind cannot be edited.
    pub fn edit(ctx: AdminContext, id: u64, draft: D) -> ApiResult<Self> {
        if D::KIND.update_path(id).is_none() {
            return Err(ApiError::invalid_request(format!(
                "{} records cannot be edited",
                D::KIND.singular()
            )));
        }

        Ok(Self {
            mode: FormMode::Edit { id },
            ctx,
            draft,
            field_errors: BTreeMap::new(),
            open: true,
        })
    }

    /// Resource kind this form saves to
    pub const fn kind(&self) -> ResourceKind {
        D::KIND
    }

    /// Create or edit
    pub const fn mode(&self) -> FormMode {
        self.mode
    }

    /// Current draft
    pub const fn draft(&self) -> &D {
        &self.draft
    }

    /// First message per rejected field
    pub const fn field_errors(&self) -> &BTreeMap<String, String> {
        &self.field_errors
    }

    /// Message shown under `field`, if any
    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.field_errors.get(field).map(String::as_str)
    }

    /// Whether the form is still shown
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Update one field; its stale message goes away
    ///
    /// # Errors
    ///
    /// Returns an error for unknown fields or text the field cannot hold.
    pub fn set_field(&mut self, name: &str, value: &str) -> repodesk_core::Result<()> {
        self.draft.set_field(name, value)?;
        self.field_errors.remove(name);
        Ok(())
    }

    /// Cancel: drop the draft and any messages
    pub fn close(&mut self) {
        self.draft = D::default();
        self.field_errors.clear();
        self.open = false;
    }

    /// Send the draft to the backend
    pub async fn submit(&mut self) -> SubmitOutcome {
        let body = match self.draft.to_body() {
            Ok(body) => body,
            Err(e) => {
                warn!(kind = %D::KIND, "Failed to encode draft: {}", e);
                self.ctx.notifier.error("An unexpected error occurred.");
                return SubmitOutcome::Failed;
            }
        };

        let result = match self.mode {
            FormMode::Create => self.ctx.backend.create(&D::KIND.create_path(), &body).await,
            FormMode::Edit { id } => match D::KIND.update_path(id) {
                Some(path) => self.ctx.backend.update(&path, &body).await,
                None => Err(ApiError::invalid_request("record cannot be edited")),
            },
        };

        match result {
            Ok(saved) => {
                let verb = match self.mode {
                    FormMode::Create => "created",
                    FormMode::Edit { .. } => "updated",
                };
                info!(kind = %D::KIND, mode = ?self.mode, "record saved");
                self.ctx
                    .notifier
                    .success(&format!("{} {verb} successfully!", D::KIND.singular()));
                self.close();
                SubmitOutcome::Saved(saved)
            }
            Err(e) if e.kind() == ErrorKind::Validation => {
                self.field_errors = e.first_messages();
                debug!(kind = %D::KIND, fields = ?self.field_errors.keys().collect::<Vec<_>>(), "draft rejected");
                if let FormMode::Edit { .. } = self.mode {
                    self.ctx.notifier.error(&format!(
                        "Failed to update {}.",
                        D::KIND.singular().to_lowercase()
                    ));
                }
                SubmitOutcome::Invalid
            }
            Err(e) => {
                warn!(kind = %D::KIND, "Failed to save record: {}", e);
                self.ctx.notifier.error("An unexpected error occurred.");
                SubmitOutcome::Failed
            }
        }
    }
}

/// Booking creation form with its date-dependent slot set
///
/// The selected time is only ever a slot that is available on the selected
/// date; changing the date clears it.
#[derive(Debug)]
pub struct BookingForm {
    ctx: AdminContext,
    draft: BookingDraft,
    slots: SlotAvailabilityController,
    field_errors: BTreeMap<String, String>,
    open: bool,
}

impl BookingForm {
    /// Open an empty booking form
    pub fn new(ctx: AdminContext) -> Self {
        Self {
            slots: SlotAvailabilityController::new(ctx.clone()),
            ctx,
            draft: BookingDraft::default(),
            field_errors: BTreeMap::new(),
            open: true,
        }
    }

    /// Current draft
    pub const fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    /// Slot controller for the selected date
    pub const fn slots(&self) -> &SlotAvailabilityController {
        &self.slots
    }

    /// First message per rejected field
    pub const fn field_errors(&self) -> &BTreeMap<String, String> {
        &self.field_errors
    }

    /// Message shown under `field`, if any
    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.field_errors.get(field).map(String::as_str)
    }

    /// Whether the form is still shown
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Select a date: the time is cleared and the slots for `date` are requested
    pub fn set_date(&mut self, date: Option<NaiveDate>) -> Option<PendingSlots> {
        self.draft.set_meeting_date(date);
        self.field_errors.remove("meeting_date");
        self.field_errors.remove("meeting_time");
        self.slots.set_date(date)
    }

    /// Select a time on the current date
    ///
    /// # Errors
    ///
    /// Returns why the time cannot be booked; the draft keeps its previous time.
    pub fn select_time(&mut self, time: &str) -> Result<(), SlotRejection> {
        self.slots.check_time(time)?;
        self.draft.meeting_time = time.trim().to_string();
        self.field_errors.remove("meeting_time");
        Ok(())
    }

    /// Update one field by wire name
    ///
    /// Date changes return the slot read they trigger.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown fields, unparseable dates and unbookable times.
    pub fn set_field(&mut self, name: &str, value: &str) -> repodesk_core::Result<Option<PendingSlots>> {
        match name {
            "meeting_date" => Ok(self.set_date(parse_date(value)?)),
            "meeting_time" => {
                self.select_time(value)
                    .map_err(|e| repodesk_core::Error::validation(name, e.to_string()))?;
                Ok(None)
            }
            _ => {
                self.draft.set_field(name, value)?;
                self.field_errors.remove(name);
                Ok(None)
            }
        }
    }

    /// Commit a slot read and drop a selected time that is no longer bookable
    pub fn commit_slots(&mut self, outcome: SlotsOutcome) -> CommitStatus {
        let status = self.slots.commit(outcome);
        if status != CommitStatus::Stale
            && !self.draft.meeting_time.is_empty()
            && self.slots.check_time(&self.draft.meeting_time).is_err()
        {
            debug!(time = %self.draft.meeting_time, "selected time no longer offered");
            self.draft.meeting_time.clear();
        }
        status
    }

    /// Run a slot read to completion and commit it
    pub async fn settle_slots(&mut self, pending: PendingSlots) -> CommitStatus {
        let outcome = pending.run().await;
        self.commit_slots(outcome)
    }

    /// Cancel: drop the draft, messages and slots
    pub fn close(&mut self) {
        self.draft = BookingDraft::default();
        self.field_errors.clear();
        let _ = self.slots.set_date(None);
        self.open = false;
    }

    fn check_locally(&mut self) -> bool {
        if self.draft.meeting_date.is_none() {
            self.field_errors.insert(
                "meeting_date".to_string(),
                "Please select a date.".to_string(),
            );
        }
        if let Err(rejection) = self.slots.check_time(&self.draft.meeting_time) {
            self.field_errors
                .insert("meeting_time".to_string(), rejection.to_string());
        }
        self.field_errors.is_empty()
    }

    /// Book the appointment
    ///
    /// Drafts without a date or with a time that is not available on that
    /// date are rejected without contacting the backend.
    pub async fn submit(&mut self) -> SubmitOutcome {
        self.field_errors.clear();
        if !self.check_locally() {
            debug!(fields = ?self.field_errors.keys().collect::<Vec<_>>(), "booking rejected locally");
            return SubmitOutcome::Invalid;
        }

        let body = match self.draft.to_body() {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to encode booking: {}", e);
                self.ctx.notifier.error("Failed to book appointment.");
                return SubmitOutcome::Failed;
            }
        };

        let path = ResourceKind::Booking.create_path();
        match self.ctx.backend.create(&path, &body).await {
            Ok(saved) => {
                let date = self
                    .draft
                    .meeting_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                info!(%date, time = %self.draft.meeting_time, "appointment booked");
                self.ctx.notifier.success(&format!(
                    "Appointment booked for {} on {}!",
                    self.draft.meeting_time, date
                ));
                self.close();
                SubmitOutcome::Saved(saved)
            }
            Err(e) if e.kind() == ErrorKind::Validation => {
                self.field_errors = e.first_messages();
                SubmitOutcome::Invalid
            }
            Err(e) => {
                warn!("Failed to book appointment: {}", e);
                self.ctx.notifier.error("Failed to book appointment.");
                SubmitOutcome::Failed
            }
        }
    }
}
