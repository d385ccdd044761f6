//! Bookable time slots for the date selected in the booking form
//!
//! Transitions:
//!
//! | from      | input                 | to              |
//! |-----------|-----------------------|-----------------|
//! | any       | `set_date(None)`      | `NoDate`        |
//! | any       | `set_date(Some(d))`   | `Loading(d)`    |
//! | `Loading` | current fetch ok      | `Loaded`        |
//! | `Loading` | current fetch failed  | `Failed`        |
//! | any       | superseded fetch      | unchanged       |

use std::sync::Arc;

use chrono::NaiveDate;
use repodesk_core::BookingSlot;
use thiserror::Error;
use tracing::{debug, warn};

use crate::backend::Backend;
use crate::capabilities::AdminContext;
use crate::error::ApiResult;
use crate::resource_list::CommitStatus;

/// Where the slot controller is in its per-date lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SlotState {
    /// No date selected
    #[default]
    NoDate,
    /// Waiting for the slots of `date`
    Loading {
        /// Requested date
        date: NaiveDate,
    },
    /// Slots of `date` are known
    Loaded {
        /// Date the slots belong to
        date: NaiveDate,
        /// Slots in backend order
        slots: Vec<BookingSlot>,
    },
    /// The slot read for `date` failed
    Failed {
        /// Requested date
        date: NaiveDate,
        /// What went wrong
        message: String,
    },
}

impl SlotState {
    /// Date the state belongs to
    pub const fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::NoDate => None,
            Self::Loading { date } | Self::Loaded { date, .. } | Self::Failed { date, .. } => {
                Some(*date)
            }
        }
    }
}

/// Why a time cannot be booked
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotRejection {
    /// No time has been chosen
    #[error("Please select a time slot.")]
    Missing,
    /// Slots for the selected date are not known yet, or failed to load
    #[error("Available slots for the selected date are not loaded.")]
    NotLoaded,
    /// The time is not offered on the selected date
    #[error("{0} is not a slot on the selected date.")]
    Unknown(String),
    /// The slot exists but is already taken
    #[error("{0} is no longer available.")]
    Unavailable(String),
}

/// A slot read that has been issued but not yet resolved
#[derive(Debug)]
#[must_use = "a pending slot fetch does nothing until it is run and committed"]
pub struct PendingSlots {
    seq: u64,
    date: NaiveDate,
    backend: Arc<dyn Backend>,
}

impl PendingSlots {
    /// Date being fetched
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Perform the read; does not touch controller state
    pub async fn run(self) -> SlotsOutcome {
        let result = self.backend.fetch_slots(self.date).await;
        SlotsOutcome {
            seq: self.seq,
            date: self.date,
            result,
        }
    }
}

/// Resolved slot read, waiting to be committed
#[derive(Debug)]
pub struct SlotsOutcome {
    seq: u64,
    date: NaiveDate,
    result: ApiResult<Vec<BookingSlot>>,
}

impl SlotsOutcome {
    /// Date the read was issued for
    pub const fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Keeps the slot set in step with the selected date
#[derive(Debug)]
pub struct SlotAvailabilityController {
    ctx: AdminContext,
    state: SlotState,
    seq: u64,
}

impl SlotAvailabilityController {
    /// Controller with no date selected
    pub fn new(ctx: AdminContext) -> Self {
        Self {
            ctx,
            state: SlotState::NoDate,
            seq: 0,
        }
    }

    /// Current lifecycle state
    pub const fn state(&self) -> &SlotState {
        &self.state
    }

    /// Selected date
    pub const fn date(&self) -> Option<NaiveDate> {
        self.state.date()
    }

    /// Slots for the selected date; empty unless they have loaded
    pub fn slots(&self) -> &[BookingSlot] {
        match &self.state {
            SlotState::Loaded { slots, .. } => slots,
            _ => &[],
        }
    }

    /// Whether the slots for the selected date are still being fetched
    pub const fn is_slots_loading(&self) -> bool {
        matches!(self.state, SlotState::Loading { .. })
    }

    /// Message of the last failed read for the selected date
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            SlotState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Select a date; any earlier in-flight read loses its relevance
    pub fn set_date(&mut self, date: Option<NaiveDate>) -> Option<PendingSlots> {
        self.seq = self.seq.wrapping_add(1);

        let Some(date) = date else {
            debug!(seq = self.seq, "date cleared");
            self.state = SlotState::NoDate;
            return None;
        };

        debug!(seq = self.seq, %date, "issuing slot fetch");
        self.state = SlotState::Loading { date };
        Some(PendingSlots {
            seq: self.seq,
            date,
            backend: Arc::clone(&self.ctx.backend),
        })
    }

    /// Commit a resolved read; reads for a superseded date are dropped silently
    pub fn commit(&mut self, outcome: SlotsOutcome) -> CommitStatus {
        if outcome.seq != self.seq {
            debug!(
                seq = outcome.seq,
                current = self.seq,
                date = %outcome.date,
                "dropping stale slot response"
            );
            return CommitStatus::Stale;
        }

        match outcome.result {
            Ok(slots) => {
                debug!(date = %outcome.date, count = slots.len(), "slots loaded");
                self.state = SlotState::Loaded {
                    date: outcome.date,
                    slots,
                };
                CommitStatus::Applied
            }
            Err(e) => {
                warn!(date = %outcome.date, "Failed to fetch available slots: {}", e);
                self.ctx.notifier.error("Failed to fetch available slots.");
                self.state = SlotState::Failed {
                    date: outcome.date,
                    message: e.to_string(),
                };
                CommitStatus::Failed
            }
        }
    }

    /// Run a pending read to completion and commit it
    pub async fn settle(&mut self, pending: PendingSlots) -> CommitStatus {
        let outcome = pending.run().await;
        self.commit(outcome)
    }

    /// Check that `time` is offered and available on the selected date
    ///
    /// # Errors
    ///
    /// Returns the reason the time cannot be booked.
    pub fn check_time(&self, time: &str) -> Result<(), SlotRejection> {
        let time = time.trim();
        if time.is_empty() {
            return Err(SlotRejection::Missing);
        }

        let SlotState::Loaded { slots, .. } = &self.state else {
            return Err(SlotRejection::NotLoaded);
        };

        match slots.iter().find(|slot| slot.time == time) {
            Some(slot) if slot.available => Ok(()),
            Some(_) => Err(SlotRejection::Unavailable(time.to_string())),
            None => Err(SlotRejection::Unknown(time.to_string())),
        }
    }
}
