//! Quiet-period gate in front of [`ResourceListController::set_filter`](crate::ResourceListController::set_filter)

use repodesk_core::config::ListConfig;
use std::time::Duration;
use tokio::time::Instant;

/// Holds back filter text until typing has paused
#[derive(Debug, Clone)]
pub struct FilterDebounce {
    quiet: Duration,
    pending: Option<(String, Instant)>,
}

impl FilterDebounce {
    /// Release text after `quiet` without further keystrokes
    pub const fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    /// Debounce with the configured quiet period
    pub const fn from_config(config: &ListConfig) -> Self {
        Self::new(config.filter_debounce())
    }

    /// Record the latest text; the quiet period restarts
    pub fn push(&mut self, text: impl Into<String>, now: Instant) {
        self.pending = Some((text.into(), now + self.quiet));
    }

    /// When the pending text becomes ready
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    /// Take the pending text if its quiet period has elapsed at `now`
    pub fn take_ready(&mut self, now: Instant) -> Option<String> {
        match self.deadline() {
            Some(deadline) if deadline <= now => self.flush(),
            _ => None,
        }
    }

    /// Take the pending text immediately, e.g. on Enter
    pub fn flush(&mut self) -> Option<String> {
        self.pending.take().map(|(text, _)| text)
    }

    /// Wait out the quiet period and take the text; `None` if nothing is pending
    pub async fn settled(&mut self) -> Option<String> {
        let deadline = self.deadline()?;
        tokio::time::sleep_until(deadline).await;
        self.flush()
    }
}
