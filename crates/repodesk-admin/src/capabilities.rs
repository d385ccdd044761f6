//! Side effects the controllers need from their host, injected as trait objects

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info};

use crate::backend::Backend;

/// Toast-style user notifications
pub trait Notifier: Send + Sync + fmt::Debug {
    /// Report a completed action
    fn success(&self, message: &str);

    /// Report a failed action
    fn error(&self, message: &str);
}

/// Question shown before a destructive action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    /// Headline
    pub title: String,
    /// Explanation
    pub text: String,
    /// Label of the confirming choice
    pub confirm_label: String,
}

impl ConfirmPrompt {
    /// Standard prompt for deleting a record
    pub fn delete() -> Self {
        Self {
            title: "Are you sure?".to_string(),
            text: "You won't be able to revert this!".to_string(),
            confirm_label: "Yes, delete it!".to_string(),
        }
    }
}

/// Asks the user to confirm a destructive action
#[async_trait]
pub trait Confirm: Send + Sync + fmt::Debug {
    /// `true` only when the user explicitly agreed
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool;
}

/// Notifier that writes to the tracing pipeline
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        info!(notification = "success", "{}", message);
    }

    fn error(&self, message: &str) {
        error!(notification = "error", "{}", message);
    }
}

/// Everything a controller needs from the outside world
#[derive(Debug, Clone)]
pub struct AdminContext {
    /// Remote API
    pub backend: Arc<dyn Backend>,
    /// User notifications
    pub notifier: Arc<dyn Notifier>,
    /// Confirmation before destructive actions
    pub confirm: Arc<dyn Confirm>,
}

impl AdminContext {
    /// Bundle the capabilities
    pub fn new(
        backend: Arc<dyn Backend>,
        notifier: Arc<dyn Notifier>,
        confirm: Arc<dyn Confirm>,
    ) -> Self {
        Self {
            backend,
            notifier,
            confirm,
        }
    }
}
