//! Paginated, filtered list of one resource kind
//!
//! The controller owns a [`ListQuery`] and re-fetches whenever it changes.
//! Every state change hands back a [`PendingFetch`] tagged with a monotonic
//! sequence number; its outcome is only committed if no newer fetch has been
//! issued since, so a slow response for an old query can never overwrite the
//! state produced by a newer one.

use std::marker::PhantomData;
use std::sync::Arc;

use repodesk_core::{ListQuery, PageLink, PageResult, Record, ResourceKind};
use tracing::{debug, error, info, warn};

use crate::backend::{Backend, WirePage};
use crate::capabilities::{AdminContext, ConfirmPrompt};
use crate::error::{ApiResult, ErrorKind};
use crate::pagination::page_from_wire;

/// What happened to a fetch outcome handed back to its controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStatus {
    /// The outcome was current and replaced the visible state
    Applied,
    /// The outcome was current but the request failed; the error is now visible
    Failed,
    /// A newer request was issued in the meantime; the outcome was dropped
    Stale,
}

/// A list read that has been issued but not yet resolved
#[derive(Debug)]
#[must_use = "a pending fetch does nothing until it is run and committed"]
pub struct PendingFetch {
    seq: u64,
    query: ListQuery,
    path: String,
    backend: Arc<dyn Backend>,
}

impl PendingFetch {
    /// Query this fetch was issued for
    pub const fn query(&self) -> &ListQuery {
        &self.query
    }

    /// Sequence tag
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    /// Perform the read; does not touch controller state
    pub async fn run(self) -> FetchOutcome {
        let result = self.backend.fetch_page(&self.path, &self.query).await;
        FetchOutcome {
            seq: self.seq,
            query: self.query,
            result,
        }
    }
}

/// Resolved list read, waiting to be committed
#[derive(Debug)]
pub struct FetchOutcome {
    seq: u64,
    query: ListQuery,
    result: ApiResult<WirePage>,
}

impl FetchOutcome {
    /// Query the fetch was issued for
    pub const fn query(&self) -> &ListQuery {
        &self.query
    }
}

/// Result of a delete request
#[derive(Debug)]
pub enum DeleteOutcome {
    /// The user declined; nothing was sent
    Cancelled,
    /// The record is gone; the returned fetch refreshes the list
    Deleted(PendingFetch),
    /// The backend refused or could not be reached; the list is left alone
    Failed,
}

/// Controller for one page of a filtered resource collection
#[derive(Debug)]
pub struct ResourceListController<T> {
    kind: ResourceKind,
    ctx: AdminContext,
    query: ListQuery,
    page: PageResult<T>,
    loading: bool,
    error: Option<String>,
    seq: u64,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> ResourceListController<T> {
    /// Create a controller for `T`'s collection; nothing is fetched until [`Self::mount`]
    pub fn new(ctx: AdminContext) -> Self {
        Self {
            kind: T::KIND,
            ctx,
            query: ListQuery::default(),
            page: PageResult::empty(),
            loading: false,
            error: None,
            seq: 0,
            _record: PhantomData,
        }
    }

    /// Resource kind this controller lists
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Current query
    pub const fn query(&self) -> &ListQuery {
        &self.query
    }

    /// Items of the most recently committed page
    pub fn items(&self) -> &[T] {
        &self.page.items
    }

    /// Most recently committed page, including pagination metadata
    pub const fn pagination(&self) -> &PageResult<T> {
        &self.page
    }

    /// Whether a fetch for the current query is outstanding
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Inline error from the last failed fetch
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Hide the inline error without re-fetching
    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Initial fetch on activation
    pub fn mount(&mut self) -> PendingFetch {
        self.issue()
    }

    /// Initial fetch for a known page and filter, e.g. restored from a URL
    ///
    /// The page is not checked; [`Self::settle`] steps back if it does not exist.
    pub fn mount_at(&mut self, query: ListQuery) -> PendingFetch {
        self.query = query;
        self.issue()
    }

    /// Replace the filter; the page always goes back to 1
    pub fn set_filter(&mut self, text: impl Into<String>) -> Option<PendingFetch> {
        let next = self.query.with_filter(text);
        self.transition(next)
    }

    /// Move to page `n` if the last committed page says it exists; otherwise a no-op
    pub fn go_to_page(&mut self, n: u32) -> Option<PendingFetch> {
        if !self.page.contains_page(n) {
            debug!(
                kind = %self.kind,
                page = n,
                last_page = self.page.last_page,
                "ignoring out-of-range page"
            );
            return None;
        }
        let next = self.query.with_page(n);
        self.transition(next)
    }

    /// Follow a pagination link; links without a target page do nothing
    pub fn follow_link(&mut self, link: &PageLink) -> Option<PendingFetch> {
        link.page.and_then(|n| self.go_to_page(n))
    }

    /// Re-fetch the same page and filter after a create/edit/delete elsewhere
    pub fn notify_mutated(&mut self) -> PendingFetch {
        self.query = self.query.next_epoch();
        self.issue()
    }

    fn transition(&mut self, next: ListQuery) -> Option<PendingFetch> {
        if next == self.query {
            return None;
        }
        self.query = next;
        Some(self.issue())
    }

    fn issue(&mut self) -> PendingFetch {
        self.seq = self.seq.wrapping_add(1);
        self.loading = true;
        debug!(
            kind = %self.kind,
            seq = self.seq,
            page = self.query.page,
            filter = %self.query.filter,
            epoch = self.query.epoch,
            "issuing list fetch"
        );

        PendingFetch {
            seq: self.seq,
            query: self.query.clone(),
            path: self.kind.list_path(),
            backend: Arc::clone(&self.ctx.backend),
        }
    }

    /// Commit a resolved fetch; outcomes of superseded fetches are dropped silently
    pub fn commit(&mut self, outcome: FetchOutcome) -> CommitStatus {
        if outcome.seq != self.seq {
            debug!(
                kind = %self.kind,
                seq = outcome.seq,
                current = self.seq,
                "dropping stale list response"
            );
            return CommitStatus::Stale;
        }

        self.loading = false;
        match outcome.result.and_then(page_from_wire::<T>) {
            Ok(page) => {
                self.page = page;
                self.error = None;
                CommitStatus::Applied
            }
            Err(e) => {
                if e.kind() == ErrorKind::TransientFetch {
                    warn!(kind = %self.kind, "Failed to fetch {}: {}", self.kind.plural(), e);
                } else {
                    error!(kind = %self.kind, "Failed to fetch {}: {}", self.kind.plural(), e);
                }
                self.page.items.clear();
                self.error = Some(format!(
                    "Error fetching {}. Please try again.",
                    self.kind.plural()
                ));
                self.ctx
                    .notifier
                    .error(&format!("Error fetching {}.", self.kind.plural()));
                CommitStatus::Failed
            }
        }
    }

    /// Step back to the last page when the current one no longer exists
    ///
    /// Deleting the only item on the last page leaves the query pointing past
    /// the end; the committed result then reports a smaller `last_page`.
    pub fn correct_overflow(&mut self) -> Option<PendingFetch> {
        if self.loading || self.error.is_some() || self.query.page <= self.page.last_page {
            return None;
        }
        debug!(
            kind = %self.kind,
            from = self.query.page,
            to = self.page.last_page,
            "page no longer exists, moving to last page"
        );
        let next = self.query.with_page(self.page.last_page);
        self.transition(next)
    }

    /// Run a pending fetch to completion, following up on page overflow
    pub async fn settle(&mut self, pending: PendingFetch) -> CommitStatus {
        let mut status = self.commit(pending.run().await);
        while status == CommitStatus::Applied {
            let Some(next) = self.correct_overflow() else {
                break;
            };
            status = self.commit(next.run().await);
        }
        status
    }

    /// Delete a record after confirmation; a successful delete refreshes the list
    pub async fn delete(&mut self, id: u64) -> DeleteOutcome {
        if !self.ctx.confirm.confirm(&ConfirmPrompt::delete()).await {
            debug!(kind = %self.kind, id, "delete cancelled");
            return DeleteOutcome::Cancelled;
        }

        match self.ctx.backend.delete(&self.kind.delete_path(id)).await {
            Ok(()) => {
                info!(kind = %self.kind, id, "record deleted");
                self.ctx
                    .notifier
                    .success(&format!("{} deleted successfully!", self.kind.singular()));
                DeleteOutcome::Deleted(self.notify_mutated())
            }
            Err(e) => {
                warn!(kind = %self.kind, id, "Failed to delete record: {}", e);
                self.ctx.notifier.error(&format!(
                    "Error deleting {}.",
                    self.kind.singular().to_lowercase()
                ));
                DeleteOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;
    use crate::mock::{FixedConfirm, MockBackend, Notice, RecordingNotifier, wire_page};
    use crate::error::ApiError;
    use pretty_assertions::assert_eq;
    use repodesk_core::OrganisationRepo;
    use serde_json::json;

    fn controller(
        backend: MockBackend,
    ) -> (
        ResourceListController<OrganisationRepo>,
        Arc<MockBackend>,
        Arc<RecordingNotifier>,
    ) {
        let backend = Arc::new(backend);
        let notifier = Arc::new(RecordingNotifier::default());
        let ctx = AdminContext::new(
            backend.clone(),
            notifier.clone(),
            Arc::new(FixedConfirm::new(true)),
        );
        (ResourceListController::new(ctx), backend, notifier)
    }

    fn three_pages() -> MockBackend {
        MockBackend::new().on_list(|_, query| {
            Ok(wire_page(
                vec![json!({"id": query.page, "name": format!("repo-{}-{}", query.filter, query.page)})],
                query.page,
                3,
            ))
        })
    }

    #[tokio::test]
    async fn test_mount_loads_first_page() {
        let (mut list, backend, _) = controller(three_pages());

        let pending = list.mount();
        assert!(list.is_loading());
        assert_eq!(pending.query(), &ListQuery::default());

        assert_eq!(list.settle(pending).await, CommitStatus::Applied);
        assert!(!list.is_loading());
        assert_eq!(list.items()[0].name, "repo--1");
        assert_eq!(list.pagination().last_page, 3);
        assert_eq!(backend.list_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_filter_resets_page() {
        let (mut list, _, _) = controller(three_pages());
        let pending = list.mount();
        list.settle(pending).await;
        let pending = list.go_to_page(3).unwrap();
        list.settle(pending).await;

        let pending = list.set_filter("alpha").unwrap();

        assert_eq!(pending.query().page, 1);
        assert_eq!(pending.query().filter, "alpha");
    }

    #[tokio::test]
    async fn test_same_filter_on_first_page_does_not_refetch() {
        let (mut list, _, _) = controller(three_pages());
        let pending = list.mount();
        list.settle(pending).await;

        assert!(list.set_filter("").is_none());
    }

    #[tokio::test]
    async fn test_out_of_range_page_is_noop() {
        let (mut list, backend, _) = controller(three_pages());
        let pending = list.mount();
        list.settle(pending).await;
        let before = list.query().clone();

        assert!(list.go_to_page(0).is_none());
        assert!(list.go_to_page(4).is_none());
        assert!(list.go_to_page(1).is_none());

        assert_eq!(list.query(), &before);
        assert_eq!(list.items()[0].name, "repo--1");
        assert_eq!(backend.list_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_response_is_dropped() {
        let (mut list, _, _) = controller(three_pages());
        let pending = list.mount();
        list.settle(pending).await;

        let first = list.go_to_page(2).unwrap();
        let second = list.set_filter("beta").unwrap();

        let second_outcome = second.run().await;
        let first_outcome = first.run().await;

        assert_eq!(list.commit(second_outcome), CommitStatus::Applied);
        assert_eq!(list.commit(first_outcome), CommitStatus::Stale);
        assert_eq!(list.items()[0].name, "repo-beta-1");
        assert_eq!(list.pagination().current_page, 1);
        assert!(!list.is_loading());
    }

    #[tokio::test]
    async fn test_stale_arriving_first_does_not_clear_loading() {
        let (mut list, _, _) = controller(three_pages());
        let first = list.mount();
        let second = list.set_filter("gamma").unwrap();

        assert_eq!(list.commit(first.run().await), CommitStatus::Stale);
        assert!(list.is_loading());
        assert!(list.items().is_empty());

        assert_eq!(list.commit(second.run().await), CommitStatus::Applied);
        assert!(!list.is_loading());
    }

    #[tokio::test]
    async fn test_notify_mutated_keeps_page_and_filter() {
        let (mut list, _, _) = controller(three_pages());
        let pending = list.mount();
        list.settle(pending).await;
        let pending = list.set_filter("delta").unwrap();
        list.settle(pending).await;
        let pending = list.go_to_page(2).unwrap();
        list.settle(pending).await;
        let before = list.query().clone();

        let pending = list.notify_mutated();

        assert_eq!(pending.query().page, before.page);
        assert_eq!(pending.query().filter, before.filter);
        assert_eq!(pending.query().epoch, before.epoch + 1);
    }

    #[tokio::test]
    async fn test_fetch_error_clears_items() {
        let backend = MockBackend::new().on_list(|_, query| {
            if query.page == 1 {
                Ok(wire_page(vec![json!({"id": 1, "name": "alpha"})], 1, 2))
            } else {
                Err(ApiError::Status {
                    status: 500,
                    message: "boom".to_string(),
                })
            }
        });
        let (mut list, _, notifier) = controller(backend);
        let pending = list.mount();
        list.settle(pending).await;

        let pending = list.go_to_page(2).unwrap();
        assert_eq!(list.settle(pending).await, CommitStatus::Failed);

        assert!(list.items().is_empty());
        assert_eq!(
            list.error(),
            Some("Error fetching organisation repositories. Please try again.")
        );
        assert_eq!(
            notifier.notices(),
            vec![Notice::Error("Error fetching organisation repositories.".to_string())]
        );

        list.dismiss_error();
        assert!(list.error().is_none());
    }

    #[tokio::test]
    async fn test_failed_page_keeps_known_last_page() {
        let backend = MockBackend::new().on_list(|_, query| {
            if query.page == 2 {
                Err(ApiError::Status {
                    status: 503,
                    message: "unavailable".to_string(),
                })
            } else {
                Ok(wire_page(vec![json!({"id": query.page, "name": "alpha"})], query.page, 3))
            }
        });
        let (mut list, backend, _) = controller(backend);
        let pending = list.mount();
        list.settle(pending).await;

        let pending = list.go_to_page(2).unwrap();
        assert_eq!(list.settle(pending).await, CommitStatus::Failed);
        assert_eq!(list.pagination().last_page, 3);

        let pending = list.go_to_page(3).unwrap();
        assert_eq!(list.settle(pending).await, CommitStatus::Applied);
        assert_eq!(list.pagination().current_page, 3);
        assert_eq!(backend.list_calls().len(), 3);
    }

    #[tokio::test]
    async fn test_null_fields_do_not_fail_the_page() {
        let backend = MockBackend::new().on_list(|_, _| {
            Ok(wire_page(
                vec![
                    json!({"id": 1, "name": "alpha"}),
                    json!({"id": 2, "name": null, "language": null, "forks_count": null}),
                ],
                1,
                1,
            ))
        });
        let (mut list, _, notifier) = controller(backend);
        let pending = list.mount();

        assert_eq!(list.settle(pending).await, CommitStatus::Applied);
        assert_eq!(list.items().len(), 2);
        assert_eq!(list.items()[1].name, "");
        assert_eq!(list.error(), None);
        assert!(notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn test_mount_at_fetches_once() {
        let (mut list, backend, _) = controller(three_pages());
        let query = ListQuery::default().with_filter("alpha").with_page(2);

        let pending = list.mount_at(query.clone());
        assert_eq!(list.settle(pending).await, CommitStatus::Applied);

        assert_eq!(backend.list_calls(), vec![query]);
        assert_eq!(list.items()[0].name, "repo-alpha-2");
    }

    #[tokio::test]
    async fn test_mount_at_missing_page_steps_back() {
        let (mut list, backend, _) = controller(three_pages());

        let pending = list.mount_at(ListQuery::default().with_page(7));
        assert_eq!(list.settle(pending).await, CommitStatus::Applied);

        let pages: Vec<_> = backend.list_calls().iter().map(|q| q.page).collect();
        assert_eq!(pages, vec![7, 3]);
        assert_eq!(list.query().page, 3);
    }

    #[tokio::test]
    async fn test_follow_link_without_target() {
        let (mut list, _, _) = controller(three_pages());
        let pending = list.mount();
        list.settle(pending).await;

        let ellipsis = PageLink {
            page: None,
            active: false,
            label: "...".to_string(),
        };
        assert!(list.follow_link(&ellipsis).is_none());
        assert!(list.follow_link(&PageLink::for_page(2, false)).is_some());
    }

    #[tokio::test]
    async fn test_delete_confirmed_refreshes() {
        let (mut list, backend, notifier) = controller(three_pages());
        let pending = list.mount();
        list.settle(pending).await;
        let epoch = list.query().epoch;

        let outcome = list.delete(1).await;

        let DeleteOutcome::Deleted(pending) = outcome else {
            panic!("Expected delete to succeed, got {outcome:?}");
        };
        assert_eq!(pending.query().epoch, epoch + 1);
        assert_eq!(backend.deleted_paths(), vec!["/user/org_repository/delete/1"]);
        assert_eq!(
            notifier.notices(),
            vec![Notice::Success("Repository deleted successfully!".to_string())]
        );
    }

    #[tokio::test]
    async fn test_delete_declined_sends_nothing() {
        let backend = Arc::new(three_pages());
        let notifier = Arc::new(RecordingNotifier::default());
        let ctx = AdminContext::new(
            backend.clone(),
            notifier.clone(),
            Arc::new(FixedConfirm::new(false)),
        );
        let mut list = ResourceListController::<OrganisationRepo>::new(ctx);

        assert!(matches!(list.delete(1).await, DeleteOutcome::Cancelled));
        assert!(backend.deleted_paths().is_empty());
        assert!(notifier.notices().is_empty());
        assert_eq!(list.query().epoch, 0);
    }

    #[tokio::test]
    async fn test_delete_failure_does_not_refresh() {
        let backend = three_pages().on_delete(|_| {
            Err(ApiError::Status {
                status: 403,
                message: "forbidden".to_string(),
            })
        });
        let (mut list, _, notifier) = controller(backend);
        let pending = list.mount();
        list.settle(pending).await;

        assert!(matches!(list.delete(1).await, DeleteOutcome::Failed));
        assert_eq!(list.query().epoch, 0);
        assert!(!list.is_loading());
        assert_eq!(
            notifier.notices(),
            vec![Notice::Error("Error deleting repository.".to_string())]
        );
    }
}
