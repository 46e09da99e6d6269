//! Generic list view: a collection that is only ever replaced by reloads

use crate::actions::ActionResult;
use crate::views::{report_failure, Confirm, Notifier};

/// Identifies one reload request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReloadTicket(u64);

/// Result of a delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The user declined; nothing was sent
    Cancelled,
    Deleted,
    /// The delete action failed; the collection is untouched
    Failed,
}

/// Holds the currently loaded collection of one entity list.
///
/// Reloads are ticketed: a completed reload is applied only if it was issued
/// after the last applied one, so a slow, older reload can never overwrite a
/// newer collection.
#[derive(Debug)]
pub struct ListView<R> {
    rows: Vec<R>,
    issued: u64,
    applied: u64,
}

impl<R> Default for ListView<R> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            issued: 0,
            applied: 0,
        }
    }
}

impl<R> ListView<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<R> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Issue a ticket for a reload that is about to start
    pub fn begin_reload(&mut self) -> ReloadTicket {
        self.issued += 1;
        ReloadTicket(self.issued)
    }

    /// Apply a finished reload. Returns false (and drops `rows`) when a newer
    /// reload has already been applied.
    pub fn complete_reload(&mut self, ticket: ReloadTicket, rows: Vec<R>) -> bool {
        if ticket.0 <= self.applied {
            tracing::debug!(ticket = ticket.0, applied = self.applied, "dropping stale reload");
            return false;
        }
        self.applied = ticket.0;
        self.rows = rows;
        true
    }

    /// Fetch the full collection and replace the current one. On failure the
    /// current collection is kept.
    pub fn reload(&mut self, fetch: impl FnOnce() -> ActionResult<Vec<R>>) -> ActionResult<()> {
        let ticket = self.begin_reload();
        let rows = fetch()?;
        self.complete_reload(ticket, rows);
        Ok(())
    }

    /// Confirm, delete, notify, then reload.
    ///
    /// `delete` is never invoked unless `confirm` agrees.
    pub fn delete(
        &mut self,
        label: &str,
        confirm: &mut dyn Confirm,
        notifier: &dyn Notifier,
        delete: impl FnOnce() -> ActionResult<()>,
        fetch: impl FnOnce() -> ActionResult<Vec<R>>,
    ) -> DeleteOutcome {
        if !confirm.confirm(&format!("Delete {}? This cannot be undone.", label)) {
            notifier.info("Delete cancelled");
            return DeleteOutcome::Cancelled;
        }

        if let Err(e) = delete() {
            report_failure(notifier, &e);
            return DeleteOutcome::Failed;
        }

        notifier.success(&format!("Deleted {}", label));
        if let Err(e) = self.reload(fetch) {
            report_failure(notifier, &e);
        }
        DeleteOutcome::Deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionError;
    use crate::views::testing::{RecordingNotifier, ScriptedConfirm};
    use std::cell::Cell;

    #[test]
    fn test_reload_replaces_collection() {
        let mut view = ListView::new();
        view.reload(|| Ok(vec![1, 2, 3])).unwrap();
        assert_eq!(view.rows(), &[1, 2, 3]);
        view.reload(|| Ok(vec![4])).unwrap();
        assert_eq!(view.rows(), &[4]);
    }

    #[test]
    fn test_failed_reload_keeps_collection() {
        let mut view = ListView::new();
        view.reload(|| Ok(vec![1, 2])).unwrap();
        let result = view.reload(|| Err(ActionError::Rejected("offline".to_string())));
        assert!(result.is_err());
        assert_eq!(view.rows(), &[1, 2]);
    }

    #[test]
    fn test_out_of_order_reloads_keep_newest() {
        let mut view = ListView::new();
        let first = view.begin_reload();
        let second = view.begin_reload();

        // The second reload finishes first
        assert!(view.complete_reload(second, vec!["after both deletes"]));
        // The first reload arrives late and is dropped
        assert!(!view.complete_reload(first, vec!["after first delete"]));

        assert_eq!(view.rows(), &["after both deletes"]);
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut view = ListView::new();
        view.reload(|| Ok(vec![1, 2])).unwrap();
        let notifier = RecordingNotifier::default();
        let mut confirm = ScriptedConfirm::new(false);
        let called = Cell::new(false);

        let outcome = view.delete(
            "material M1",
            &mut confirm,
            &notifier,
            || {
                called.set(true);
                Ok(())
            },
            || Ok(vec![2]),
        );

        assert_eq!(outcome, DeleteOutcome::Cancelled);
        assert!(!called.get());
        assert_eq!(confirm.asked(), 1);
        assert_eq!(view.rows(), &[1, 2]);
    }

    #[test]
    fn test_delete_success_reloads() {
        let mut view = ListView::new();
        view.reload(|| Ok(vec![1, 2])).unwrap();
        let notifier = RecordingNotifier::default();
        let mut confirm = ScriptedConfirm::new(true);

        let outcome = view.delete("welder", &mut confirm, &notifier, || Ok(()), || Ok(vec![2]));

        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert_eq!(view.rows(), &[2]);
        assert_eq!(notifier.successes(), vec!["Deleted welder".to_string()]);
    }

    #[test]
    fn test_delete_failure_leaves_collection() {
        let mut view = ListView::new();
        view.reload(|| Ok(vec![1, 2])).unwrap();
        let notifier = RecordingNotifier::default();
        let mut confirm = ScriptedConfirm::new(true);
        let reloaded = Cell::new(false);

        let outcome = view.delete(
            "client Acme",
            &mut confirm,
            &notifier,
            || Err(ActionError::Rejected("Client still has 2 project(s)".to_string())),
            || {
                reloaded.set(true);
                Ok(vec![])
            },
        );

        assert_eq!(outcome, DeleteOutcome::Failed);
        assert!(!reloaded.get());
        assert_eq!(view.rows(), &[1, 2]);
        assert_eq!(
            notifier.errors(),
            vec!["Client still has 2 project(s)".to_string()]
        );
    }
}
