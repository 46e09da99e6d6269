//! View layer - list state, modals, forms, filters and stat cards
//!
//! Nothing in here touches the terminal. Output goes through [`Notifier`] and
//! interactive yes/no questions through [`Confirm`], so the CLI supplies
//! console implementations and tests supply recording ones.

pub mod filter;
pub mod forms;
pub mod list;
pub mod modal;
pub mod stats;

pub use filter::{FilterRow, MaterialFilter};
pub use list::{DeleteOutcome, ListView, ReloadTicket};
pub use modal::{Form, FormError, Modal, Submitted};
pub use stats::{StatCard, Tone};

use crate::actions::ActionError;

/// Transient user notifications ("toasts")
pub trait Notifier {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn info(&self, message: &str);
}

/// A blocking yes/no question
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Surface a failed action: business rejections verbatim, anything
/// unexpected as a generic message with the details in the developer log
pub fn report_failure(notifier: &dyn Notifier, error: &ActionError) {
    if error.is_unexpected() {
        tracing::error!(error = %error, "action failed");
    }
    notifier.error(&error.user_message());
}

#[cfg(test)]
pub mod testing {
    use std::cell::RefCell;

    use super::{Confirm, Notifier};

    /// Records every notification
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        successes: RefCell<Vec<String>>,
        errors: RefCell<Vec<String>>,
        infos: RefCell<Vec<String>>,
    }

    impl RecordingNotifier {
        pub fn successes(&self) -> Vec<String> {
            self.successes.borrow().clone()
        }

        pub fn errors(&self) -> Vec<String> {
            self.errors.borrow().clone()
        }

        pub fn infos(&self) -> Vec<String> {
            self.infos.borrow().clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn success(&self, message: &str) {
            self.successes.borrow_mut().push(message.to_string());
        }

        fn error(&self, message: &str) {
            self.errors.borrow_mut().push(message.to_string());
        }

        fn info(&self, message: &str) {
            self.infos.borrow_mut().push(message.to_string());
        }
    }

    /// Answers every prompt the same way and counts the questions
    #[derive(Debug)]
    pub struct ScriptedConfirm {
        answer: bool,
        asked: usize,
    }

    impl ScriptedConfirm {
        pub fn new(answer: bool) -> Self {
            Self { answer, asked: 0 }
        }

        pub fn asked(&self) -> usize {
            self.asked
        }
    }

    impl Confirm for ScriptedConfirm {
        fn confirm(&mut self, _prompt: &str) -> bool {
            self.asked += 1;
            self.answer
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingNotifier;
    use super::*;
    use crate::actions::GENERIC_FAILURE;

    #[test]
    fn test_unexpected_failures_are_generic() {
        let notifier = RecordingNotifier::default();
        report_failure(
            &notifier,
            &ActionError::Database(rusqlite::Error::InvalidQuery),
        );
        report_failure(&notifier, &ActionError::rejected("WPS-1 already exists"));
        assert_eq!(
            notifier.errors(),
            vec![GENERIC_FAILURE.to_string(), "WPS-1 already exists".to_string()]
        );
    }
}
