//! Create/edit modal: a form bound to at most one record at a time

use thiserror::Error;

use crate::actions::ActionResult;
use crate::core::entity::Entity;
use crate::core::identity::EntityId;
use crate::views::{report_failure, Notifier};

/// Client-side validation failure; no action is invoked
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("Please select a {0} first")]
    SelectFirst(&'static str),

    #[error("{0}")]
    Invalid(String),
}

/// Editable field state for one entity type
pub trait Form: Sized {
    type Record: Entity;

    /// Empty form for creating a new record
    fn blank() -> Self;

    /// Form pre-populated from an existing record
    fn from_record(record: &Self::Record) -> Self;

    /// Required-field and selection checks
    fn validate(&self) -> Result<(), FormError>;

    /// State after a successful submit
    fn reset_after_success(&mut self) {
        *self = Self::blank();
    }
}

/// Outcome of a submit
#[derive(Debug)]
pub enum Submitted<T> {
    /// Validation failed before any action ran
    Invalid(FormError),
    /// The action failed; the form keeps the entered values
    Failed,
    Saved(T),
}

/// A modal holding one form, keyed by the identity of the record it edits
#[derive(Debug)]
pub struct Modal<F: Form> {
    form: F,
    keyed_to: Option<EntityId>,
}

impl<F: Form> Default for Modal<F> {
    fn default() -> Self {
        Self::create()
    }
}

impl<F: Form> Modal<F> {
    /// A modal for creating a new record
    pub fn create() -> Self {
        Self {
            form: F::blank(),
            keyed_to: None,
        }
    }

    /// Point the modal at `record`. Switching to a different record rebuilds
    /// the form so no field of the previous record survives.
    pub fn edit(&mut self, record: &F::Record) {
        if self.keyed_to.as_ref() != Some(record.id()) {
            self.form = F::from_record(record);
            self.keyed_to = Some(record.id().clone());
        }
    }

    /// A modal already pointed at `record`
    pub fn editing(record: &F::Record) -> Self {
        Self {
            form: F::from_record(record),
            keyed_to: Some(record.id().clone()),
        }
    }

    pub fn keyed_to(&self) -> Option<&EntityId> {
        self.keyed_to.as_ref()
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut F {
        &mut self.form
    }

    /// Validate, run `action`, then notify.
    ///
    /// Taking `&mut self` means a second submit cannot start while one is in
    /// flight. On success the form is reset; on failure it is left intact.
    pub fn submit<T>(
        &mut self,
        notifier: &dyn Notifier,
        action: impl FnOnce(&F) -> ActionResult<T>,
        success_message: impl FnOnce(&T) -> String,
    ) -> Submitted<T> {
        if let Err(e) = self.form.validate() {
            notifier.error(&e.to_string());
            return Submitted::Invalid(e);
        }

        match action(&self.form) {
            Ok(value) => {
                notifier.success(&success_message(&value));
                self.form.reset_after_success();
                self.keyed_to = None;
                Submitted::Saved(value)
            }
            Err(e) => {
                report_failure(notifier, &e);
                Submitted::Failed
            }
        }
    }
}
