//! Actions - the typed boundary every command goes through to read or write
//! the store
//!
//! Grouped by domain:
//! - [`client`] - clients and projects
//! - [`master`] - materials, welders, inspectors, WPS, drawings
//! - [`qc`] - ITPs, inspections, NCRs, evidence
//! - [`mdr`] - discipline MDR reports
//! - [`dashboard`] - cross-collection aggregates
//!
//! Every action returns [`ActionResult`]. Nothing is retried.

pub mod client;
pub mod dashboard;
pub mod master;
pub mod mdr;
pub mod qc;

use rusqlite::ErrorCode;
use serde::Serialize;
use thiserror::Error;

use crate::core::entity::Entity;
use crate::core::identity::EntityId;
use crate::store::Store;

/// Message shown for failures whose details are for developers only
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Errors returned by actions
#[derive(Debug, Error)]
pub enum ActionError {
    /// A business rule refused the request; the message is shown verbatim
    #[error("{0}")]
    Rejected(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ActionError {
    pub fn rejected(message: impl Into<String>) -> Self {
        ActionError::Rejected(message.into())
    }

    pub fn not_found<E: Entity>(id: impl ToString) -> Self {
        ActionError::NotFound {
            kind: E::NAME,
            id: id.to_string(),
        }
    }

    /// Database and I/O failures are unexpected; everything else is an
    /// answer the user can act on
    pub fn is_unexpected(&self) -> bool {
        matches!(self, ActionError::Database(_) | ActionError::Io(_))
    }

    /// The message safe to show the user
    pub fn user_message(&self) -> String {
        if self.is_unexpected() {
            GENERIC_FAILURE.to_string()
        } else {
            self.to_string()
        }
    }

    /// Map a constraint violation to a rejection with `message`
    pub fn on_constraint(self, message: impl FnOnce() -> String) -> Self {
        match self {
            ActionError::Database(ref e)
                if e.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) =>
            {
                tracing::debug!(error = %e, "constraint violation");
                ActionError::Rejected(message())
            }
            other => other,
        }
    }
}

pub type ActionResult<T> = Result<T, ActionError>;

/// The serialisable `{ success, message?, data? }` reply of a mutation
#[derive(Debug, Serialize)]
pub struct ActionReply<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ActionReply<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// A created record together with its short ID
#[derive(Debug, Clone, Serialize)]
pub struct Created<E> {
    pub short_id: String,
    #[serde(flatten)]
    pub record: E,
}

/// Resolve a user reference (short ID, full ID or unique prefix)
pub fn resolve<E: Entity>(store: &Store, reference: &str) -> ActionResult<EntityId> {
    store
        .resolve::<E>(reference)?
        .ok_or_else(|| ActionError::not_found::<E>(reference))
}

/// Resolve an optional reference
pub fn resolve_opt<E: Entity>(store: &Store, reference: Option<&str>) -> ActionResult<Option<EntityId>> {
    reference
        .filter(|r| !r.trim().is_empty())
        .map(|r| resolve::<E>(store, r))
        .transpose()
}

/// Fetch one record or fail with `NotFound`
pub fn fetch<E: Entity>(store: &Store, id: &EntityId) -> ActionResult<E> {
    store
        .get::<E>(id)?
        .ok_or_else(|| ActionError::not_found::<E>(id))
}

/// Reference data for a select: every record of `E` as `(id, "SHORT  title")`,
/// fetched fresh on each call
pub fn options<E: Entity>(store: &Store) -> ActionResult<Vec<(EntityId, String)>> {
    store
        .all::<E>()?
        .into_iter()
        .map(|record| {
            let short = store.display_id(record.id())?;
            Ok((record.id().clone(), format!("{}  {}", short, record.title())))
        })
        .collect()
}

/// Fail with `Rejected` unless `id` exists in `E`'s table
pub(crate) fn require<E: Entity>(store: &Store, id: &EntityId) -> ActionResult<()> {
    if store.get::<E>(id)?.is_none() {
        return Err(ActionError::rejected(format!(
            "Selected {} no longer exists",
            E::NAME
        )));
    }
    Ok(())
}

pub(crate) fn insert<E: Entity>(store: &Store, record: E) -> ActionResult<Created<E>> {
    let short_id = store.insert(&record)?;
    Ok(Created { short_id, record })
}

pub(crate) fn update<E: Entity>(store: &Store, record: &E) -> ActionResult<()> {
    if !store.update(record)? {
        return Err(ActionError::not_found::<E>(record.id()));
    }
    Ok(())
}

pub(crate) fn delete<E: Entity>(
    store: &Store,
    id: &EntityId,
    in_use: impl FnOnce() -> String,
) -> ActionResult<()> {
    let deleted = store
        .delete::<E>(id)
        .map_err(ActionError::from)
        .map_err(|e| e.on_constraint(in_use))?;
    if !deleted {
        return Err(ActionError::not_found::<E>(id));
    }
    Ok(())
}

/// Trim a required text field, rejecting blanks
pub(crate) fn required(field: &str, value: &str) -> ActionResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ActionError::rejected(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_errors_are_hidden() {
        let err = ActionError::Database(rusqlite::Error::QueryReturnedNoRows);
        assert!(err.is_unexpected());
        assert_eq!(err.user_message(), GENERIC_FAILURE);

        let err = ActionError::rejected("NCR number already exists");
        assert!(!err.is_unexpected());
        assert_eq!(err.user_message(), "NCR number already exists");
    }

    #[test]
    fn test_reply_serialization() {
        let reply = ActionReply::ok("Saved", 42);
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], 42);

        let reply: ActionReply<()> = ActionReply::failed("No");
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["success"], false);
        assert!(json.get("data").is_none());
    }
}
