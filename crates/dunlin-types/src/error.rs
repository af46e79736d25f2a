//! Error type shared by the engine and the store adapters.

use std::fmt;

/// Result alias used throughout the workspace.
pub type DlResult<T> = Result<T, Error>;

/// Errors surfaced by the engine and the store adapters.
///
/// Store adapters log the underlying driver error before collapsing it to
/// `DbError`, so the variant itself stays cheap to match on and carries no
/// driver-specific payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
	/// The referenced entity does not exist, or is not visible to the caller.
	NotFound,
	/// The underlying store failed. Details are logged at the adapter layer.
	DbError,
	/// Input or entity state failed validation.
	ValidationError(String),
	/// The caller does not own the referenced entity.
	PermissionDenied(String),
	/// Outbound mail delivery failed.
	MailError(String),
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Error::NotFound => write!(f, "not found"),
			Error::DbError => write!(f, "database error"),
			Error::ValidationError(msg) => write!(f, "validation error: {}", msg),
			Error::PermissionDenied(msg) => write!(f, "permission denied: {}", msg),
			Error::MailError(msg) => write!(f, "mail delivery failed: {}", msg),
		}
	}
}

impl std::error::Error for Error {}

// vim: ts=4
