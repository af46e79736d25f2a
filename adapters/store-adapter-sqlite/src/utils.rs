//! Shared utilities for the SQLite adapter
//!
//! Helper functions, the partial-update macro, and error mapping used
//! across all entity modules.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use std::str::FromStr;

use dunlin::prelude::*;
use dunlin::types::{FollowUpStatus, InvoiceStatus};

pub(crate) fn inspect(err: &sqlx::Error) {
	warn!("DB: {:#?}", err);
}

/// Map a single-row query result, translating RowNotFound to NotFound.
pub(crate) fn map_res<T, F>(row: Result<SqliteRow, sqlx::Error>, f: F) -> DlResult<T>
where
	F: FnOnce(&SqliteRow) -> Result<T, sqlx::Error>,
{
	match row {
		Ok(row) => f(&row).inspect_err(inspect).map_err(|_| Error::DbError),
		Err(sqlx::Error::RowNotFound) => Err(Error::NotFound),
		Err(err) => {
			inspect(&err);
			Err(Error::DbError)
		}
	}
}

/// Collect row mapping results, aborting on the first failure.
pub(crate) fn collect_res<T>(
	iter: impl Iterator<Item = Result<T, sqlx::Error>>,
) -> DlResult<Vec<T>> {
	let mut items = Vec::new();
	for item in iter {
		items.push(item.inspect_err(inspect).map_err(|_| Error::DbError)?);
	}
	Ok(items)
}

fn decode_err(msg: String) -> sqlx::Error {
	sqlx::Error::Decode(msg.into())
}

/// Parse an ISO date column (dates are stored as `YYYY-MM-DD` text).
pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, sqlx::Error> {
	NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

/// Parse a decimal amount column (amounts are stored as text to keep full
/// precision).
pub(crate) fn parse_amount(s: &str) -> Result<Decimal, sqlx::Error> {
	Decimal::from_str(s).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

pub(crate) fn parse_invoice_status(s: &str) -> Result<InvoiceStatus, sqlx::Error> {
	InvoiceStatus::parse(s).ok_or_else(|| decode_err(format!("invalid invoice status: {}", s)))
}

pub(crate) fn parse_follow_up_status(s: &str) -> Result<FollowUpStatus, sqlx::Error> {
	FollowUpStatus::parse(s).ok_or_else(|| decode_err(format!("invalid follow-up status: {}", s)))
}

/// Apply a Patch field to a dynamic UPDATE query with proper binding.
/// Returns true if a field was added (for tracking has_updates).
macro_rules! push_patch {
	// For bindable values (strings, numbers, bools) with conversion
	($query:expr, $has_updates:expr, $field:literal, $patch:expr, |$v:ident| $convert:expr) => {{
		match $patch {
			dunlin::types::Patch::Undefined => $has_updates,
			dunlin::types::Patch::Null => {
				if $has_updates {
					$query.push(", ");
				}
				$query.push(concat!($field, "=NULL"));
				true
			}
			dunlin::types::Patch::Value($v) => {
				if $has_updates {
					$query.push(", ");
				}
				$query.push(concat!($field, "=")).push_bind($convert);
				true
			}
		}
	}};
}

pub(crate) use push_patch;

// vim: ts=4
