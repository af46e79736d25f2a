//! Core identifier and value types shared across the workspace.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

macro_rules! id_type {
	($(#[$doc:meta])* $name:ident) => {
		$(#[$doc])*
		#[derive(
			Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
		)]
		#[serde(transparent)]
		pub struct $name(pub i64);

		impl std::fmt::Display for $name {
			fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
				write!(f, "{}", self.0)
			}
		}
	};
}

id_type!(
	/// Identifies a user (the owner of invoices, schedules and templates).
	UserId
);
id_type!(
	/// Identifies an invoice.
	InvoiceId
);
id_type!(
	/// Identifies a reminder schedule.
	ScheduleId
);
id_type!(
	/// Identifies one step of a schedule.
	StepId
);
id_type!(
	/// Identifies an email template.
	TemplateId
);
id_type!(
	/// Identifies a generated follow-up row.
	FollowUpId
);
id_type!(
	/// Identifies an email log entry.
	EmailLogId
);

/// Unix timestamp in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
	pub fn now() -> Self {
		Self(Utc::now().timestamp())
	}
}

/// Serialize a timestamp as an ISO-8601 string (falls back to the raw
/// integer for values outside the representable range).
pub fn serialize_timestamp_iso<S: Serializer>(
	ts: &Timestamp,
	ser: S,
) -> Result<S::Ok, S::Error> {
	match DateTime::<Utc>::from_timestamp(ts.0, 0) {
		Some(dt) => ser.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Secs, true)),
		None => ser.serialize_i64(ts.0),
	}
}

/// Serialize an optional timestamp as an ISO-8601 string.
pub fn serialize_timestamp_iso_opt<S: Serializer>(
	ts: &Option<Timestamp>,
	ser: S,
) -> Result<S::Ok, S::Error> {
	match ts {
		Some(ts) => serialize_timestamp_iso(ts, ser),
		None => ser.serialize_none(),
	}
}

/// Invoice lifecycle status.
///
/// `Overdue` is an explicitly assigned status, distinct from "past due but
/// still `Pending`" which is a display-only condition computed elsewhere.
/// Follow-up generation only ever proceeds on `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
	Pending,
	Paid,
	Overdue,
	Cancelled,
}

impl InvoiceStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			InvoiceStatus::Pending => "PENDING",
			InvoiceStatus::Paid => "PAID",
			InvoiceStatus::Overdue => "OVERDUE",
			InvoiceStatus::Cancelled => "CANCELLED",
		}
	}

	pub fn parse(s: &str) -> Option<Self> {
		match s {
			"PENDING" => Some(InvoiceStatus::Pending),
			"PAID" => Some(InvoiceStatus::Paid),
			"OVERDUE" => Some(InvoiceStatus::Overdue),
			"CANCELLED" => Some(InvoiceStatus::Cancelled),
			_ => None,
		}
	}
}

/// Follow-up row status. `Pending` rows are the only ones the generator ever
/// deletes; everything else is permanent history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FollowUpStatus {
	Pending,
	Sent,
	Skipped,
	Failed,
}

impl FollowUpStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			FollowUpStatus::Pending => "PENDING",
			FollowUpStatus::Sent => "SENT",
			FollowUpStatus::Skipped => "SKIPPED",
			FollowUpStatus::Failed => "FAILED",
		}
	}

	pub fn parse(s: &str) -> Option<Self> {
		match s {
			"PENDING" => Some(FollowUpStatus::Pending),
			"SENT" => Some(FollowUpStatus::Sent),
			"SKIPPED" => Some(FollowUpStatus::Skipped),
			"FAILED" => Some(FollowUpStatus::Failed),
			_ => None,
		}
	}
}

/// Three-state patch value for partial updates.
///
/// Distinguishes a field that is absent from the payload (`Undefined`, leave
/// unchanged) from one explicitly set to null (`Null`, clear it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Patch<T> {
	Undefined,
	Null,
	Value(T),
}

impl<T> Default for Patch<T> {
	fn default() -> Self {
		Patch::Undefined
	}
}

impl<T> Patch<T> {
	pub fn is_undefined(&self) -> bool {
		matches!(self, Patch::Undefined)
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Patch::Null)
	}

	pub fn is_value(&self) -> bool {
		matches!(self, Patch::Value(_))
	}

	pub fn value(&self) -> Option<&T> {
		match self {
			Patch::Value(v) => Some(v),
			_ => None,
		}
	}

	/// `None` = leave unchanged, `Some(None)` = clear, `Some(Some(v))` = set.
	pub fn as_option(&self) -> Option<Option<&T>> {
		match self {
			Patch::Undefined => None,
			Patch::Null => Some(None),
			Patch::Value(v) => Some(Some(v)),
		}
	}

	pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
		match self {
			Patch::Undefined => Patch::Undefined,
			Patch::Null => Patch::Null,
			Patch::Value(v) => Patch::Value(f(v)),
		}
	}
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
	fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		// A missing field never reaches this point (serde uses Default),
		// so a bare null always means an explicit clear.
		Ok(match Option::<T>::deserialize(deserializer)? {
			Some(v) => Patch::Value(v),
			None => Patch::Null,
		})
	}
}

impl<T: Serialize> Serialize for Patch<T> {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			Patch::Value(v) => serializer.serialize_some(v),
			_ => serializer.serialize_none(),
		}
	}
}


// vim: ts=4
