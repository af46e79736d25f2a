//! Precondition checks protecting the "exactly one default schedule"
//! invariant.
//!
//! The `can_*` guards never fail: they return a structured allow/deny
//! decision for the calling layer to surface to the user. Changing which
//! schedule is default goes through [`set_default_schedule`], the single
//! sanctioned write path for the flag.

use serde::Serialize;
use serde_with::skip_serializing_none;

use crate::prelude::*;
use dunlin_types::store_adapter::Schedule;

/// Allow/deny result of a guard check.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardDecision {
	pub allowed: bool,
	pub reason: Option<String>,
}

impl GuardDecision {
	pub fn allow() -> Self {
		Self { allowed: true, reason: None }
	}

	pub fn deny(reason: impl Into<String>) -> Self {
		Self { allowed: false, reason: Some(reason.into()) }
	}
}

/// May the schedule be deleted?
///
/// Denied while it is the user's only schedule, or the default among
/// several. Store failures surface as a deny, never as an error.
pub async fn can_delete_schedule(
	store: &dyn StoreAdapter,
	user_id: UserId,
	schedule_id: ScheduleId,
) -> GuardDecision {
	let schedules = match store.list_schedules(user_id).await {
		Ok(schedules) => schedules,
		Err(err) => return GuardDecision::deny(format!("could not load schedules: {}", err)),
	};

	let Some(target) = schedules.iter().find(|s| s.schedule_id == schedule_id) else {
		return GuardDecision::deny("schedule not found");
	};

	if schedules.len() == 1 {
		return GuardDecision::deny("cannot delete the only schedule");
	}
	if target.is_default {
		return GuardDecision::deny(
			"this schedule is the default; set another schedule as default first",
		);
	}

	GuardDecision::allow()
}

/// May the schedule be deactivated?
///
/// Denied while it is the default (a default schedule must stay active so
/// follow-up generation always has a usable fallback). A non-default
/// schedule may always be deactivated.
pub async fn can_deactivate_schedule(
	store: &dyn StoreAdapter,
	user_id: UserId,
	schedule_id: ScheduleId,
) -> GuardDecision {
	let schedules = match store.list_schedules(user_id).await {
		Ok(schedules) => schedules,
		Err(err) => return GuardDecision::deny(format!("could not load schedules: {}", err)),
	};

	let Some(target) = schedules.iter().find(|s| s.schedule_id == schedule_id) else {
		return GuardDecision::deny("schedule not found");
	};

	if target.is_default {
		return GuardDecision::deny(
			"the default schedule cannot be deactivated; make another schedule the default first",
		);
	}

	GuardDecision::allow()
}

/// Make a schedule the user's default.
///
/// Verifies ownership and the active flag, then atomically unsets the flag
/// on every other schedule and sets it on the target. This is the only
/// write path for the default flag, so two schedules can never end up
/// flagged simultaneously.
pub async fn set_default_schedule(
	store: &dyn StoreAdapter,
	user_id: UserId,
	schedule_id: ScheduleId,
) -> DlResult<Schedule> {
	let schedule = store.read_schedule(schedule_id).await?;

	if schedule.user_id != user_id {
		return Err(Error::PermissionDenied(format!(
			"schedule {} does not belong to user {}",
			schedule_id, user_id
		)));
	}
	if !schedule.is_active {
		return Err(Error::ValidationError(
			"an inactive schedule cannot be made the default".to_string(),
		));
	}

	let updated = store.set_default_schedule(user_id, schedule_id).await?;
	info!("Schedule {} is now the default for user {}", schedule_id, user_id);
	Ok(updated)
}

// vim: ts=4
