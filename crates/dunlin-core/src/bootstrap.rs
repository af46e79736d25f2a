//! Lazy, idempotent creation of a user's default templates and schedule.
//!
//! Every user is guaranteed a default, active, multi-step schedule the
//! first time one is needed. The logic is a small state machine over the
//! user's schedule set and also repairs inconsistent states (several
//! schedules flagged default) left behind by races or partial failures.

use crate::prelude::*;
use dunlin_types::store_adapter::{
	CreateScheduleData, CreateStepData, CreateTemplateData, ScheduleWithSteps, Template,
};

/// Fixed copy for one baseline template.
struct BaselineTemplate {
	name: &'static str,
	subject: &'static str,
	body: &'static str,
}

/// Name of the schedule created for users who have none.
pub const STANDARD_SCHEDULE_NAME: &str = "Standard Payment Reminder";

pub const FRIENDLY_TEMPLATE_NAME: &str = "Friendly Reminder";
pub const NEUTRAL_TEMPLATE_NAME: &str = "Neutral Follow-up";
pub const FIRM_TEMPLATE_NAME: &str = "Firm Reminder";

const BASELINE_TEMPLATES: [BaselineTemplate; 3] = [
	BaselineTemplate {
		name: FRIENDLY_TEMPLATE_NAME,
		subject: "Friendly reminder: invoice {invoiceNumber}",
		body: "Hi {clientName},\n\n\
			Just a friendly note that invoice {invoiceNumber} for {amount} is due on \
			{dueDate}.\n\n\
			{invoiceLink}\n\n\
			If you have already sent payment, please disregard this message.\n\n\
			Thank you!",
	},
	BaselineTemplate {
		name: NEUTRAL_TEMPLATE_NAME,
		subject: "Payment reminder: invoice {invoiceNumber}",
		body: "Hi {clientName},\n\n\
			This is a reminder that invoice {invoiceNumber} for {amount} was due on \
			{dueDate} and is now {daysOverdue} days overdue.\n\n\
			{invoiceLink}\n\n\
			Please arrange payment at your earliest convenience.\n\n\
			Thank you.",
	},
	BaselineTemplate {
		name: FIRM_TEMPLATE_NAME,
		subject: "Overdue notice: invoice {invoiceNumber}",
		body: "Dear {clientName},\n\n\
			Invoice {invoiceNumber} for {amount} ({currency}) is now {daysOverdue} days \
			past its due date of {dueDate}.\n\n\
			{invoiceLink}\n\n\
			Please settle the outstanding balance promptly, or contact us to discuss \
			payment.\n\n\
			Regards.",
	},
];

/// Day offsets and template bindings of the standard schedule.
const STANDARD_STEPS: [(i32, &str); 3] = [
	(0, FRIENDLY_TEMPLATE_NAME),
	(3, NEUTRAL_TEMPLATE_NAME),
	(7, FIRM_TEMPLATE_NAME),
];

/// Ensure the three baseline templates exist for a user.
///
/// Templates already present (matched by name) are left untouched. If the
/// user has no default template, the first newly created baseline becomes
/// the default; an existing default flag is never overwritten. Returns the
/// baseline templates in their canonical order.
pub async fn ensure_default_templates(
	store: &dyn StoreAdapter,
	user_id: UserId,
) -> DlResult<Vec<Template>> {
	let existing = store.list_templates(user_id).await?;
	let mut have_default = existing.iter().any(|t| t.is_default);

	let mut baseline = Vec::with_capacity(BASELINE_TEMPLATES.len());
	for def in &BASELINE_TEMPLATES {
		if let Some(t) = existing.iter().find(|t| &*t.name == def.name) {
			baseline.push(t.clone());
			continue;
		}

		let template = store
			.create_template(
				user_id,
				&CreateTemplateData {
					name: def.name,
					subject: def.subject,
					body: def.body,
					is_default: !have_default,
				},
			)
			.await?;
		if !have_default {
			info!("Created default template '{}' for user {}", def.name, user_id);
		}
		have_default = true;
		baseline.push(template);
	}

	Ok(baseline)
}

/// Ensure the user has exactly one default schedule, returning it with its
/// steps.
///
/// State machine over the user's schedule set:
/// 1. no schedules: create the standard schedule (and baseline templates)
/// 2. schedules but no default: promote the most recently updated active
///    one; with no active schedule, create the standard schedule
/// 3. several defaults: keep the most recently updated, clear the rest
/// 4. exactly one default: return it
///
/// Idempotent; safe to call on every invoice creation.
pub async fn ensure_default_schedule(
	store: &dyn StoreAdapter,
	user_id: UserId,
) -> DlResult<ScheduleWithSteps> {
	let schedules = store.list_schedules(user_id).await?;
	let mut defaults: Vec<_> = schedules.iter().filter(|s| s.is_default).collect();

	if defaults.len() == 1 {
		let schedule = defaults.remove(0).clone();
		let steps = store.read_schedule_steps(schedule.schedule_id).await?;
		return Ok(ScheduleWithSteps { schedule, steps });
	}

	if defaults.len() > 1 {
		// Races or retries can leave several defaults behind; keep the one
		// touched last and clear the rest.
		let keep = defaults
			.iter()
			.max_by_key(|s| (s.updated_at, s.schedule_id))
			.map(|s| s.schedule_id)
			.ok_or(Error::NotFound)?;
		let cleared = store.clear_other_defaults(user_id, keep).await?;
		warn!(
			"Repaired {} duplicate default schedule(s) for user {}, kept schedule {}",
			cleared, user_id, keep
		);
		let schedule = store.read_schedule(keep).await?;
		let steps = store.read_schedule_steps(keep).await?;
		return Ok(ScheduleWithSteps { schedule, steps });
	}

	// No default. Prefer promoting the most recently updated active
	// schedule before creating anything new.
	if let Some(candidate) = schedules
		.iter()
		.filter(|s| s.is_active)
		.max_by_key(|s| (s.updated_at, s.schedule_id))
	{
		let schedule = store.set_default_schedule(user_id, candidate.schedule_id).await?;
		info!(
			"Promoted schedule {} to default for user {}",
			schedule.schedule_id, user_id
		);
		let steps = store.read_schedule_steps(schedule.schedule_id).await?;
		return Ok(ScheduleWithSteps { schedule, steps });
	}

	create_standard_schedule(store, user_id).await
}

/// Create the "Standard Payment Reminder" schedule with its three steps,
/// bootstrapping the baseline templates first.
async fn create_standard_schedule(
	store: &dyn StoreAdapter,
	user_id: UserId,
) -> DlResult<ScheduleWithSteps> {
	let templates = ensure_default_templates(store, user_id).await?;

	let mut steps = Vec::with_capacity(STANDARD_STEPS.len());
	for (position, (day_offset, template_name)) in STANDARD_STEPS.iter().enumerate() {
		let template = templates
			.iter()
			.find(|t| &*t.name == *template_name)
			.ok_or_else(|| {
				Error::ValidationError(format!("baseline template '{}' missing", template_name))
			})?;
		steps.push(CreateStepData {
			day_offset: *day_offset,
			position: position as u32 + 1,
			template_id: template.template_id,
		});
	}

	let data = CreateScheduleData {
		name: STANDARD_SCHEDULE_NAME,
		is_active: true,
		is_default: true,
		steps: &steps,
	};

	match store.create_schedule(user_id, &data).await {
		Ok(schedule) => {
			info!("Created standard schedule for user {}", user_id);
			Ok(schedule)
		}
		Err(err) => {
			// A concurrent bootstrap may have won the race (the store's
			// default-uniqueness constraint rejects the second insert).
			// Take the winner's schedule if one appeared.
			let schedules = store.list_schedules(user_id).await?;
			if let Some(winner) = schedules.into_iter().find(|s| s.is_default) {
				warn!("Lost bootstrap race for user {}, using schedule {}", user_id, winner.schedule_id);
				let steps = store.read_schedule_steps(winner.schedule_id).await?;
				return Ok(ScheduleWithSteps { schedule: winner, steps });
			}
			Err(err)
		}
	}
}

// vim: ts=4
