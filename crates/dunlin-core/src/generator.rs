//! Follow-up generation: turning an invoice and a schedule into dated,
//! rendered reminder rows.
//!
//! Regeneration replaces only rows still in `Pending` state; consumed rows
//! (sent, failed, skipped) are permanent history and are never touched.

use chrono::{Duration, NaiveDate};

use crate::bootstrap::ensure_default_schedule;
use crate::prelude::*;
use crate::render::render;
use crate::vars::invoice_vars;
use dunlin_types::store_adapter::{
	CreateFollowUpData, Invoice, ListInvoiceOptions, ReminderStateUpdate, ScheduleWithSteps,
};
use dunlin_types::types::{InvoiceStatus, Patch};

/// Outcome of [`regenerate_all`]: how many invoices were processed and
/// which ones failed. Failures are isolated per invoice so one bad row
/// cannot starve the rest of a user's invoices.
#[derive(Debug, Default)]
pub struct RegenerateSummary {
	pub invoices: u32,
	pub follow_ups: u32,
	pub errors: Vec<(InvoiceId, Error)>,
}

/// Generate the pending follow-up set for an invoice.
///
/// Silently no-ops (returning 0) unless the invoice status is exactly
/// `Pending` - paid, cancelled and explicitly-overdue invoices never get
/// reminders regenerated through this path.
///
/// Schedule resolution order: the explicit `schedule_id` argument, else the
/// invoice's persisted assignment, else the user's default (bootstrapped if
/// absent). An explicit or persisted schedule that is missing, inactive or
/// owned by another user falls back to the default instead of erroring.
///
/// Returns the number of `Pending` rows created.
pub async fn generate_follow_ups(
	store: &dyn StoreAdapter,
	invoice_id: InvoiceId,
	schedule_id: Option<ScheduleId>,
) -> DlResult<u32> {
	let invoice = store.read_invoice(invoice_id).await?;

	if invoice.status != InvoiceStatus::Pending {
		debug!(
			"Invoice {} is {}, skipping follow-up generation",
			invoice_id,
			invoice.status.as_str()
		);
		return Ok(0);
	}

	let schedule = resolve_schedule(store, &invoice, schedule_id).await?;
	if schedule.steps.is_empty() {
		warn!(
			"Schedule {} has no steps, no follow-ups generated for invoice {}",
			schedule.schedule.schedule_id, invoice_id
		);
		return Ok(0);
	}

	// Render everything up front; the replace below is one transaction.
	let mut prepared = Vec::with_capacity(schedule.steps.len());
	for step in &schedule.steps {
		let template = match store.read_template(step.template_id).await {
			Ok(template) => template,
			Err(Error::NotFound) => {
				warn!(
					"Template {} referenced by step {} no longer exists, step skipped",
					step.template_id, step.step_id
				);
				continue;
			}
			Err(err) => return Err(err),
		};

		let scheduled_at = shift_date(invoice.due_date, step.day_offset);
		let vars = invoice_vars(&invoice, step.day_offset);
		prepared.push((
			step.template_id,
			scheduled_at,
			render(&template.subject, &vars),
			render(&template.body, &vars),
		));
	}

	if prepared.is_empty() {
		warn!(
			"No usable steps remain on schedule {}, invoice {} left untouched",
			schedule.schedule.schedule_id, invoice_id
		);
		return Ok(0);
	}

	let rows: Vec<CreateFollowUpData<'_>> = prepared
		.iter()
		.map(|(template_id, scheduled_at, subject, body)| CreateFollowUpData {
			template_id: *template_id,
			scheduled_at: *scheduled_at,
			subject,
			body,
		})
		.collect();

	let created = store.replace_pending_follow_ups(invoice_id, &rows).await?;

	store
		.update_reminder_state(
			invoice_id,
			&ReminderStateUpdate {
				reminder_count: Patch::Value(created),
				reminders_completed: Patch::Value(false),
				..Default::default()
			},
		)
		.await?;

	info!("Generated {} follow-up(s) for invoice {}", created, invoice_id);
	Ok(created)
}

/// Regenerate follow-ups for an invoice from its current schedule
/// assignment (or the user default).
pub async fn regenerate_for_invoice(
	store: &dyn StoreAdapter,
	invoice_id: InvoiceId,
) -> DlResult<u32> {
	generate_follow_ups(store, invoice_id, None).await
}

/// Regenerate follow-ups for every `Pending` invoice of a user.
///
/// Used after schedule edits so dependent invoices reflect the new plan.
/// Per-invoice errors are collected, not propagated.
pub async fn regenerate_all(
	store: &dyn StoreAdapter,
	user_id: UserId,
) -> DlResult<RegenerateSummary> {
	let invoices = store
		.list_invoices(
			user_id,
			&ListInvoiceOptions { status: Some(InvoiceStatus::Pending), ..Default::default() },
		)
		.await?;

	let mut summary = RegenerateSummary::default();
	for invoice in invoices {
		match generate_follow_ups(store, invoice.invoice_id, None).await {
			Ok(count) => {
				summary.invoices += 1;
				summary.follow_ups += count;
			}
			Err(err) => {
				warn!(
					"Follow-up regeneration failed for invoice {}: {}",
					invoice.invoice_id, err
				);
				summary.errors.push((invoice.invoice_id, err));
			}
		}
	}

	Ok(summary)
}

/// Restart reminders for an invoice after a due-date change.
///
/// The decision to restart (rather than only moving the date) belongs to
/// the calling layer; this helper executes it: reminder state is reset and
/// the pending set regenerated.
pub async fn restart_reminders(store: &dyn StoreAdapter, invoice_id: InvoiceId) -> DlResult<u32> {
	store
		.update_reminder_state(
			invoice_id,
			&ReminderStateUpdate {
				reminders_enabled: Patch::Value(true),
				reminders_completed: Patch::Value(false),
				reminders_paused_reason: Patch::Null,
				reminders_reset_at: Patch::Value(Timestamp::now()),
				..Default::default()
			},
		)
		.await?;

	generate_follow_ups(store, invoice_id, None).await
}

/// Resolve the effective schedule for an invoice.
async fn resolve_schedule(
	store: &dyn StoreAdapter,
	invoice: &Invoice,
	explicit: Option<ScheduleId>,
) -> DlResult<ScheduleWithSteps> {
	let requested = explicit.or(invoice.schedule_id);

	if let Some(schedule_id) = requested {
		match store.read_schedule(schedule_id).await {
			Ok(schedule) if schedule.user_id == invoice.user_id && schedule.is_active => {
				let steps = store.read_schedule_steps(schedule_id).await?;
				return Ok(ScheduleWithSteps { schedule, steps });
			}
			Ok(_) => {
				warn!(
					"Schedule {} is inactive or not owned by user {}, using default",
					schedule_id, invoice.user_id
				);
			}
			Err(Error::NotFound) => {
				warn!("Schedule {} no longer exists, using default", schedule_id);
			}
			Err(err) => return Err(err),
		}
	}

	ensure_default_schedule(store, invoice.user_id).await
}

/// Shift a due date by a whole number of calendar days.
///
/// Dates carry no time of day, so the arithmetic cannot drift across DST
/// transitions the way naive local-time addition does.
fn shift_date(due_date: NaiveDate, day_offset: i32) -> NaiveDate {
	due_date
		.checked_add_signed(Duration::days(i64::from(day_offset)))
		.unwrap_or(due_date)
}


// vim: ts=4
