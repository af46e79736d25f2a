//! Dispatch of due follow-ups
//!
//! One pass: list `Pending` rows due on or before a date, deliver each,
//! record the outcome. Rows whose invoice is no longer eligible (paid,
//! cancelled, reminders disabled, invoice gone) are marked skipped rather
//! than sent. Per-row failures never abort the pass.

use chrono::NaiveDate;
use std::sync::Arc;

use crate::prelude::*;
use crate::{MailTransport, OutgoingEmail};
use dunlin_types::store_adapter::{CreateEmailLogData, FollowUp, ReminderStateUpdate};
use dunlin_types::types::{InvoiceStatus, Patch};

/// Outcome counts of one dispatch pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DispatchSummary {
	pub sent: u32,
	pub skipped: u32,
	pub failed: u32,
}

enum Outcome {
	Sent,
	Skipped,
	Failed,
}

/// Consumes due follow-up rows and delivers them.
#[derive(Debug)]
pub struct Dispatcher {
	store: Arc<dyn StoreAdapter>,
	transport: Arc<dyn MailTransport>,
}

impl Dispatcher {
	pub fn new(store: Arc<dyn StoreAdapter>, transport: Arc<dyn MailTransport>) -> Self {
		Self { store, transport }
	}

	/// Deliver every `Pending` follow-up due on or before `today`.
	///
	/// Store errors while listing propagate; per-row errors are counted as
	/// failures and the pass continues.
	pub async fn run_once(&self, today: NaiveDate) -> DlResult<DispatchSummary> {
		let due = self.store.list_due_follow_ups(today).await?;
		info!("Dispatching {} due follow-up(s)", due.len());

		let mut summary = DispatchSummary::default();
		for row in due {
			match self.dispatch_row(&row).await {
				Ok(Outcome::Sent) => summary.sent += 1,
				Ok(Outcome::Skipped) => summary.skipped += 1,
				Ok(Outcome::Failed) => summary.failed += 1,
				Err(err) => {
					warn!("Dispatch of follow-up {} errored: {}", row.follow_up_id, err);
					summary.failed += 1;
				}
			}
		}

		Ok(summary)
	}

	async fn dispatch_row(&self, row: &FollowUp) -> DlResult<Outcome> {
		let invoice = match self.store.read_invoice(row.invoice_id).await {
			Ok(invoice) => invoice,
			Err(Error::NotFound) => {
				warn!("Invoice {} gone, skipping follow-up {}", row.invoice_id, row.follow_up_id);
				self.store.mark_follow_up_skipped(row.follow_up_id).await?;
				return Ok(Outcome::Skipped);
			}
			Err(err) => return Err(err),
		};

		if invoice.status != InvoiceStatus::Pending || !invoice.reminders_enabled {
			debug!(
				"Invoice {} not eligible ({}, reminders_enabled={}), skipping follow-up {}",
				invoice.invoice_id,
				invoice.status.as_str(),
				invoice.reminders_enabled,
				row.follow_up_id
			);
			self.store.mark_follow_up_skipped(row.follow_up_id).await?;
			return Ok(Outcome::Skipped);
		}

		let email = OutgoingEmail {
			to: invoice.client_email.to_string(),
			subject: row.subject.to_string(),
			body: row.body.to_string(),
		};

		match self.transport.send(&email).await {
			Ok(()) => {
				let now = Timestamp::now();
				self.store.mark_follow_up_sent(row.follow_up_id, now).await?;
				self.store
					.create_email_log(
						invoice.user_id,
						&CreateEmailLogData {
							invoice_id: Some(invoice.invoice_id),
							recipient: &email.to,
							subject: &email.subject,
							success: true,
							error: None,
						},
					)
					.await?;

				let remaining = self.store.count_pending_follow_ups(row.invoice_id).await?;
				self.store
					.update_reminder_state(
						row.invoice_id,
						&ReminderStateUpdate {
							last_reminder_at: Patch::Value(now),
							reminders_completed: Patch::Value(remaining == 0),
							..Default::default()
						},
					)
					.await?;

				Ok(Outcome::Sent)
			}
			Err(err) => {
				let reason = err.to_string();
				warn!("Delivery of follow-up {} failed: {}", row.follow_up_id, reason);
				self.store.mark_follow_up_failed(row.follow_up_id, &reason).await?;
				self.store
					.create_email_log(
						invoice.user_id,
						&CreateEmailLogData {
							invoice_id: Some(invoice.invoice_id),
							recipient: &email.to,
							subject: &email.subject,
							success: false,
							error: Some(&reason),
						},
					)
					.await?;
				Ok(Outcome::Failed)
			}
		}
	}
}

// vim: ts=4
