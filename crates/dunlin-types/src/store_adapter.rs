//! Adapter that persists users, invoices, schedules, templates and the
//! generated follow-up rows.
//!
//! The engine reaches the relational store exclusively through this trait,
//! so any implementation (SQLite, an in-memory fake for tests) can be
//! substituted. Compound mutations (schedule creation with its steps,
//! default reassignment, pending-row replacement) are single methods so an
//! implementation can execute them as one transaction.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::fmt::Debug;

use crate::{
	prelude::*,
	types::{
		serialize_timestamp_iso, serialize_timestamp_iso_opt, FollowUpStatus, InvoiceStatus,
		Patch, StepId,
	},
};

/// A registered user. Owns invoices, schedules and templates.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	pub user_id: UserId,
	pub email: Box<str>,
	pub name: Option<Box<str>>,
	#[serde(serialize_with = "serialize_timestamp_iso")]
	pub created_at: Timestamp,
}

/// A billable amount owed by a client, with reminder bookkeeping.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
	pub invoice_id: InvoiceId,
	pub user_id: UserId,
	pub client_name: Box<str>,
	pub client_email: Box<str>,
	pub invoice_number: Box<str>,
	pub amount: Decimal,
	pub currency: Box<str>,
	pub due_date: NaiveDate,
	pub status: InvoiceStatus,
	/// Free-form notes. Also repurposed as the invoice-link slot for the
	/// `{invoiceLink}` template variable.
	pub notes: Option<Box<str>>,
	/// Explicit schedule assignment. `None` means the user's default applies.
	pub schedule_id: Option<ScheduleId>,
	#[serde(serialize_with = "serialize_timestamp_iso_opt")]
	pub last_reminder_at: Option<Timestamp>,
	pub reminder_count: u32,
	pub reminders_completed: bool,
	pub reminders_enabled: bool,
	pub reminders_paused_reason: Option<Box<str>>,
	#[serde(serialize_with = "serialize_timestamp_iso_opt")]
	pub reminders_reset_at: Option<Timestamp>,
	#[serde(serialize_with = "serialize_timestamp_iso")]
	pub created_at: Timestamp,
	#[serde(serialize_with = "serialize_timestamp_iso")]
	pub updated_at: Timestamp,
}

/// A named, ordered reminder policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
	pub schedule_id: ScheduleId,
	pub user_id: UserId,
	pub name: Box<str>,
	pub is_active: bool,
	pub is_default: bool,
	#[serde(serialize_with = "serialize_timestamp_iso")]
	pub created_at: Timestamp,
	#[serde(serialize_with = "serialize_timestamp_iso")]
	pub updated_at: Timestamp,
}

/// One rung of a schedule: a day offset bound to a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleStep {
	pub step_id: StepId,
	pub schedule_id: ScheduleId,
	/// Days relative to the invoice due date. 0 = due date, positive = after.
	pub day_offset: i32,
	/// Evaluation and display order within the schedule.
	pub position: u32,
	pub template_id: TemplateId,
}

/// A schedule together with its ordered steps.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleWithSteps {
	#[serde(flatten)]
	pub schedule: Schedule,
	pub steps: Vec<ScheduleStep>,
}

/// Reusable email content with `{variable}` placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
	pub template_id: TemplateId,
	pub user_id: UserId,
	pub name: Box<str>,
	pub subject: Box<str>,
	pub body: Box<str>,
	pub is_default: bool,
	#[serde(serialize_with = "serialize_timestamp_iso")]
	pub created_at: Timestamp,
	#[serde(serialize_with = "serialize_timestamp_iso")]
	pub updated_at: Timestamp,
}

/// A generated reminder event, tied to an invoice and a schedule step's
/// template. `Pending` rows are replaced on regeneration; all other
/// statuses are permanent history.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUp {
	pub follow_up_id: FollowUpId,
	pub invoice_id: InvoiceId,
	pub template_id: TemplateId,
	pub scheduled_at: NaiveDate,
	pub subject: Box<str>,
	pub body: Box<str>,
	pub status: FollowUpStatus,
	#[serde(serialize_with = "serialize_timestamp_iso_opt")]
	pub sent_at: Option<Timestamp>,
	pub error: Option<Box<str>>,
	#[serde(serialize_with = "serialize_timestamp_iso")]
	pub created_at: Timestamp,
}

/// Immutable audit record of one send attempt.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailLog {
	pub email_log_id: EmailLogId,
	pub user_id: UserId,
	pub invoice_id: Option<InvoiceId>,
	pub recipient: Box<str>,
	pub subject: Box<str>,
	#[serde(serialize_with = "serialize_timestamp_iso")]
	pub sent_at: Timestamp,
	pub success: bool,
	pub error: Option<Box<str>>,
}

/// Data needed to create a user.
#[derive(Debug)]
pub struct CreateUserData<'a> {
	pub email: &'a str,
	pub name: Option<&'a str>,
}

/// Data needed to create an invoice.
#[derive(Debug)]
pub struct CreateInvoiceData<'a> {
	pub client_name: &'a str,
	pub client_email: &'a str,
	pub invoice_number: &'a str,
	pub amount: Decimal,
	pub currency: &'a str,
	pub due_date: NaiveDate,
	pub notes: Option<&'a str>,
	pub schedule_id: Option<ScheduleId>,
}

/// Partial invoice update.
#[derive(Debug, Default)]
pub struct UpdateInvoiceData {
	pub client_name: Patch<Box<str>>,
	pub client_email: Patch<Box<str>>,
	pub invoice_number: Patch<Box<str>>,
	pub amount: Patch<Decimal>,
	pub currency: Patch<Box<str>>,
	pub due_date: Patch<NaiveDate>,
	pub status: Patch<InvoiceStatus>,
	pub notes: Patch<Box<str>>,
	pub schedule_id: Patch<ScheduleId>,
}

/// Partial update of an invoice's reminder bookkeeping.
#[derive(Debug, Default)]
pub struct ReminderStateUpdate {
	pub last_reminder_at: Patch<Timestamp>,
	pub reminder_count: Patch<u32>,
	pub reminders_completed: Patch<bool>,
	pub reminders_enabled: Patch<bool>,
	pub reminders_paused_reason: Patch<Box<str>>,
	pub reminders_reset_at: Patch<Timestamp>,
}

/// Options for listing invoices.
#[derive(Debug, Default)]
pub struct ListInvoiceOptions {
	pub status: Option<InvoiceStatus>,
	pub schedule_id: Option<ScheduleId>,
}

/// One step of a schedule to be created.
#[derive(Debug, Clone, Copy)]
pub struct CreateStepData {
	pub day_offset: i32,
	pub position: u32,
	pub template_id: TemplateId,
}

/// Data needed to create a schedule with its steps.
///
/// The steps are inserted in the same transaction as the schedule row.
#[derive(Debug)]
pub struct CreateScheduleData<'a> {
	pub name: &'a str,
	pub is_active: bool,
	pub is_default: bool,
	pub steps: &'a [CreateStepData],
}

/// Partial schedule update.
///
/// The default flag is deliberately absent: `set_default_schedule` is the
/// only write path for it.
#[derive(Debug, Default)]
pub struct UpdateScheduleData {
	pub name: Patch<Box<str>>,
	pub is_active: Patch<bool>,
}

/// Data needed to create a template.
#[derive(Debug)]
pub struct CreateTemplateData<'a> {
	pub name: &'a str,
	pub subject: &'a str,
	pub body: &'a str,
	pub is_default: bool,
}

/// Partial template update.
#[derive(Debug, Default)]
pub struct UpdateTemplateData {
	pub name: Patch<Box<str>>,
	pub subject: Patch<Box<str>>,
	pub body: Patch<Box<str>>,
	pub is_default: Patch<bool>,
}

/// One follow-up row to be created by the generator.
#[derive(Debug)]
pub struct CreateFollowUpData<'a> {
	pub template_id: TemplateId,
	pub scheduled_at: NaiveDate,
	pub subject: &'a str,
	pub body: &'a str,
}

/// One email log entry to be appended.
#[derive(Debug)]
pub struct CreateEmailLogData<'a> {
	pub invoice_id: Option<InvoiceId>,
	pub recipient: &'a str,
	pub subject: &'a str,
	pub success: bool,
	pub error: Option<&'a str>,
}

/// A Dunlin store adapter.
///
/// Every implementation persists the entity shapes above and executes the
/// compound operations atomically. Reads of missing rows return
/// [`Error::NotFound`]; driver failures return [`Error::DbError`].
#[async_trait]
pub trait StoreAdapter: Debug + Send + Sync {
	// Users
	//*******
	async fn create_user(&self, data: &CreateUserData<'_>) -> DlResult<User>;
	async fn read_user(&self, user_id: UserId) -> DlResult<User>;

	// Invoices
	//**********
	async fn create_invoice(
		&self,
		user_id: UserId,
		data: &CreateInvoiceData<'_>,
	) -> DlResult<Invoice>;
	async fn read_invoice(&self, invoice_id: InvoiceId) -> DlResult<Invoice>;
	async fn update_invoice(
		&self,
		invoice_id: InvoiceId,
		data: &UpdateInvoiceData,
	) -> DlResult<Invoice>;
	async fn list_invoices(
		&self,
		user_id: UserId,
		opts: &ListInvoiceOptions,
	) -> DlResult<Vec<Invoice>>;
	/// Updates reminder bookkeeping without touching billing fields.
	async fn update_reminder_state(
		&self,
		invoice_id: InvoiceId,
		data: &ReminderStateUpdate,
	) -> DlResult<()>;

	// Schedules
	//***********
	/// Creates a schedule and its steps in one transaction.
	async fn create_schedule(
		&self,
		user_id: UserId,
		data: &CreateScheduleData<'_>,
	) -> DlResult<ScheduleWithSteps>;
	async fn read_schedule(&self, schedule_id: ScheduleId) -> DlResult<Schedule>;
	/// Steps ordered by position.
	async fn read_schedule_steps(&self, schedule_id: ScheduleId) -> DlResult<Vec<ScheduleStep>>;
	async fn list_schedules(&self, user_id: UserId) -> DlResult<Vec<Schedule>>;
	async fn update_schedule(
		&self,
		schedule_id: ScheduleId,
		data: &UpdateScheduleData,
	) -> DlResult<Schedule>;
	/// Replaces the schedule's steps in one transaction.
	async fn replace_schedule_steps(
		&self,
		schedule_id: ScheduleId,
		steps: &[CreateStepData],
	) -> DlResult<Vec<ScheduleStep>>;
	/// Deletes a schedule and its steps. Invoices referencing it fall back
	/// to the user's default schedule on the next regeneration.
	async fn delete_schedule(&self, user_id: UserId, schedule_id: ScheduleId) -> DlResult<()>;
	/// Atomically unsets the default flag on every other schedule of the
	/// user and sets it on the target. Returns `NotFound` if the schedule
	/// does not exist or is not owned by the user.
	async fn set_default_schedule(
		&self,
		user_id: UserId,
		schedule_id: ScheduleId,
	) -> DlResult<Schedule>;
	/// Repair primitive: clears the default flag on every schedule of the
	/// user except `keep`. Returns the number of rows cleared.
	async fn clear_other_defaults(&self, user_id: UserId, keep: ScheduleId) -> DlResult<u32>;

	// Templates
	//***********
	/// Creating a default template unsets the user's other defaults in the
	/// same transaction.
	async fn create_template(
		&self,
		user_id: UserId,
		data: &CreateTemplateData<'_>,
	) -> DlResult<Template>;
	async fn read_template(&self, template_id: TemplateId) -> DlResult<Template>;
	async fn list_templates(&self, user_id: UserId) -> DlResult<Vec<Template>>;
	async fn update_template(
		&self,
		template_id: TemplateId,
		data: &UpdateTemplateData,
	) -> DlResult<Template>;
	async fn delete_template(&self, user_id: UserId, template_id: TemplateId) -> DlResult<()>;

	// Follow-ups
	//************
	async fn list_follow_ups(&self, invoice_id: InvoiceId) -> DlResult<Vec<FollowUp>>;
	/// Deletes the invoice's `Pending` rows and batch-inserts the given
	/// replacements in one transaction. Rows in any other status are left
	/// untouched. Returns the number of rows created.
	async fn replace_pending_follow_ups(
		&self,
		invoice_id: InvoiceId,
		rows: &[CreateFollowUpData<'_>],
	) -> DlResult<u32>;
	/// `Pending` rows scheduled on or before the given date, oldest first.
	async fn list_due_follow_ups(&self, due_on_or_before: NaiveDate) -> DlResult<Vec<FollowUp>>;
	async fn count_pending_follow_ups(&self, invoice_id: InvoiceId) -> DlResult<u32>;
	async fn mark_follow_up_sent(
		&self,
		follow_up_id: FollowUpId,
		sent_at: Timestamp,
	) -> DlResult<()>;
	async fn mark_follow_up_skipped(&self, follow_up_id: FollowUpId) -> DlResult<()>;
	async fn mark_follow_up_failed(&self, follow_up_id: FollowUpId, error: &str) -> DlResult<()>;

	// Email log
	//***********
	async fn create_email_log(
		&self,
		user_id: UserId,
		data: &CreateEmailLogData<'_>,
	) -> DlResult<EmailLog>;
	async fn list_email_logs(&self, user_id: UserId) -> DlResult<Vec<EmailLog>>;
}

// vim: ts=4
