//! SQLite-backed store adapter for Dunlin.
//!
//! Implements [`StoreAdapter`] on top of sqlx with a WAL-journaled SQLite
//! database. One module per entity family; compound operations run as
//! single transactions.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{self, SqlitePool};
use std::path::Path;

use dunlin::prelude::*;
use dunlin::store_adapter::{
	CreateEmailLogData, CreateFollowUpData, CreateInvoiceData, CreateScheduleData, CreateStepData,
	CreateTemplateData, CreateUserData, EmailLog, FollowUp, Invoice, ListInvoiceOptions,
	ReminderStateUpdate, Schedule, ScheduleStep, ScheduleWithSteps, StoreAdapter, Template,
	UpdateInvoiceData, UpdateScheduleData, UpdateTemplateData, User,
};

mod email_log;
mod follow_up;
mod invoice;
mod schedule;
mod schema;
mod template;
mod user;
mod utils;

use schema::init_db;

#[derive(Debug)]
pub struct StoreAdapterSqlite {
	db: SqlitePool,
}

impl StoreAdapterSqlite {
	/// Open (or create) the database file and initialize the schema.
	pub async fn new(path: impl AsRef<Path>) -> DlResult<Self> {
		if let Some(parent) = path.as_ref().parent() {
			if !parent.as_os_str().is_empty() {
				tokio::fs::create_dir_all(parent).await.map_err(|_| Error::DbError)?;
			}
		}

		let opts = sqlite::SqliteConnectOptions::new()
			.filename(path.as_ref())
			.create_if_missing(true)
			.journal_mode(sqlite::SqliteJournalMode::Wal);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts)
			.await
			.inspect_err(|err| warn!("DbError: {:#?}", err))
			.or(Err(Error::DbError))?;

		init_db(&db)
			.await
			.inspect_err(|err| warn!("DbError: {:#?}", err))
			.or(Err(Error::DbError))?;

		Ok(Self { db })
	}
}

#[async_trait]
impl StoreAdapter for StoreAdapterSqlite {
	// Users
	//*******
	async fn create_user(&self, data: &CreateUserData<'_>) -> DlResult<User> {
		user::create(&self.db, data).await
	}

	async fn read_user(&self, user_id: UserId) -> DlResult<User> {
		user::read(&self.db, user_id).await
	}

	// Invoices
	//**********
	async fn create_invoice(
		&self,
		user_id: UserId,
		data: &CreateInvoiceData<'_>,
	) -> DlResult<Invoice> {
		invoice::create(&self.db, user_id, data).await
	}

	async fn read_invoice(&self, invoice_id: InvoiceId) -> DlResult<Invoice> {
		invoice::read(&self.db, invoice_id).await
	}

	async fn update_invoice(
		&self,
		invoice_id: InvoiceId,
		data: &UpdateInvoiceData,
	) -> DlResult<Invoice> {
		invoice::update(&self.db, invoice_id, data).await
	}

	async fn list_invoices(
		&self,
		user_id: UserId,
		opts: &ListInvoiceOptions,
	) -> DlResult<Vec<Invoice>> {
		invoice::list(&self.db, user_id, opts).await
	}

	async fn update_reminder_state(
		&self,
		invoice_id: InvoiceId,
		data: &ReminderStateUpdate,
	) -> DlResult<()> {
		invoice::update_reminder_state(&self.db, invoice_id, data).await
	}

	// Schedules
	//***********
	async fn create_schedule(
		&self,
		user_id: UserId,
		data: &CreateScheduleData<'_>,
	) -> DlResult<ScheduleWithSteps> {
		schedule::create(&self.db, user_id, data).await
	}

	async fn read_schedule(&self, schedule_id: ScheduleId) -> DlResult<Schedule> {
		schedule::read(&self.db, schedule_id).await
	}

	async fn read_schedule_steps(&self, schedule_id: ScheduleId) -> DlResult<Vec<ScheduleStep>> {
		schedule::read_steps(&self.db, schedule_id).await
	}

	async fn list_schedules(&self, user_id: UserId) -> DlResult<Vec<Schedule>> {
		schedule::list(&self.db, user_id).await
	}

	async fn update_schedule(
		&self,
		schedule_id: ScheduleId,
		data: &UpdateScheduleData,
	) -> DlResult<Schedule> {
		schedule::update(&self.db, schedule_id, data).await
	}

	async fn replace_schedule_steps(
		&self,
		schedule_id: ScheduleId,
		steps: &[CreateStepData],
	) -> DlResult<Vec<ScheduleStep>> {
		schedule::replace_steps(&self.db, schedule_id, steps).await
	}

	async fn delete_schedule(&self, user_id: UserId, schedule_id: ScheduleId) -> DlResult<()> {
		schedule::delete(&self.db, user_id, schedule_id).await
	}

	async fn set_default_schedule(
		&self,
		user_id: UserId,
		schedule_id: ScheduleId,
	) -> DlResult<Schedule> {
		schedule::set_default(&self.db, user_id, schedule_id).await
	}

	async fn clear_other_defaults(&self, user_id: UserId, keep: ScheduleId) -> DlResult<u32> {
		schedule::clear_other_defaults(&self.db, user_id, keep).await
	}

	// Templates
	//***********
	async fn create_template(
		&self,
		user_id: UserId,
		data: &CreateTemplateData<'_>,
	) -> DlResult<Template> {
		template::create(&self.db, user_id, data).await
	}

	async fn read_template(&self, template_id: TemplateId) -> DlResult<Template> {
		template::read(&self.db, template_id).await
	}

	async fn list_templates(&self, user_id: UserId) -> DlResult<Vec<Template>> {
		template::list(&self.db, user_id).await
	}

	async fn update_template(
		&self,
		template_id: TemplateId,
		data: &UpdateTemplateData,
	) -> DlResult<Template> {
		template::update(&self.db, template_id, data).await
	}

	async fn delete_template(&self, user_id: UserId, template_id: TemplateId) -> DlResult<()> {
		template::delete(&self.db, user_id, template_id).await
	}

	// Follow-ups
	//************
	async fn list_follow_ups(&self, invoice_id: InvoiceId) -> DlResult<Vec<FollowUp>> {
		follow_up::list(&self.db, invoice_id).await
	}

	async fn replace_pending_follow_ups(
		&self,
		invoice_id: InvoiceId,
		rows: &[CreateFollowUpData<'_>],
	) -> DlResult<u32> {
		follow_up::replace_pending(&self.db, invoice_id, rows).await
	}

	async fn list_due_follow_ups(&self, due_on_or_before: NaiveDate) -> DlResult<Vec<FollowUp>> {
		follow_up::list_due(&self.db, due_on_or_before).await
	}

	async fn count_pending_follow_ups(&self, invoice_id: InvoiceId) -> DlResult<u32> {
		follow_up::count_pending(&self.db, invoice_id).await
	}

	async fn mark_follow_up_sent(
		&self,
		follow_up_id: FollowUpId,
		sent_at: Timestamp,
	) -> DlResult<()> {
		follow_up::mark_sent(&self.db, follow_up_id, sent_at).await
	}

	async fn mark_follow_up_skipped(&self, follow_up_id: FollowUpId) -> DlResult<()> {
		follow_up::mark_skipped(&self.db, follow_up_id).await
	}

	async fn mark_follow_up_failed(&self, follow_up_id: FollowUpId, error: &str) -> DlResult<()> {
		follow_up::mark_failed(&self.db, follow_up_id, error).await
	}

	// Email log
	//***********
	async fn create_email_log(
		&self,
		user_id: UserId,
		data: &CreateEmailLogData<'_>,
	) -> DlResult<EmailLog> {
		email_log::create(&self.db, user_id, data).await
	}

	async fn list_email_logs(&self, user_id: UserId) -> DlResult<Vec<EmailLog>> {
		email_log::list(&self.db, user_id).await
	}
}

// vim: ts=4
