//! In-memory store fake
//!
//! Implements the full adapter trait over plain vectors behind a mutex.
//! Unlike the SQLite adapter it enforces no uniqueness constraint on the
//! default flag, which lets tests fabricate the inconsistent states the
//! self-healing logic must repair.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Mutex;

use dunlin_types::prelude::*;
use dunlin_types::store_adapter::{
	CreateEmailLogData, CreateFollowUpData, CreateInvoiceData, CreateScheduleData, CreateStepData,
	CreateTemplateData, CreateUserData, EmailLog, FollowUp, Invoice, ListInvoiceOptions,
	ReminderStateUpdate, Schedule, ScheduleStep, ScheduleWithSteps, StoreAdapter, Template,
	UpdateInvoiceData, UpdateScheduleData, UpdateTemplateData, User,
};
use dunlin_types::types::{FollowUpStatus, InvoiceStatus, Patch, StepId};

const BASE_TIME: i64 = 1_700_000_000;

#[derive(Debug, Default)]
struct State {
	next_id: i64,
	clock: i64,
	users: Vec<User>,
	invoices: Vec<Invoice>,
	schedules: Vec<Schedule>,
	steps: Vec<ScheduleStep>,
	templates: Vec<Template>,
	follow_ups: Vec<FollowUp>,
	email_logs: Vec<EmailLog>,
}

impl State {
	fn next_id(&mut self) -> i64 {
		self.next_id += 1;
		self.next_id
	}

	/// Strictly monotonic fake clock so "most recently updated" is
	/// deterministic in tests.
	fn tick(&mut self) -> Timestamp {
		self.clock += 1;
		Timestamp(BASE_TIME + self.clock)
	}
}

#[derive(Debug, Default)]
pub struct MemoryStore {
	state: Mutex<State>,
}

fn apply<T: Clone>(field: &mut T, patch: &Patch<T>) {
	if let Patch::Value(v) = patch {
		*field = v.clone();
	}
}

fn apply_opt<T: Clone>(field: &mut Option<T>, patch: &Patch<T>) {
	match patch {
		Patch::Value(v) => *field = Some(v.clone()),
		Patch::Null => *field = None,
		Patch::Undefined => {}
	}
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, State> {
		self.state.lock().expect("store mutex poisoned")
	}

	/// Test-only backdoor: flag a schedule default without unsetting the
	/// others, fabricating the inconsistent state a race leaves behind.
	pub fn force_default(&self, schedule_id: ScheduleId) {
		let mut state = self.lock();
		let now = state.tick();
		if let Some(s) = state.schedules.iter_mut().find(|s| s.schedule_id == schedule_id) {
			s.is_default = true;
			s.updated_at = now;
		}
	}

	/// Test-only backdoor: bump a schedule's updated_at so it becomes the
	/// most recently touched one.
	pub fn touch_schedule(&self, schedule_id: ScheduleId) {
		let mut state = self.lock();
		let now = state.tick();
		if let Some(s) = state.schedules.iter_mut().find(|s| s.schedule_id == schedule_id) {
			s.updated_at = now;
		}
	}
}

#[async_trait]
impl StoreAdapter for MemoryStore {
	async fn create_user(&self, data: &CreateUserData<'_>) -> DlResult<User> {
		let mut state = self.lock();
		let now = state.tick();
		let user = User {
			user_id: UserId(state.next_id()),
			email: data.email.into(),
			name: data.name.map(Into::into),
			created_at: now,
		};
		state.users.push(user.clone());
		Ok(user)
	}

	async fn read_user(&self, user_id: UserId) -> DlResult<User> {
		self.lock()
			.users
			.iter()
			.find(|u| u.user_id == user_id)
			.cloned()
			.ok_or(Error::NotFound)
	}

	async fn create_invoice(
		&self,
		user_id: UserId,
		data: &CreateInvoiceData<'_>,
	) -> DlResult<Invoice> {
		let mut state = self.lock();
		let now = state.tick();
		let invoice = Invoice {
			invoice_id: InvoiceId(state.next_id()),
			user_id,
			client_name: data.client_name.into(),
			client_email: data.client_email.into(),
			invoice_number: data.invoice_number.into(),
			amount: data.amount,
			currency: data.currency.into(),
			due_date: data.due_date,
			status: InvoiceStatus::Pending,
			notes: data.notes.map(Into::into),
			schedule_id: data.schedule_id,
			last_reminder_at: None,
			reminder_count: 0,
			reminders_completed: false,
			reminders_enabled: true,
			reminders_paused_reason: None,
			reminders_reset_at: None,
			created_at: now,
			updated_at: now,
		};
		state.invoices.push(invoice.clone());
		Ok(invoice)
	}

	async fn read_invoice(&self, invoice_id: InvoiceId) -> DlResult<Invoice> {
		self.lock()
			.invoices
			.iter()
			.find(|i| i.invoice_id == invoice_id)
			.cloned()
			.ok_or(Error::NotFound)
	}

	async fn update_invoice(
		&self,
		invoice_id: InvoiceId,
		data: &UpdateInvoiceData,
	) -> DlResult<Invoice> {
		let mut state = self.lock();
		let now = state.tick();
		let invoice = state
			.invoices
			.iter_mut()
			.find(|i| i.invoice_id == invoice_id)
			.ok_or(Error::NotFound)?;

		apply(&mut invoice.client_name, &data.client_name);
		apply(&mut invoice.client_email, &data.client_email);
		apply(&mut invoice.invoice_number, &data.invoice_number);
		apply(&mut invoice.amount, &data.amount);
		apply(&mut invoice.currency, &data.currency);
		apply(&mut invoice.due_date, &data.due_date);
		apply(&mut invoice.status, &data.status);
		apply_opt(&mut invoice.notes, &data.notes);
		apply_opt(&mut invoice.schedule_id, &data.schedule_id);
		invoice.updated_at = now;

		Ok(invoice.clone())
	}

	async fn list_invoices(
		&self,
		user_id: UserId,
		opts: &ListInvoiceOptions,
	) -> DlResult<Vec<Invoice>> {
		Ok(self
			.lock()
			.invoices
			.iter()
			.filter(|i| i.user_id == user_id)
			.filter(|i| opts.status.is_none_or(|s| i.status == s))
			.filter(|i| opts.schedule_id.is_none_or(|s| i.schedule_id == Some(s)))
			.cloned()
			.collect())
	}

	async fn update_reminder_state(
		&self,
		invoice_id: InvoiceId,
		data: &ReminderStateUpdate,
	) -> DlResult<()> {
		let mut state = self.lock();
		let now = state.tick();
		let invoice = state
			.invoices
			.iter_mut()
			.find(|i| i.invoice_id == invoice_id)
			.ok_or(Error::NotFound)?;

		apply_opt(&mut invoice.last_reminder_at, &data.last_reminder_at);
		apply(&mut invoice.reminder_count, &data.reminder_count);
		apply(&mut invoice.reminders_completed, &data.reminders_completed);
		apply(&mut invoice.reminders_enabled, &data.reminders_enabled);
		apply_opt(&mut invoice.reminders_paused_reason, &data.reminders_paused_reason);
		apply_opt(&mut invoice.reminders_reset_at, &data.reminders_reset_at);
		invoice.updated_at = now;
		Ok(())
	}

	async fn create_schedule(
		&self,
		user_id: UserId,
		data: &CreateScheduleData<'_>,
	) -> DlResult<ScheduleWithSteps> {
		let mut state = self.lock();
		let now = state.tick();
		let schedule = Schedule {
			schedule_id: ScheduleId(state.next_id()),
			user_id,
			name: data.name.into(),
			is_active: data.is_active,
			is_default: data.is_default,
			created_at: now,
			updated_at: now,
		};

		let mut steps = Vec::with_capacity(data.steps.len());
		for step in data.steps {
			let step = ScheduleStep {
				step_id: StepId(state.next_id()),
				schedule_id: schedule.schedule_id,
				day_offset: step.day_offset,
				position: step.position,
				template_id: step.template_id,
			};
			state.steps.push(step.clone());
			steps.push(step);
		}

		state.schedules.push(schedule.clone());
		Ok(ScheduleWithSteps { schedule, steps })
	}

	async fn read_schedule(&self, schedule_id: ScheduleId) -> DlResult<Schedule> {
		self.lock()
			.schedules
			.iter()
			.find(|s| s.schedule_id == schedule_id)
			.cloned()
			.ok_or(Error::NotFound)
	}

	async fn read_schedule_steps(&self, schedule_id: ScheduleId) -> DlResult<Vec<ScheduleStep>> {
		let mut steps: Vec<ScheduleStep> = self
			.lock()
			.steps
			.iter()
			.filter(|s| s.schedule_id == schedule_id)
			.cloned()
			.collect();
		steps.sort_by_key(|s| (s.position, s.step_id));
		Ok(steps)
	}

	async fn list_schedules(&self, user_id: UserId) -> DlResult<Vec<Schedule>> {
		Ok(self.lock().schedules.iter().filter(|s| s.user_id == user_id).cloned().collect())
	}

	async fn update_schedule(
		&self,
		schedule_id: ScheduleId,
		data: &UpdateScheduleData,
	) -> DlResult<Schedule> {
		let mut state = self.lock();
		let now = state.tick();
		let schedule = state
			.schedules
			.iter_mut()
			.find(|s| s.schedule_id == schedule_id)
			.ok_or(Error::NotFound)?;

		apply(&mut schedule.name, &data.name);
		apply(&mut schedule.is_active, &data.is_active);
		schedule.updated_at = now;
		Ok(schedule.clone())
	}

	async fn replace_schedule_steps(
		&self,
		schedule_id: ScheduleId,
		steps: &[CreateStepData],
	) -> DlResult<Vec<ScheduleStep>> {
		let mut state = self.lock();
		let now = state.tick();
		state.steps.retain(|s| s.schedule_id != schedule_id);

		let mut created = Vec::with_capacity(steps.len());
		for step in steps {
			let step = ScheduleStep {
				step_id: StepId(state.next_id()),
				schedule_id,
				day_offset: step.day_offset,
				position: step.position,
				template_id: step.template_id,
			};
			state.steps.push(step.clone());
			created.push(step);
		}

		if let Some(s) = state.schedules.iter_mut().find(|s| s.schedule_id == schedule_id) {
			s.updated_at = now;
		}
		Ok(created)
	}

	async fn delete_schedule(&self, user_id: UserId, schedule_id: ScheduleId) -> DlResult<()> {
		let mut state = self.lock();
		let before = state.schedules.len();
		state
			.schedules
			.retain(|s| !(s.schedule_id == schedule_id && s.user_id == user_id));
		if state.schedules.len() == before {
			return Err(Error::NotFound);
		}
		state.steps.retain(|s| s.schedule_id != schedule_id);
		for invoice in state.invoices.iter_mut() {
			if invoice.schedule_id == Some(schedule_id) {
				invoice.schedule_id = None;
			}
		}
		Ok(())
	}

	async fn set_default_schedule(
		&self,
		user_id: UserId,
		schedule_id: ScheduleId,
	) -> DlResult<Schedule> {
		let mut state = self.lock();
		let now = state.tick();

		if !state
			.schedules
			.iter()
			.any(|s| s.schedule_id == schedule_id && s.user_id == user_id)
		{
			return Err(Error::NotFound);
		}

		for schedule in state.schedules.iter_mut().filter(|s| s.user_id == user_id) {
			schedule.is_default = schedule.schedule_id == schedule_id;
			if schedule.is_default {
				schedule.updated_at = now;
			}
		}

		state
			.schedules
			.iter()
			.find(|s| s.schedule_id == schedule_id)
			.cloned()
			.ok_or(Error::NotFound)
	}

	async fn clear_other_defaults(&self, user_id: UserId, keep: ScheduleId) -> DlResult<u32> {
		let mut state = self.lock();
		let mut cleared = 0;
		for schedule in state.schedules.iter_mut() {
			if schedule.user_id == user_id
				&& schedule.is_default
				&& schedule.schedule_id != keep
			{
				schedule.is_default = false;
				cleared += 1;
			}
		}
		Ok(cleared)
	}

	async fn create_template(
		&self,
		user_id: UserId,
		data: &CreateTemplateData<'_>,
	) -> DlResult<Template> {
		let mut state = self.lock();
		let now = state.tick();

		if data.is_default {
			for template in state.templates.iter_mut().filter(|t| t.user_id == user_id) {
				template.is_default = false;
			}
		}

		let template = Template {
			template_id: TemplateId(state.next_id()),
			user_id,
			name: data.name.into(),
			subject: data.subject.into(),
			body: data.body.into(),
			is_default: data.is_default,
			created_at: now,
			updated_at: now,
		};
		state.templates.push(template.clone());
		Ok(template)
	}

	async fn read_template(&self, template_id: TemplateId) -> DlResult<Template> {
		self.lock()
			.templates
			.iter()
			.find(|t| t.template_id == template_id)
			.cloned()
			.ok_or(Error::NotFound)
	}

	async fn list_templates(&self, user_id: UserId) -> DlResult<Vec<Template>> {
		Ok(self.lock().templates.iter().filter(|t| t.user_id == user_id).cloned().collect())
	}

	async fn update_template(
		&self,
		template_id: TemplateId,
		data: &UpdateTemplateData,
	) -> DlResult<Template> {
		let mut state = self.lock();
		let now = state.tick();

		let user_id = state
			.templates
			.iter()
			.find(|t| t.template_id == template_id)
			.map(|t| t.user_id)
			.ok_or(Error::NotFound)?;

		if let Patch::Value(true) = data.is_default {
			for template in state.templates.iter_mut().filter(|t| t.user_id == user_id) {
				template.is_default = false;
			}
		}

		let template = state
			.templates
			.iter_mut()
			.find(|t| t.template_id == template_id)
			.ok_or(Error::NotFound)?;

		apply(&mut template.name, &data.name);
		apply(&mut template.subject, &data.subject);
		apply(&mut template.body, &data.body);
		apply(&mut template.is_default, &data.is_default);
		template.updated_at = now;
		Ok(template.clone())
	}

	async fn delete_template(&self, user_id: UserId, template_id: TemplateId) -> DlResult<()> {
		let mut state = self.lock();
		let before = state.templates.len();
		state
			.templates
			.retain(|t| !(t.template_id == template_id && t.user_id == user_id));
		if state.templates.len() == before {
			return Err(Error::NotFound);
		}
		Ok(())
	}

	async fn list_follow_ups(&self, invoice_id: InvoiceId) -> DlResult<Vec<FollowUp>> {
		let mut rows: Vec<FollowUp> = self
			.lock()
			.follow_ups
			.iter()
			.filter(|f| f.invoice_id == invoice_id)
			.cloned()
			.collect();
		rows.sort_by_key(|f| (f.scheduled_at, f.follow_up_id));
		Ok(rows)
	}

	async fn replace_pending_follow_ups(
		&self,
		invoice_id: InvoiceId,
		rows: &[CreateFollowUpData<'_>],
	) -> DlResult<u32> {
		let mut state = self.lock();
		let now = state.tick();
		state
			.follow_ups
			.retain(|f| !(f.invoice_id == invoice_id && f.status == FollowUpStatus::Pending));

		for row in rows {
			let follow_up = FollowUp {
				follow_up_id: FollowUpId(state.next_id()),
				invoice_id,
				template_id: row.template_id,
				scheduled_at: row.scheduled_at,
				subject: row.subject.into(),
				body: row.body.into(),
				status: FollowUpStatus::Pending,
				sent_at: None,
				error: None,
				created_at: now,
			};
			state.follow_ups.push(follow_up);
		}

		Ok(rows.len() as u32)
	}

	async fn list_due_follow_ups(&self, due_on_or_before: NaiveDate) -> DlResult<Vec<FollowUp>> {
		let mut rows: Vec<FollowUp> = self
			.lock()
			.follow_ups
			.iter()
			.filter(|f| f.status == FollowUpStatus::Pending && f.scheduled_at <= due_on_or_before)
			.cloned()
			.collect();
		rows.sort_by_key(|f| (f.scheduled_at, f.follow_up_id));
		Ok(rows)
	}

	async fn count_pending_follow_ups(&self, invoice_id: InvoiceId) -> DlResult<u32> {
		Ok(self
			.lock()
			.follow_ups
			.iter()
			.filter(|f| f.invoice_id == invoice_id && f.status == FollowUpStatus::Pending)
			.count() as u32)
	}

	async fn mark_follow_up_sent(
		&self,
		follow_up_id: FollowUpId,
		sent_at: Timestamp,
	) -> DlResult<()> {
		let mut state = self.lock();
		let row = state
			.follow_ups
			.iter_mut()
			.find(|f| f.follow_up_id == follow_up_id && f.status == FollowUpStatus::Pending)
			.ok_or(Error::NotFound)?;
		row.status = FollowUpStatus::Sent;
		row.sent_at = Some(sent_at);
		row.error = None;
		Ok(())
	}

	async fn mark_follow_up_skipped(&self, follow_up_id: FollowUpId) -> DlResult<()> {
		let mut state = self.lock();
		let row = state
			.follow_ups
			.iter_mut()
			.find(|f| f.follow_up_id == follow_up_id && f.status == FollowUpStatus::Pending)
			.ok_or(Error::NotFound)?;
		row.status = FollowUpStatus::Skipped;
		Ok(())
	}

	async fn mark_follow_up_failed(&self, follow_up_id: FollowUpId, error: &str) -> DlResult<()> {
		let mut state = self.lock();
		let row = state
			.follow_ups
			.iter_mut()
			.find(|f| f.follow_up_id == follow_up_id && f.status == FollowUpStatus::Pending)
			.ok_or(Error::NotFound)?;
		row.status = FollowUpStatus::Failed;
		row.error = Some(error.into());
		Ok(())
	}

	async fn create_email_log(
		&self,
		user_id: UserId,
		data: &CreateEmailLogData<'_>,
	) -> DlResult<EmailLog> {
		let mut state = self.lock();
		let now = state.tick();
		let log = EmailLog {
			email_log_id: EmailLogId(state.next_id()),
			user_id,
			invoice_id: data.invoice_id,
			recipient: data.recipient.into(),
			subject: data.subject.into(),
			sent_at: now,
			success: data.success,
			error: data.error.map(Into::into),
		};
		state.email_logs.push(log.clone());
		Ok(log)
	}

	async fn list_email_logs(&self, user_id: UserId) -> DlResult<Vec<EmailLog>> {
		Ok(self.lock().email_logs.iter().filter(|l| l.user_id == user_id).cloned().collect())
	}
}

// vim: ts=4
