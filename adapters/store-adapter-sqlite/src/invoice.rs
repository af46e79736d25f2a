//! Invoice persistence
//!
//! Amounts are stored as text to keep decimal precision; due dates as
//! `YYYY-MM-DD` text, which also makes range comparisons lexicographic.

use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, SqlitePool};

use crate::utils::*;
use dunlin::prelude::*;
use dunlin::store_adapter::{
	CreateInvoiceData, Invoice, ListInvoiceOptions, ReminderStateUpdate, UpdateInvoiceData,
};

pub(crate) fn map_invoice(row: &SqliteRow) -> Result<Invoice, sqlx::Error> {
	Ok(Invoice {
		invoice_id: InvoiceId(row.try_get("invoice_id")?),
		user_id: UserId(row.try_get("user_id")?),
		client_name: row.try_get("client_name")?,
		client_email: row.try_get("client_email")?,
		invoice_number: row.try_get("invoice_number")?,
		amount: parse_amount(row.try_get("amount")?)?,
		currency: row.try_get("currency")?,
		due_date: parse_date(row.try_get("due_date")?)?,
		status: parse_invoice_status(row.try_get("status")?)?,
		notes: row.try_get("notes")?,
		schedule_id: row.try_get::<Option<i64>, _>("schedule_id")?.map(ScheduleId),
		last_reminder_at: row.try_get::<Option<i64>, _>("last_reminder_at")?.map(Timestamp),
		reminder_count: row.try_get("reminder_count")?,
		reminders_completed: row.try_get("reminders_completed")?,
		reminders_enabled: row.try_get("reminders_enabled")?,
		reminders_paused_reason: row.try_get("reminders_paused_reason")?,
		reminders_reset_at: row.try_get::<Option<i64>, _>("reminders_reset_at")?.map(Timestamp),
		created_at: row.try_get("created_at").map(Timestamp)?,
		updated_at: row.try_get("updated_at").map(Timestamp)?,
	})
}

pub(crate) async fn create(
	db: &SqlitePool,
	user_id: UserId,
	data: &CreateInvoiceData<'_>,
) -> DlResult<Invoice> {
	let res = sqlx::query(
		"INSERT INTO invoices
			(user_id, client_name, client_email, invoice_number, amount, currency,
			due_date, notes, schedule_id)
		VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
		RETURNING *",
	)
	.bind(user_id.0)
	.bind(data.client_name)
	.bind(data.client_email)
	.bind(data.invoice_number)
	.bind(data.amount.to_string())
	.bind(data.currency)
	.bind(data.due_date.to_string())
	.bind(data.notes)
	.bind(data.schedule_id.map(|s| s.0))
	.fetch_one(db)
	.await;

	map_res(res, map_invoice)
}

pub(crate) async fn read(db: &SqlitePool, invoice_id: InvoiceId) -> DlResult<Invoice> {
	let res = sqlx::query("SELECT * FROM invoices WHERE invoice_id = ?")
		.bind(invoice_id.0)
		.fetch_one(db)
		.await;

	map_res(res, map_invoice)
}

pub(crate) async fn update(
	db: &SqlitePool,
	invoice_id: InvoiceId,
	data: &UpdateInvoiceData,
) -> DlResult<Invoice> {
	let mut query = QueryBuilder::new("UPDATE invoices SET ");
	let mut has = false;

	has = push_patch!(query, has, "client_name", &data.client_name, |v| &**v);
	has = push_patch!(query, has, "client_email", &data.client_email, |v| &**v);
	has = push_patch!(query, has, "invoice_number", &data.invoice_number, |v| &**v);
	has = push_patch!(query, has, "amount", &data.amount, |v| v.to_string());
	has = push_patch!(query, has, "currency", &data.currency, |v| &**v);
	has = push_patch!(query, has, "due_date", &data.due_date, |v| v.to_string());
	has = push_patch!(query, has, "status", &data.status, |v| v.as_str());
	has = push_patch!(query, has, "notes", &data.notes, |v| &**v);
	has = push_patch!(query, has, "schedule_id", &data.schedule_id, |v| v.0);

	if has {
		query.push(", updated_at=unixepoch() WHERE invoice_id=").push_bind(invoice_id.0);
		query
			.build()
			.execute(db)
			.await
			.inspect_err(inspect)
			.map_err(|_| Error::DbError)?;
	}

	read(db, invoice_id).await
}

pub(crate) async fn list(
	db: &SqlitePool,
	user_id: UserId,
	opts: &ListInvoiceOptions,
) -> DlResult<Vec<Invoice>> {
	let mut query = QueryBuilder::new("SELECT * FROM invoices WHERE user_id=");
	query.push_bind(user_id.0);
	if let Some(status) = opts.status {
		query.push(" AND status=").push_bind(status.as_str());
	}
	if let Some(schedule_id) = opts.schedule_id {
		query.push(" AND schedule_id=").push_bind(schedule_id.0);
	}
	query.push(" ORDER BY invoice_id");

	let rows = query
		.build()
		.fetch_all(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	collect_res(rows.iter().map(map_invoice))
}

pub(crate) async fn update_reminder_state(
	db: &SqlitePool,
	invoice_id: InvoiceId,
	data: &ReminderStateUpdate,
) -> DlResult<()> {
	let mut query = QueryBuilder::new("UPDATE invoices SET ");
	let mut has = false;

	has = push_patch!(query, has, "last_reminder_at", &data.last_reminder_at, |v| v.0);
	has = push_patch!(query, has, "reminder_count", &data.reminder_count, |v| i64::from(*v));
	has = push_patch!(query, has, "reminders_completed", &data.reminders_completed, |v| *v);
	has = push_patch!(query, has, "reminders_enabled", &data.reminders_enabled, |v| *v);
	has = push_patch!(
		query, has, "reminders_paused_reason", &data.reminders_paused_reason, |v| &**v
	);
	has = push_patch!(query, has, "reminders_reset_at", &data.reminders_reset_at, |v| v.0);

	if !has {
		return Ok(());
	}

	query.push(", updated_at=unixepoch() WHERE invoice_id=").push_bind(invoice_id.0);
	let res = query
		.build()
		.execute(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}
	Ok(())
}

// vim: ts=4
