//! Email log persistence
//!
//! Append-only audit records of actual send attempts; consumed for display.

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::utils::*;
use dunlin::prelude::*;
use dunlin::store_adapter::{CreateEmailLogData, EmailLog};

fn map_email_log(row: &SqliteRow) -> Result<EmailLog, sqlx::Error> {
	Ok(EmailLog {
		email_log_id: EmailLogId(row.try_get("email_log_id")?),
		user_id: UserId(row.try_get("user_id")?),
		invoice_id: row.try_get::<Option<i64>, _>("invoice_id")?.map(InvoiceId),
		recipient: row.try_get("recipient")?,
		subject: row.try_get("subject")?,
		sent_at: row.try_get("sent_at").map(Timestamp)?,
		success: row.try_get("success")?,
		error: row.try_get("error")?,
	})
}

pub(crate) async fn create(
	db: &SqlitePool,
	user_id: UserId,
	data: &CreateEmailLogData<'_>,
) -> DlResult<EmailLog> {
	let res = sqlx::query(
		"INSERT INTO email_logs (user_id, invoice_id, recipient, subject, success, error)
		VALUES (?, ?, ?, ?, ?, ?) RETURNING *",
	)
	.bind(user_id.0)
	.bind(data.invoice_id.map(|i| i.0))
	.bind(data.recipient)
	.bind(data.subject)
	.bind(data.success)
	.bind(data.error)
	.fetch_one(db)
	.await;

	map_res(res, map_email_log)
}

pub(crate) async fn list(db: &SqlitePool, user_id: UserId) -> DlResult<Vec<EmailLog>> {
	let rows = sqlx::query(
		"SELECT * FROM email_logs WHERE user_id = ? ORDER BY email_log_id DESC",
	)
	.bind(user_id.0)
	.fetch_all(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	collect_res(rows.iter().map(map_email_log))
}

// vim: ts=4
