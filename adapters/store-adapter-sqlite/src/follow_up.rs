//! Follow-up row persistence
//!
//! Pending rows are the generator's working set and get replaced wholesale;
//! rows in any other status are permanent history and are never touched.

use chrono::NaiveDate;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::utils::*;
use dunlin::prelude::*;
use dunlin::store_adapter::{CreateFollowUpData, FollowUp};
use dunlin::types::FollowUpStatus;

fn map_follow_up(row: &SqliteRow) -> Result<FollowUp, sqlx::Error> {
	Ok(FollowUp {
		follow_up_id: FollowUpId(row.try_get("follow_up_id")?),
		invoice_id: InvoiceId(row.try_get("invoice_id")?),
		template_id: TemplateId(row.try_get("template_id")?),
		scheduled_at: parse_date(row.try_get("scheduled_at")?)?,
		subject: row.try_get("subject")?,
		body: row.try_get("body")?,
		status: parse_follow_up_status(row.try_get("status")?)?,
		sent_at: row.try_get::<Option<i64>, _>("sent_at")?.map(Timestamp),
		error: row.try_get("error")?,
		created_at: row.try_get("created_at").map(Timestamp)?,
	})
}

pub(crate) async fn list(db: &SqlitePool, invoice_id: InvoiceId) -> DlResult<Vec<FollowUp>> {
	let rows = sqlx::query(
		"SELECT * FROM follow_ups WHERE invoice_id = ? ORDER BY scheduled_at, follow_up_id",
	)
	.bind(invoice_id.0)
	.fetch_all(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	collect_res(rows.iter().map(map_follow_up))
}

pub(crate) async fn replace_pending(
	db: &SqlitePool,
	invoice_id: InvoiceId,
	rows: &[CreateFollowUpData<'_>],
) -> DlResult<u32> {
	let mut tx = db.begin().await.map_err(|_| Error::DbError)?;

	sqlx::query("DELETE FROM follow_ups WHERE invoice_id = ? AND status = ?")
		.bind(invoice_id.0)
		.bind(FollowUpStatus::Pending.as_str())
		.execute(&mut *tx)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	for row in rows {
		sqlx::query(
			"INSERT INTO follow_ups (invoice_id, template_id, scheduled_at, subject, body)
			VALUES (?, ?, ?, ?, ?)",
		)
		.bind(invoice_id.0)
		.bind(row.template_id.0)
		.bind(row.scheduled_at.to_string())
		.bind(row.subject)
		.bind(row.body)
		.execute(&mut *tx)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;
	}

	tx.commit().await.map_err(|_| Error::DbError)?;

	Ok(rows.len() as u32)
}

pub(crate) async fn list_due(
	db: &SqlitePool,
	due_on_or_before: NaiveDate,
) -> DlResult<Vec<FollowUp>> {
	let rows = sqlx::query(
		"SELECT * FROM follow_ups WHERE status = ? AND scheduled_at <= ?
		ORDER BY scheduled_at, follow_up_id",
	)
	.bind(FollowUpStatus::Pending.as_str())
	.bind(due_on_or_before.to_string())
	.fetch_all(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	collect_res(rows.iter().map(map_follow_up))
}

pub(crate) async fn count_pending(db: &SqlitePool, invoice_id: InvoiceId) -> DlResult<u32> {
	let count: i64 = sqlx::query_scalar(
		"SELECT COUNT(*) FROM follow_ups WHERE invoice_id = ? AND status = ?",
	)
	.bind(invoice_id.0)
	.bind(FollowUpStatus::Pending.as_str())
	.fetch_one(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	Ok(count as u32)
}

/// Transition a pending row. Affecting zero rows means the row is gone or
/// was already consumed, reported as NotFound.
async fn transition<'q>(
	db: &SqlitePool,
	follow_up_id: FollowUpId,
	query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
) -> DlResult<()> {
	let res = query
		.execute(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	if res.rows_affected() == 0 {
		warn!("Follow-up {} not in PENDING state, transition skipped", follow_up_id);
		return Err(Error::NotFound);
	}
	Ok(())
}

pub(crate) async fn mark_sent(
	db: &SqlitePool,
	follow_up_id: FollowUpId,
	sent_at: Timestamp,
) -> DlResult<()> {
	let query = sqlx::query(
		"UPDATE follow_ups SET status='SENT', sent_at = ?, error=NULL
		WHERE follow_up_id = ? AND status='PENDING'",
	)
	.bind(sent_at.0)
	.bind(follow_up_id.0);

	transition(db, follow_up_id, query).await
}

pub(crate) async fn mark_skipped(db: &SqlitePool, follow_up_id: FollowUpId) -> DlResult<()> {
	let query = sqlx::query(
		"UPDATE follow_ups SET status='SKIPPED' WHERE follow_up_id = ? AND status='PENDING'",
	)
	.bind(follow_up_id.0);

	transition(db, follow_up_id, query).await
}

pub(crate) async fn mark_failed(
	db: &SqlitePool,
	follow_up_id: FollowUpId,
	error: &str,
) -> DlResult<()> {
	let query = sqlx::query(
		"UPDATE follow_ups SET status='FAILED', error = ?
		WHERE follow_up_id = ? AND status='PENDING'",
	)
	.bind(error)
	.bind(follow_up_id.0);

	transition(db, follow_up_id, query).await
}

// vim: ts=4
