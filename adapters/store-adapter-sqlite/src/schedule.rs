//! Schedule and schedule-step persistence
//!
//! Compound operations (create with steps, step replacement, default
//! reassignment, cascading delete) each run in a single transaction; the
//! transaction boundary is the concurrency-control mechanism for the
//! one-default-per-user invariant.

use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, SqlitePool};

use crate::utils::*;
use dunlin::prelude::*;
use dunlin::store_adapter::{
	CreateScheduleData, CreateStepData, Schedule, ScheduleStep, ScheduleWithSteps,
	UpdateScheduleData,
};
use dunlin::types::StepId;

fn map_schedule(row: &SqliteRow) -> Result<Schedule, sqlx::Error> {
	Ok(Schedule {
		schedule_id: ScheduleId(row.try_get("schedule_id")?),
		user_id: UserId(row.try_get("user_id")?),
		name: row.try_get("name")?,
		is_active: row.try_get("is_active")?,
		is_default: row.try_get("is_default")?,
		created_at: row.try_get("created_at").map(Timestamp)?,
		updated_at: row.try_get("updated_at").map(Timestamp)?,
	})
}

fn map_step(row: &SqliteRow) -> Result<ScheduleStep, sqlx::Error> {
	Ok(ScheduleStep {
		step_id: StepId(row.try_get("step_id")?),
		schedule_id: ScheduleId(row.try_get("schedule_id")?),
		day_offset: row.try_get("day_offset")?,
		position: row.try_get("position")?,
		template_id: TemplateId(row.try_get("template_id")?),
	})
}

pub(crate) async fn create(
	db: &SqlitePool,
	user_id: UserId,
	data: &CreateScheduleData<'_>,
) -> DlResult<ScheduleWithSteps> {
	let mut tx = db.begin().await.map_err(|_| Error::DbError)?;

	let res = sqlx::query(
		"INSERT INTO schedules (user_id, name, is_active, is_default)
		VALUES (?, ?, ?, ?) RETURNING *",
	)
	.bind(user_id.0)
	.bind(data.name)
	.bind(data.is_active)
	.bind(data.is_default)
	.fetch_one(&mut *tx)
	.await;
	let schedule = map_res(res, map_schedule)?;

	let mut steps = Vec::with_capacity(data.steps.len());
	for step in data.steps {
		let res = sqlx::query(
			"INSERT INTO schedule_steps (schedule_id, day_offset, position, template_id)
			VALUES (?, ?, ?, ?) RETURNING *",
		)
		.bind(schedule.schedule_id.0)
		.bind(step.day_offset)
		.bind(step.position)
		.bind(step.template_id.0)
		.fetch_one(&mut *tx)
		.await;
		steps.push(map_res(res, map_step)?);
	}

	tx.commit().await.map_err(|_| Error::DbError)?;

	Ok(ScheduleWithSteps { schedule, steps })
}

pub(crate) async fn read(db: &SqlitePool, schedule_id: ScheduleId) -> DlResult<Schedule> {
	let res = sqlx::query("SELECT * FROM schedules WHERE schedule_id = ?")
		.bind(schedule_id.0)
		.fetch_one(db)
		.await;

	map_res(res, map_schedule)
}

pub(crate) async fn read_steps(
	db: &SqlitePool,
	schedule_id: ScheduleId,
) -> DlResult<Vec<ScheduleStep>> {
	let rows = sqlx::query(
		"SELECT * FROM schedule_steps WHERE schedule_id = ? ORDER BY position, step_id",
	)
	.bind(schedule_id.0)
	.fetch_all(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	collect_res(rows.iter().map(map_step))
}

pub(crate) async fn list(db: &SqlitePool, user_id: UserId) -> DlResult<Vec<Schedule>> {
	let rows = sqlx::query("SELECT * FROM schedules WHERE user_id = ? ORDER BY schedule_id")
		.bind(user_id.0)
		.fetch_all(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	collect_res(rows.iter().map(map_schedule))
}

pub(crate) async fn update(
	db: &SqlitePool,
	schedule_id: ScheduleId,
	data: &UpdateScheduleData,
) -> DlResult<Schedule> {
	let mut query = QueryBuilder::new("UPDATE schedules SET ");
	let mut has = false;

	has = push_patch!(query, has, "name", &data.name, |v| &**v);
	has = push_patch!(query, has, "is_active", &data.is_active, |v| *v);

	if has {
		query.push(", updated_at=unixepoch() WHERE schedule_id=").push_bind(schedule_id.0);
		query
			.build()
			.execute(db)
			.await
			.inspect_err(inspect)
			.map_err(|_| Error::DbError)?;
	}

	read(db, schedule_id).await
}

pub(crate) async fn replace_steps(
	db: &SqlitePool,
	schedule_id: ScheduleId,
	steps: &[CreateStepData],
) -> DlResult<Vec<ScheduleStep>> {
	let mut tx = db.begin().await.map_err(|_| Error::DbError)?;

	sqlx::query("DELETE FROM schedule_steps WHERE schedule_id = ?")
		.bind(schedule_id.0)
		.execute(&mut *tx)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	let mut created = Vec::with_capacity(steps.len());
	for step in steps {
		let res = sqlx::query(
			"INSERT INTO schedule_steps (schedule_id, day_offset, position, template_id)
			VALUES (?, ?, ?, ?) RETURNING *",
		)
		.bind(schedule_id.0)
		.bind(step.day_offset)
		.bind(step.position)
		.bind(step.template_id.0)
		.fetch_one(&mut *tx)
		.await;
		created.push(map_res(res, map_step)?);
	}

	sqlx::query("UPDATE schedules SET updated_at=unixepoch() WHERE schedule_id = ?")
		.bind(schedule_id.0)
		.execute(&mut *tx)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	tx.commit().await.map_err(|_| Error::DbError)?;

	Ok(created)
}

pub(crate) async fn delete(
	db: &SqlitePool,
	user_id: UserId,
	schedule_id: ScheduleId,
) -> DlResult<()> {
	let mut tx = db.begin().await.map_err(|_| Error::DbError)?;

	let res = sqlx::query("DELETE FROM schedules WHERE schedule_id = ? AND user_id = ?")
		.bind(schedule_id.0)
		.bind(user_id.0)
		.execute(&mut *tx)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}

	sqlx::query("DELETE FROM schedule_steps WHERE schedule_id = ?")
		.bind(schedule_id.0)
		.execute(&mut *tx)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	// Assigned invoices fall back to the user's default schedule.
	sqlx::query("UPDATE invoices SET schedule_id=NULL WHERE schedule_id = ?")
		.bind(schedule_id.0)
		.execute(&mut *tx)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	tx.commit().await.map_err(|_| Error::DbError)?;
	Ok(())
}

pub(crate) async fn set_default(
	db: &SqlitePool,
	user_id: UserId,
	schedule_id: ScheduleId,
) -> DlResult<Schedule> {
	let mut tx = db.begin().await.map_err(|_| Error::DbError)?;

	// Unset first so the partial unique index never sees two defaults.
	sqlx::query(
		"UPDATE schedules SET is_default=0
		WHERE user_id = ? AND is_default=1 AND schedule_id != ?",
	)
	.bind(user_id.0)
	.bind(schedule_id.0)
	.execute(&mut *tx)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	let res = sqlx::query(
		"UPDATE schedules SET is_default=1, updated_at=unixepoch()
		WHERE schedule_id = ? AND user_id = ?",
	)
	.bind(schedule_id.0)
	.bind(user_id.0)
	.execute(&mut *tx)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}

	tx.commit().await.map_err(|_| Error::DbError)?;

	read(db, schedule_id).await
}

pub(crate) async fn clear_other_defaults(
	db: &SqlitePool,
	user_id: UserId,
	keep: ScheduleId,
) -> DlResult<u32> {
	let res = sqlx::query(
		"UPDATE schedules SET is_default=0
		WHERE user_id = ? AND is_default=1 AND schedule_id != ?",
	)
	.bind(user_id.0)
	.bind(keep.0)
	.execute(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	Ok(res.rows_affected() as u32)
}

// vim: ts=4
