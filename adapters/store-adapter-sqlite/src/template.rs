//! Template persistence
//!
//! The default-template flag is maintained write-side: creating or marking
//! a template default unsets the user's others in the same transaction.

use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, SqlitePool};

use crate::utils::*;
use dunlin::prelude::*;
use dunlin::store_adapter::{CreateTemplateData, Template, UpdateTemplateData};
use dunlin::types::Patch;

fn map_template(row: &SqliteRow) -> Result<Template, sqlx::Error> {
	Ok(Template {
		template_id: TemplateId(row.try_get("template_id")?),
		user_id: UserId(row.try_get("user_id")?),
		name: row.try_get("name")?,
		subject: row.try_get("subject")?,
		body: row.try_get("body")?,
		is_default: row.try_get("is_default")?,
		created_at: row.try_get("created_at").map(Timestamp)?,
		updated_at: row.try_get("updated_at").map(Timestamp)?,
	})
}

pub(crate) async fn create(
	db: &SqlitePool,
	user_id: UserId,
	data: &CreateTemplateData<'_>,
) -> DlResult<Template> {
	let mut tx = db.begin().await.map_err(|_| Error::DbError)?;

	if data.is_default {
		sqlx::query("UPDATE templates SET is_default=0 WHERE user_id = ? AND is_default=1")
			.bind(user_id.0)
			.execute(&mut *tx)
			.await
			.inspect_err(inspect)
			.map_err(|_| Error::DbError)?;
	}

	let res = sqlx::query(
		"INSERT INTO templates (user_id, name, subject, body, is_default)
		VALUES (?, ?, ?, ?, ?) RETURNING *",
	)
	.bind(user_id.0)
	.bind(data.name)
	.bind(data.subject)
	.bind(data.body)
	.bind(data.is_default)
	.fetch_one(&mut *tx)
	.await;
	let template = map_res(res, map_template)?;

	tx.commit().await.map_err(|_| Error::DbError)?;
	Ok(template)
}

pub(crate) async fn read(db: &SqlitePool, template_id: TemplateId) -> DlResult<Template> {
	let res = sqlx::query("SELECT * FROM templates WHERE template_id = ?")
		.bind(template_id.0)
		.fetch_one(db)
		.await;

	map_res(res, map_template)
}

pub(crate) async fn list(db: &SqlitePool, user_id: UserId) -> DlResult<Vec<Template>> {
	let rows = sqlx::query("SELECT * FROM templates WHERE user_id = ? ORDER BY template_id")
		.bind(user_id.0)
		.fetch_all(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	collect_res(rows.iter().map(map_template))
}

pub(crate) async fn update(
	db: &SqlitePool,
	template_id: TemplateId,
	data: &UpdateTemplateData,
) -> DlResult<Template> {
	let mut tx = db.begin().await.map_err(|_| Error::DbError)?;

	if let Patch::Value(true) = data.is_default {
		sqlx::query(
			"UPDATE templates SET is_default=0
			WHERE is_default=1 AND template_id != ?
			AND user_id = (SELECT user_id FROM templates WHERE template_id = ?)",
		)
		.bind(template_id.0)
		.bind(template_id.0)
		.execute(&mut *tx)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;
	}

	let mut query = QueryBuilder::new("UPDATE templates SET ");
	let mut has = false;

	has = push_patch!(query, has, "name", &data.name, |v| &**v);
	has = push_patch!(query, has, "subject", &data.subject, |v| &**v);
	has = push_patch!(query, has, "body", &data.body, |v| &**v);
	has = push_patch!(query, has, "is_default", &data.is_default, |v| *v);

	if has {
		query.push(", updated_at=unixepoch() WHERE template_id=").push_bind(template_id.0);
		query
			.build()
			.execute(&mut *tx)
			.await
			.inspect_err(inspect)
			.map_err(|_| Error::DbError)?;
	}

	tx.commit().await.map_err(|_| Error::DbError)?;

	read(db, template_id).await
}

pub(crate) async fn delete(
	db: &SqlitePool,
	user_id: UserId,
	template_id: TemplateId,
) -> DlResult<()> {
	let res = sqlx::query("DELETE FROM templates WHERE template_id = ? AND user_id = ?")
		.bind(template_id.0)
		.bind(user_id.0)
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
