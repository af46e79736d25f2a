//! User management operations

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::utils::*;
use dunlin::prelude::*;
use dunlin::store_adapter::{CreateUserData, User};

fn map_user(row: &SqliteRow) -> Result<User, sqlx::Error> {
	Ok(User {
		user_id: UserId(row.try_get("user_id")?),
		email: row.try_get("email")?,
		name: row.try_get("name")?,
		created_at: row.try_get("created_at").map(Timestamp)?,
	})
}

pub(crate) async fn create(db: &SqlitePool, data: &CreateUserData<'_>) -> DlResult<User> {
	let res = sqlx::query(
		"INSERT INTO users (email, name) VALUES (?, ?)
		RETURNING user_id, email, name, created_at",
	)
	.bind(data.email)
	.bind(data.name)
	.fetch_one(db)
	.await;

	map_res(res, map_user)
}

pub(crate) async fn read(db: &SqlitePool, user_id: UserId) -> DlResult<User> {
	let res = sqlx::query("SELECT user_id, email, name, created_at FROM users WHERE user_id = ?")
		.bind(user_id.0)
		.fetch_one(db)
		.await;

	map_res(res, map_user)
}

// vim: ts=4
