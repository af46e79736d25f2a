//! Database schema initialization
//!
//! Creates tables and indexes idempotently so the adapter can be pointed at
//! a fresh or existing database file.

use sqlx::SqlitePool;

/// Initialize the database schema with all required tables and indexes
pub(crate) async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	// Users
	//*******
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS users (
			user_id integer PRIMARY KEY AUTOINCREMENT,
			email text NOT NULL UNIQUE,
			name text,
			created_at datetime NOT NULL DEFAULT (unixepoch())
		)",
	)
	.execute(&mut *tx)
	.await?;

	// Invoices
	//**********
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS invoices (
			invoice_id integer PRIMARY KEY AUTOINCREMENT,
			user_id integer NOT NULL,
			client_name text NOT NULL,
			client_email text NOT NULL,
			invoice_number text NOT NULL,
			amount text NOT NULL,
			currency text NOT NULL,
			due_date text NOT NULL,
			status text NOT NULL DEFAULT 'PENDING',
			notes text,
			schedule_id integer,
			last_reminder_at datetime,
			reminder_count integer NOT NULL DEFAULT 0,
			reminders_completed boolean NOT NULL DEFAULT 0,
			reminders_enabled boolean NOT NULL DEFAULT 1,
			reminders_paused_reason text,
			reminders_reset_at datetime,
			created_at datetime NOT NULL DEFAULT (unixepoch()),
			updated_at datetime NOT NULL DEFAULT (unixepoch())
		)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_invoices_user ON invoices(user_id)")
		.execute(&mut *tx)
		.await?;
	sqlx::query(
		"CREATE INDEX IF NOT EXISTS idx_invoices_user_status ON invoices(user_id, status)",
	)
	.execute(&mut *tx)
	.await?;

	// Schedules
	//***********
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS schedules (
			schedule_id integer PRIMARY KEY AUTOINCREMENT,
			user_id integer NOT NULL,
			name text NOT NULL,
			is_active boolean NOT NULL DEFAULT 1,
			is_default boolean NOT NULL DEFAULT 0,
			created_at datetime NOT NULL DEFAULT (unixepoch()),
			updated_at datetime NOT NULL DEFAULT (unixepoch())
		)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_schedules_user ON schedules(user_id)")
		.execute(&mut *tx)
		.await?;
	// Second line of defense for the one-default-per-user invariant; the
	// self-healing bootstrap logic remains the first.
	sqlx::query(
		"CREATE UNIQUE INDEX IF NOT EXISTS idx_schedules_default
		ON schedules(user_id) WHERE is_default = 1",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS schedule_steps (
			step_id integer PRIMARY KEY AUTOINCREMENT,
			schedule_id integer NOT NULL,
			day_offset integer NOT NULL,
			position integer NOT NULL,
			template_id integer NOT NULL
		)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_steps_schedule ON schedule_steps(schedule_id)")
		.execute(&mut *tx)
		.await?;

	// Templates
	//***********
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS templates (
			template_id integer PRIMARY KEY AUTOINCREMENT,
			user_id integer NOT NULL,
			name text NOT NULL,
			subject text NOT NULL,
			body text NOT NULL,
			is_default boolean NOT NULL DEFAULT 0,
			created_at datetime NOT NULL DEFAULT (unixepoch()),
			updated_at datetime NOT NULL DEFAULT (unixepoch())
		)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_templates_user ON templates(user_id)")
		.execute(&mut *tx)
		.await?;

	// Follow-ups
	//************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS follow_ups (
			follow_up_id integer PRIMARY KEY AUTOINCREMENT,
			invoice_id integer NOT NULL,
			template_id integer NOT NULL,
			scheduled_at text NOT NULL,
			subject text NOT NULL,
			body text NOT NULL,
			status text NOT NULL DEFAULT 'PENDING',
			sent_at datetime,
			error text,
			created_at datetime NOT NULL DEFAULT (unixepoch())
		)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_follow_ups_invoice ON follow_ups(invoice_id)")
		.execute(&mut *tx)
		.await?;
	sqlx::query(
		"CREATE INDEX IF NOT EXISTS idx_follow_ups_due ON follow_ups(status, scheduled_at)",
	)
	.execute(&mut *tx)
	.await?;

	// Email log
	//***********
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS email_logs (
			email_log_id integer PRIMARY KEY AUTOINCREMENT,
			user_id integer NOT NULL,
			invoice_id integer,
			recipient text NOT NULL,
			subject text NOT NULL,
			sent_at datetime NOT NULL DEFAULT (unixepoch()),
			success boolean NOT NULL,
			error text
		)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_email_logs_user ON email_logs(user_id)")
		.execute(&mut *tx)
		.await?;

	tx.commit().await?;
	Ok(())
}

// vim: ts=4
