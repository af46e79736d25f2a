//! Follow-up and email log persistence tests
//!
//! Covers pending-set replacement semantics, due listing, status
//! transitions, and the append-only email log.

use chrono::NaiveDate;
use dunlin::store_adapter::{
	CreateEmailLogData, CreateFollowUpData, CreateInvoiceData, CreateTemplateData,
	CreateUserData, StoreAdapter,
};
use dunlin::types::{FollowUpStatus, InvoiceId, TemplateId, Timestamp, UserId};
use dunlin_store_adapter_sqlite::StoreAdapterSqlite;
use rust_decimal::Decimal;
use std::str::FromStr;
use tempfile::TempDir;

async fn create_test_adapter() -> (StoreAdapterSqlite, TempDir) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let adapter = StoreAdapterSqlite::new(temp_dir.path().join("dunlin.db"))
		.await
		.expect("Failed to create adapter");

	(adapter, temp_dir)
}

fn date(s: &str) -> NaiveDate {
	NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date literal")
}

async fn seed(adapter: &StoreAdapterSqlite) -> (UserId, InvoiceId, TemplateId) {
	let user = adapter
		.create_user(&CreateUserData { email: "alice@example.com", name: None })
		.await
		.expect("user");
	let invoice = adapter
		.create_invoice(
			user.user_id,
			&CreateInvoiceData {
				client_name: "Acme Corp",
				client_email: "billing@acme.test",
				invoice_number: "INV-001",
				amount: Decimal::from_str("99.50").expect("amount"),
				currency: "USD",
				due_date: date("2025-06-01"),
				notes: None,
				schedule_id: None,
			},
		)
		.await
		.expect("invoice");
	let template = adapter
		.create_template(
			user.user_id,
			&CreateTemplateData { name: "T", subject: "s", body: "b", is_default: false },
		)
		.await
		.expect("template");

	(user.user_id, invoice.invoice_id, template.template_id)
}

fn rows<'a>(template_id: TemplateId, dates: &[&'a str]) -> Vec<CreateFollowUpData<'a>> {
	dates
		.iter()
		.map(|d| CreateFollowUpData {
			template_id,
			scheduled_at: date(d),
			subject: "Reminder",
			body: "Pay please",
		})
		.collect()
}

#[tokio::test]
async fn test_replace_pending_creates_rows() {
	let (adapter, _temp) = create_test_adapter().await;
	let (_user, invoice_id, template_id) = seed(&adapter).await;

	let created = adapter
		.replace_pending_follow_ups(
			invoice_id,
			&rows(template_id, &["2025-06-01", "2025-06-04", "2025-06-08"]),
		)
		.await
		.expect("Should create rows");
	assert_eq!(created, 3);

	let listed = adapter.list_follow_ups(invoice_id).await.expect("Should list");
	assert_eq!(listed.len(), 3);
	assert!(listed.iter().all(|r| r.status == FollowUpStatus::Pending));
	assert_eq!(listed[0].scheduled_at, date("2025-06-01"));
	assert_eq!(listed[2].scheduled_at, date("2025-06-08"));
}

#[tokio::test]
async fn test_replace_pending_keeps_consumed_rows() {
	let (adapter, _temp) = create_test_adapter().await;
	let (_user, invoice_id, template_id) = seed(&adapter).await;

	adapter
		.replace_pending_follow_ups(invoice_id, &rows(template_id, &["2025-06-01", "2025-06-04"]))
		.await
		.expect("initial rows");
	let listed = adapter.list_follow_ups(invoice_id).await.expect("list");
	let sent_id = listed[0].follow_up_id;
	adapter
		.mark_follow_up_sent(sent_id, Timestamp(1_750_000_000))
		.await
		.expect("mark sent");

	adapter
		.replace_pending_follow_ups(invoice_id, &rows(template_id, &["2025-07-01"]))
		.await
		.expect("replacement");

	let listed = adapter.list_follow_ups(invoice_id).await.expect("list again");
	assert_eq!(listed.len(), 2);

	let sent: Vec<_> = listed.iter().filter(|r| r.status == FollowUpStatus::Sent).collect();
	assert_eq!(sent.len(), 1);
	assert_eq!(sent[0].follow_up_id, sent_id);
	assert_eq!(sent[0].sent_at, Some(Timestamp(1_750_000_000)));

	let pending: Vec<_> =
		listed.iter().filter(|r| r.status == FollowUpStatus::Pending).collect();
	assert_eq!(pending.len(), 1);
	assert_eq!(pending[0].scheduled_at, date("2025-07-01"));
}

#[tokio::test]
async fn test_list_due_follow_ups() {
	let (adapter, _temp) = create_test_adapter().await;
	let (_user, invoice_id, template_id) = seed(&adapter).await;

	adapter
		.replace_pending_follow_ups(
			invoice_id,
			&rows(template_id, &["2025-06-01", "2025-06-04", "2025-06-08"]),
		)
		.await
		.expect("rows");

	let due = adapter.list_due_follow_ups(date("2025-06-04")).await.expect("due");
	assert_eq!(due.len(), 2);
	assert!(due.iter().all(|r| r.scheduled_at <= date("2025-06-04")));

	let none = adapter.list_due_follow_ups(date("2025-05-31")).await.expect("none due");
	assert!(none.is_empty());
}

#[tokio::test]
async fn test_transitions_only_touch_pending_rows() {
	let (adapter, _temp) = create_test_adapter().await;
	let (_user, invoice_id, template_id) = seed(&adapter).await;

	adapter
		.replace_pending_follow_ups(invoice_id, &rows(template_id, &["2025-06-01"]))
		.await
		.expect("rows");
	let listed = adapter.list_follow_ups(invoice_id).await.expect("list");
	let id = listed[0].follow_up_id;

	adapter.mark_follow_up_failed(id, "mailbox full").await.expect("mark failed");

	let listed = adapter.list_follow_ups(invoice_id).await.expect("list again");
	assert_eq!(listed[0].status, FollowUpStatus::Failed);
	assert_eq!(listed[0].error.as_deref(), Some("mailbox full"));

	// A consumed row cannot transition again.
	let result = adapter.mark_follow_up_sent(id, Timestamp(1_750_000_000)).await;
	assert!(matches!(result, Err(dunlin::error::Error::NotFound)));
}

#[tokio::test]
async fn test_count_pending() {
	let (adapter, _temp) = create_test_adapter().await;
	let (_user, invoice_id, template_id) = seed(&adapter).await;

	adapter
		.replace_pending_follow_ups(invoice_id, &rows(template_id, &["2025-06-01", "2025-06-04"]))
		.await
		.expect("rows");
	assert_eq!(adapter.count_pending_follow_ups(invoice_id).await.expect("count"), 2);

	let listed = adapter.list_follow_ups(invoice_id).await.expect("list");
	adapter.mark_follow_up_skipped(listed[0].follow_up_id).await.expect("skip");
	assert_eq!(adapter.count_pending_follow_ups(invoice_id).await.expect("count"), 1);
}

#[tokio::test]
async fn test_email_log_append_and_list() {
	let (adapter, _temp) = create_test_adapter().await;
	let (user_id, invoice_id, _template) = seed(&adapter).await;

	adapter
		.create_email_log(
			user_id,
			&CreateEmailLogData {
				invoice_id: Some(invoice_id),
				recipient: "billing@acme.test",
				subject: "Reminder",
				success: true,
				error: None,
			},
		)
		.await
		.expect("first log");
	adapter
		.create_email_log(
			user_id,
			&CreateEmailLogData {
				invoice_id: Some(invoice_id),
				recipient: "billing@acme.test",
				subject: "Reminder",
				success: false,
				error: Some("connection refused"),
			},
		)
		.await
		.expect("second log");

	let logs = adapter.list_email_logs(user_id).await.expect("list");
	assert_eq!(logs.len(), 2);
	// Newest first.
	assert!(!logs[0].success);
	assert_eq!(logs[0].error.as_deref(), Some("connection refused"));
	assert!(logs[1].success);
}

// vim: ts=4
