//! Common test utilities
//!
//! Provides the in-memory store fake and fixture helpers shared by the
//! engine integration tests.

pub mod memory;

pub use memory::MemoryStore;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use dunlin_types::prelude::*;
use dunlin_types::store_adapter::{CreateInvoiceData, CreateUserData, Invoice, StoreAdapter, User};

pub async fn seed_user(store: &MemoryStore, email: &str) -> User {
	store
		.create_user(&CreateUserData { email, name: None })
		.await
		.expect("Should create user")
}

pub async fn seed_invoice(store: &MemoryStore, user_id: UserId, due: &str) -> Invoice {
	store
		.create_invoice(
			user_id,
			&CreateInvoiceData {
				client_name: "Acme Corp",
				client_email: "billing@acme.test",
				invoice_number: "INV-001",
				amount: Decimal::from_str("1234.56").expect("valid amount"),
				currency: "USD",
				due_date: date(due),
				notes: None,
				schedule_id: None,
			},
		)
		.await
		.expect("Should create invoice")
}

pub fn date(s: &str) -> NaiveDate {
	NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date literal")
}

// vim: ts=4
