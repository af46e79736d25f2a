//! Outbound mail collaborator for Dunlin.
//!
//! Consumes due `Pending` follow-up rows, delivers them over a
//! [`MailTransport`], marks them sent/failed/skipped, and appends an email
//! log entry per attempt. There is no timer loop here; a caller (cron job,
//! admin route, test harness) drives [`Dispatcher::run_once`].

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod dispatch;
pub mod smtp;

pub use dispatch::{DispatchSummary, Dispatcher};
pub use smtp::{SmtpConfig, SmtpMailer};

mod prelude;

use async_trait::async_trait;
use std::fmt::Debug;

use crate::prelude::*;

/// One email ready for delivery.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
	pub to: String,
	pub subject: String,
	pub body: String,
}

/// Mail delivery backend.
///
/// The production implementation is [`SmtpMailer`]; tests substitute a
/// recording fake.
#[async_trait]
pub trait MailTransport: Debug + Send + Sync {
	async fn send(&self, email: &OutgoingEmail) -> DlResult<()>;
}

// vim: ts=4
