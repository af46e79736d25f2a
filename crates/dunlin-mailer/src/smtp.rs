//! SMTP delivery with lettre

use async_trait::async_trait;
use lettre::{
	message::Mailbox,
	transport::smtp::authentication::Credentials,
	AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::Deserialize;

use crate::prelude::*;
use crate::{MailTransport, OutgoingEmail};

/// SMTP connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmtpConfig {
	pub host: String,
	#[serde(default = "default_smtp_port")]
	pub port: u16,
	pub username: Option<String>,
	pub password: Option<String>,
	/// Sender mailbox, e.g. `"Dunlin <no-reply@example.com>"`.
	pub from: String,
}

fn default_smtp_port() -> u16 {
	465
}

/// TLS SMTP transport.
#[derive(Debug)]
pub struct SmtpMailer {
	transport: AsyncSmtpTransport<Tokio1Executor>,
	from: Mailbox,
}

impl SmtpMailer {
	pub fn new(config: &SmtpConfig) -> DlResult<Self> {
		let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
			.map_err(|e| {
				Error::ValidationError(format!("invalid SMTP relay '{}': {}", config.host, e))
			})?
			.port(config.port);

		if let (Some(username), Some(password)) = (&config.username, &config.password) {
			builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
		}

		let from: Mailbox = config.from.parse().map_err(|e| {
			Error::ValidationError(format!("invalid sender mailbox '{}': {}", config.from, e))
		})?;

		Ok(Self { transport: builder.build(), from })
	}
}

#[async_trait]
impl MailTransport for SmtpMailer {
	async fn send(&self, email: &OutgoingEmail) -> DlResult<()> {
		let to: Mailbox = email
			.to
			.parse()
			.map_err(|e| Error::MailError(format!("invalid recipient '{}': {}", email.to, e)))?;

		let message = Message::builder()
			.from(self.from.clone())
			.to(to)
			.subject(email.subject.clone())
			.body(email.body.clone())
			.map_err(|e| Error::MailError(format!("failed to build message: {}", e)))?;

		self.transport
			.send(message)
			.await
			.map_err(|e| Error::MailError(format!("SMTP send failed: {}", e)))?;

		debug!("Delivered email to {}", email.to);
		Ok(())
	}
}


// vim: ts=4
