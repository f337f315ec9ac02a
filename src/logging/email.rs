// © 2025 The fluxx-helpers Developers
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::format::render_event;
use crate::config::EmailSettings;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use miette::{Diagnostic, IntoDiagnostic, bail};
use std::error::Error;
use std::fmt;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Events from these targets are never emailed, since sending the email could produce more of them.
const IGNORED_TARGETS: &[&str] = &["lettre", "rustls", "hyper"];

/// Alerts waiting to be emailed. Further alerts are dropped while the queue is full.
pub const ALERT_QUEUE_CAPACITY: usize = 64;

/// Sends alert emails over SMTP with STARTTLS
pub struct EmailAlerter {
	transport: AsyncSmtpTransport<Tokio1Executor>,
	from: Mailbox,
	to: Vec<Mailbox>,
	subject: String,
}

impl EmailAlerter {
	pub fn new(settings: &EmailSettings) -> miette::Result<Self> {
		let from: Mailbox = settings.from_address.parse().into_diagnostic()?;
		let to = settings
			.send_to
			.iter()
			.map(|address| address.parse::<Mailbox>())
			.collect::<Result<Vec<_>, _>>()
			.into_diagnostic()?;
		if to.is_empty() {
			bail!("Email alerts are configured without any recipients");
		}

		let credentials = Credentials::new(settings.username.clone(), settings.password.clone());
		let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_server)
			.into_diagnostic()?
			.port(settings.smtp_port)
			.credentials(credentials)
			.build();

		Ok(Self {
			transport,
			from,
			to,
			subject: settings.subject.clone(),
		})
	}

	pub async fn send_alert(&self, body: String) -> Result<(), AlertError> {
		let mut message = Message::builder().from(self.from.clone()).subject(self.subject.clone());
		for recipient in self.to.iter() {
			message = message.to(recipient.clone());
		}
		let message = message.body(body)?;
		self.transport.send(message).await?;
		Ok(())
	}
}

#[derive(Debug, Diagnostic)]
pub enum AlertError {
	Message(lettre::error::Error),
	Smtp(lettre::transport::smtp::Error),
}

impl From<lettre::error::Error> for AlertError {
	fn from(error: lettre::error::Error) -> Self {
		Self::Message(error)
	}
}

impl From<lettre::transport::smtp::Error> for AlertError {
	fn from(error: lettre::transport::smtp::Error) -> Self {
		Self::Smtp(error)
	}
}

impl Error for AlertError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			Self::Message(error) => Some(error),
			Self::Smtp(error) => Some(error),
		}
	}
}

impl fmt::Display for AlertError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Message(error) => write!(f, "couldn't build alert email: {}", error),
			Self::Smtp(error) => write!(f, "couldn't send alert email: {}", error),
		}
	}
}

/// Forwards warnings and errors to a background task that emails them.
///
/// Sending never blocks the logging call. Failures to send, and alerts dropped because the queue is full, are
/// written to stderr rather than logged.
pub struct AlertLayer {
	sender: mpsc::Sender<String>,
}

impl AlertLayer {
	/// Starts the background task on the current tokio runtime
	pub fn spawn(alerter: EmailAlerter) -> miette::Result<Self> {
		let runtime = Handle::try_current().into_diagnostic()?;
		let (sender, mut receiver) = mpsc::channel::<String>(ALERT_QUEUE_CAPACITY);
		runtime.spawn(async move {
			while let Some(alert) = receiver.recv().await {
				if let Err(error) = alerter.send_alert(alert).await {
					eprintln!("Got error when trying to send email notification: {}", error);
				}
			}
		});
		Ok(Self { sender })
	}

	fn from_sender(sender: mpsc::Sender<String>) -> Self {
		Self { sender }
	}
}

impl<S: Subscriber> Layer<S> for AlertLayer {
	fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
		let metadata = event.metadata();
		if *metadata.level() > Level::WARN {
			return;
		}
		if IGNORED_TARGETS
			.iter()
			.any(|target| metadata.target().starts_with(target))
		{
			return;
		}
		match self.sender.try_send(render_event(event)) {
			Ok(()) => (),
			Err(TrySendError::Full(alert)) => {
				eprintln!("Email notification queue is full; dropping alert: {}", alert);
			}
			// The alert task has stopped, so there's nobody to deliver to.
			Err(TrySendError::Closed(_)) => (),
		}
	}
}
