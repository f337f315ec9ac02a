// © 2025 The fluxx-helpers Developers
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Log output: stdout, an append-only log file, and optional email alerts for warnings and errors.

mod email;
mod format;

use crate::config::ConfigData;
use miette::IntoDiagnostic;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub use email::{ALERT_QUEUE_CAPACITY, AlertError, AlertLayer, EmailAlerter};
pub use format::LineFormat;

/// Installs the global tracing subscriber.
///
/// Must be called from within a tokio runtime when email notifications are turned on, since alerts are sent from a
/// background task.
pub fn init_logging(config_data: &ConfigData) -> miette::Result<()> {
	let config = &config_data.logging;
	let filter = match EnvFilter::try_from_default_env() {
		Ok(filter) => filter,
		Err(_) => EnvFilter::try_new(&config.level).into_diagnostic()?,
	};

	let log_file = OpenOptions::new()
		.create(true)
		.append(true)
		.open(&config.log_file_name)
		.into_diagnostic()?;
	let file_layer = tracing_subscriber::fmt::layer()
		.event_format(LineFormat)
		.with_ansi(false)
		.with_writer(Mutex::new(log_file));

	let alert_layer = match config_data.log_config.active_email_settings()? {
		Some(email_settings) => Some(AlertLayer::spawn(EmailAlerter::new(email_settings)?)?),
		None => None,
	};

	tracing_subscriber::registry()
		.with(filter)
		.with(tracing_subscriber::fmt::layer())
		.with(file_layer)
		.with(alert_layer)
		.try_init()
		.into_diagnostic()?;

	tracing::debug!(log_file = %config.log_file_name.display(), "Logging initialized");
	Ok(())
}
