// © 2025 The fluxx-helpers Developers
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use miette::{IntoDiagnostic, WrapErr, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs::{read_to_string, write};
use twilight_model::id::Id;
use twilight_model::id::marker::UserMarker;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Reads the JSON config file
pub async fn parse_config(config_path: impl AsRef<Path>) -> miette::Result<ConfigData> {
	let config_path = config_path.as_ref();
	let config_file_contents = read_to_string(config_path)
		.await
		.into_diagnostic()
		.wrap_err_with(|| format!("failed to read config file {}", config_path.display()))?;
	serde_json::from_str(&config_file_contents)
		.into_diagnostic()
		.wrap_err_with(|| format!("invalid config file {}", config_path.display()))
}

/// Writes the config back out as JSON, replacing the existing file
pub async fn write_config(config: &ConfigData, config_path: impl AsRef<Path>) -> miette::Result<()> {
	let config_path = config_path.as_ref();
	let mut contents = serde_json::to_string_pretty(config).into_diagnostic()?;
	contents.push('\n');
	write(config_path, contents)
		.await
		.into_diagnostic()
		.wrap_err_with(|| format!("failed to write config file {}", config_path.display()))
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ConfigData {
	pub discord: DiscordConfig,
	#[serde(default)]
	pub credentials: CredentialsConfig,
	pub logging: LoggingConfig,
	#[serde(default)]
	pub log_config: LogConfig,
	#[serde(rename = "somewhat_weird_shit", default)]
	pub bot: BotConfig,
	/// Settings owned by other parts of the bot. They're kept as-is so that saving doesn't drop them.
	#[serde(flatten)]
	pub other: Map<String, Value>,
}

impl ConfigData {
	/// Checks whether the user is one of the bot's configured administrators
	pub fn is_admin(&self, user_id: Id<UserMarker>) -> bool {
		self.bot.admin_user_ids.contains(&user_id.get())
	}
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DiscordConfig {
	pub bot_token: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CredentialsConfig {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub mashape_api_key: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LoggingConfig {
	pub log_file_name: PathBuf,
	/// A tracing filter directive, e.g. `info` or `fluxx_helpers=debug,info`. `RUST_LOG` takes precedence when set.
	#[serde(default = "default_log_level")]
	pub level: String,
}

fn default_log_level() -> String {
	String::from("info")
}

/// Email alerting for warnings and errors
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct LogConfig {
	#[serde(default)]
	pub use_email_notifications: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email_settings: Option<EmailSettings>,
}

impl LogConfig {
	/// Gets the email settings to alert with, or `None` when email notifications are turned off
	pub fn active_email_settings(&self) -> miette::Result<Option<&EmailSettings>> {
		if !self.use_email_notifications {
			return Ok(None);
		}
		match &self.email_settings {
			Some(settings) => Ok(Some(settings)),
			None => bail!("Email notifications are turned on, but no email settings are configured"),
		}
	}
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EmailSettings {
	pub smtp_server: String,
	pub smtp_port: u16,
	pub from_address: String,
	pub send_to: Vec<String>,
	pub subject: String,
	pub username: String,
	pub password: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct BotConfig {
	#[serde(default)]
	pub admin_user_ids: Vec<u64>,
}
