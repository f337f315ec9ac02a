// © 2025 The fluxx-helpers Developers
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Narrow async interfaces over the Discord platform, and their twilight-backed implementation.
//!
//! Helpers in this crate take these traits rather than a concrete client so that a handle is always passed in
//! explicitly and tests can substitute their own platform.

use crate::config::ConfigData;
use async_trait::async_trait;
use miette::Diagnostic;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use twilight_cache_inmemory::DefaultInMemoryCache;
use twilight_http::client::Client;
use twilight_http::error::ErrorType;
use twilight_http::response::{DeserializeBodyError, StatusCode};
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, RoleMarker, UserMarker};

type BoxedError = Box<dyn Error + Send + Sync>;

/// Identifies a member of a guild
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct MemberRef {
	pub guild_id: Id<GuildMarker>,
	pub user_id: Id<UserMarker>,
}

impl MemberRef {
	pub fn new(guild_id: Id<GuildMarker>, user_id: Id<UserMarker>) -> Self {
		Self { guild_id, user_id }
	}
}

impl fmt::Display for MemberRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} in guild {}", self.user_id, self.guild_id)
	}
}

/// A failed request to the platform
#[derive(Debug, Diagnostic)]
pub enum PlatformError {
	/// The bot isn't allowed to perform the request.
	PermissionDenied(BoxedError),
	/// Any other failure (network, rate limits, server errors, malformed responses). These aren't retried here.
	Transient(BoxedError),
}

impl PlatformError {
	pub fn is_permission_denied(&self) -> bool {
		matches!(self, Self::PermissionDenied(_))
	}
}

impl From<twilight_http::Error> for PlatformError {
	fn from(error: twilight_http::Error) -> Self {
		if let ErrorType::Response { status, .. } = error.kind() {
			if *status == StatusCode::FORBIDDEN {
				return Self::PermissionDenied(Box::new(error));
			}
		}
		Self::Transient(Box::new(error))
	}
}

impl From<DeserializeBodyError> for PlatformError {
	fn from(error: DeserializeBodyError) -> Self {
		Self::Transient(Box::new(error))
	}
}

impl Error for PlatformError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			Self::PermissionDenied(error) => Some(error.as_ref()),
			Self::Transient(error) => Some(error.as_ref()),
		}
	}
}

impl fmt::Display for PlatformError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::PermissionDenied(error) => write!(f, "permission denied: {}", error),
			Self::Transient(error) => write!(f, "platform request failed: {}", error),
		}
	}
}

/// Reads and removes member roles
#[async_trait]
pub trait RoleClient: Send + Sync {
	/// Gets the roles the platform currently reports for the member. This view may lag behind requests already made.
	async fn member_roles(&self, member: MemberRef) -> Result<Vec<Id<RoleMarker>>, PlatformError>;

	async fn remove_role(&self, member: MemberRef, role_id: Id<RoleMarker>) -> Result<(), PlatformError>;
}

/// Sends plain text messages to a channel
#[async_trait]
pub trait MessageClient: Send + Sync {
	async fn send_message(&self, channel_id: Id<ChannelMarker>, content: &str) -> Result<(), PlatformError>;
}

/// A wait point. Waits always go through this so tests can observe them instead of sleeping.
#[async_trait]
pub trait Delay: Send + Sync {
	async fn delay(&self, duration: Duration);
}

/// Waits using the tokio timer
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
	async fn delay(&self, duration: Duration) {
		tokio::time::sleep(duration).await;
	}
}

#[async_trait]
impl<T: RoleClient + ?Sized> RoleClient for &T {
	async fn member_roles(&self, member: MemberRef) -> Result<Vec<Id<RoleMarker>>, PlatformError> {
		(**self).member_roles(member).await
	}

	async fn remove_role(&self, member: MemberRef, role_id: Id<RoleMarker>) -> Result<(), PlatformError> {
		(**self).remove_role(member, role_id).await
	}
}

#[async_trait]
impl<T: MessageClient + ?Sized> MessageClient for &T {
	async fn send_message(&self, channel_id: Id<ChannelMarker>, content: &str) -> Result<(), PlatformError> {
		(**self).send_message(channel_id, content).await
	}
}

#[async_trait]
impl<T: Delay + ?Sized> Delay for &T {
	async fn delay(&self, duration: Duration) {
		(**self).delay(duration).await
	}
}

/// The Discord platform, backed by the twilight HTTP client.
///
/// When a gateway cache is attached, member roles are read from it first, which is where the lag between a role
/// removal and the member reflecting it shows up. Members missing from the cache are fetched over HTTP.
#[derive(Clone)]
pub struct DiscordPlatform {
	http_client: Arc<Client>,
	cache: Option<Arc<DefaultInMemoryCache>>,
}

impl DiscordPlatform {
	pub fn new(http_client: Arc<Client>) -> Self {
		Self {
			http_client,
			cache: None,
		}
	}

	/// Creates a platform with a new HTTP client authenticated with the configured bot token
	pub fn from_config(config: &ConfigData) -> Self {
		Self::new(Arc::new(Client::new(config.discord.bot_token.clone())))
	}

	pub fn with_cache(mut self, cache: Arc<DefaultInMemoryCache>) -> Self {
		self.cache = Some(cache);
		self
	}

	pub fn http_client(&self) -> &Client {
		&self.http_client
	}
}

#[async_trait]
impl RoleClient for DiscordPlatform {
	async fn member_roles(&self, member: MemberRef) -> Result<Vec<Id<RoleMarker>>, PlatformError> {
		let cached_roles = self.cache.as_ref().and_then(|cache| {
			cache
				.member(member.guild_id, member.user_id)
				.map(|cached_member| cached_member.roles().to_vec())
		});
		if let Some(roles) = cached_roles {
			return Ok(roles);
		}

		let member_response = self.http_client.guild_member(member.guild_id, member.user_id).await?;
		let guild_member = member_response.model().await?;
		Ok(guild_member.roles)
	}

	async fn remove_role(&self, member: MemberRef, role_id: Id<RoleMarker>) -> Result<(), PlatformError> {
		self.http_client
			.remove_guild_member_role(member.guild_id, member.user_id, role_id)
			.await?;
		Ok(())
	}
}

#[async_trait]
impl MessageClient for DiscordPlatform {
	async fn send_message(&self, channel_id: Id<ChannelMarker>, content: &str) -> Result<(), PlatformError> {
		self.http_client.create_message(channel_id).content(content).await?;
		Ok(())
	}
}
