// © 2025 The fluxx-helpers Developers
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use miette::IntoDiagnostic;
use std::collections::HashMap;
use std::future::IntoFuture;
use twilight_http::client::Client;
use twilight_http::error::ErrorType;
use twilight_http::response::StatusCode;
use twilight_model::guild::{Permissions, Role};
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, RoleMarker, UserMarker};
use twilight_util::permission_calculator::PermissionCalculator;

/// Checks whether the bot can add and remove roles of the given member from the given channel.
///
/// The bot needs Manage Roles in the channel, and its highest role has to sit above the member's highest role.
pub async fn can_manage_member_roles(
	http_client: &Client,
	guild_id: Id<GuildMarker>,
	channel_id: Id<ChannelMarker>,
	user_id: Id<UserMarker>,
) -> miette::Result<bool> {
	let self_user = http_client
		.current_user()
		.await
		.into_diagnostic()?
		.model()
		.await
		.into_diagnostic()?;

	let self_member_future = http_client.guild_member(guild_id, self_user.id).into_future();
	let target_member_future = http_client.guild_member(guild_id, user_id).into_future();
	let channel_data_future = http_client.channel(channel_id).into_future();
	let guild_roles_future = http_client.roles(guild_id).into_future();
	let (self_member, target_member, channel_data, guild_roles) = tokio::join!(
		self_member_future,
		target_member_future,
		channel_data_future,
		guild_roles_future
	);

	let self_member = self_member.into_diagnostic()?.model().await.into_diagnostic()?;
	let target_member = target_member.into_diagnostic()?.model().await.into_diagnostic()?;
	let guild_roles = guild_roles.into_diagnostic()?.models().await.into_diagnostic()?;

	let channel_data = match channel_data {
		Ok(response) => response.model().await.into_diagnostic()?,
		Err(error) => {
			if let ErrorType::Response { status, .. } = error.kind() {
				if *status == StatusCode::FORBIDDEN {
					return Ok(false);
				}
			}
			return Err(error).into_diagnostic();
		}
	};

	let member_roles = roles_with_permissions(&self_member.roles, &guild_roles);
	let everyone_role_id: Id<RoleMarker> = guild_id.cast();
	let everyone_permissions = guild_roles
		.iter()
		.find(|role| role.id == everyone_role_id)
		.map(|role| role.permissions)
		.unwrap_or_else(Permissions::empty);
	let channel_permission_overwrites = channel_data.permission_overwrites.unwrap_or_default();

	let calculator = PermissionCalculator::new(guild_id, self_user.id, everyone_permissions, &member_roles);
	let permissions = calculator.in_channel(channel_data.kind, &channel_permission_overwrites);
	if !permissions.contains(Permissions::MANAGE_ROLES) {
		return Ok(false);
	}

	let positions: HashMap<Id<RoleMarker>, i64> = guild_roles.iter().map(|role| (role.id, role.position)).collect();
	Ok(outranks(&self_member.roles, &target_member.roles, &positions))
}

fn roles_with_permissions(member_roles: &[Id<RoleMarker>], guild_roles: &[Role]) -> Vec<(Id<RoleMarker>, Permissions)> {
	let role_permissions: HashMap<Id<RoleMarker>, Permissions> =
		guild_roles.iter().map(|role| (role.id, role.permissions)).collect();
	member_roles
		.iter()
		.map(|role_id| {
			(
				*role_id,
				role_permissions
					.get(role_id)
					.copied()
					.unwrap_or_else(Permissions::empty),
			)
		})
		.collect()
}

/// Gets the position of the highest of the given roles. Members with no roles only have @everyone, at position 0.
pub fn top_role_position(roles: &[Id<RoleMarker>], positions: &HashMap<Id<RoleMarker>, i64>) -> i64 {
	roles
		.iter()
		.filter_map(|role_id| positions.get(role_id))
		.copied()
		.max()
		.unwrap_or(0)
}

/// Checks whether the highest role of `actor_roles` is strictly above the highest role of `target_roles`
pub fn outranks(
	actor_roles: &[Id<RoleMarker>],
	target_roles: &[Id<RoleMarker>],
	positions: &HashMap<Id<RoleMarker>, i64>,
) -> bool {
	top_role_position(actor_roles, positions) > top_role_position(target_roles, positions)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn positions() -> HashMap<Id<RoleMarker>, i64> {
		[(Id::new(1), 1), (Id::new(2), 5), (Id::new(3), 9)].into_iter().collect()
	}

	#[test]
	fn top_position_uses_highest_role() {
		assert_eq!(top_role_position(&[Id::new(1), Id::new(3), Id::new(2)], &positions()), 9);
		assert_eq!(top_role_position(&[], &positions()), 0);
		assert_eq!(top_role_position(&[Id::new(77)], &positions()), 0);
	}

	#[test]
	fn outranking_is_strict() {
		let positions = positions();
		assert!(outranks(&[Id::new(3)], &[Id::new(1), Id::new(2)], &positions));
		assert!(!outranks(&[Id::new(2)], &[Id::new(2)], &positions));
		assert!(!outranks(&[Id::new(1)], &[Id::new(2)], &positions));
		assert!(outranks(&[Id::new(1)], &[], &positions));
	}
}
