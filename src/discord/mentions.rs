// © 2025 The fluxx-helpers Developers
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use miette::IntoDiagnostic;
use twilight_http::client::Client;
use twilight_mention::fmt::Mention;
use twilight_mention::parse::ParseMention;
use twilight_model::guild::Role;
use twilight_model::id::Id;
use twilight_model::id::marker::{GuildMarker, RoleMarker, UserMarker};

/// Both forms Discord uses when mentioning the bot user: `<@id>` and the nickname form `<@!id>`
fn bot_mentions(bot_id: Id<UserMarker>) -> [String; 2] {
	[format!("{}", bot_id.mention()), format!("<@!{}>", bot_id)]
}

/// Checks whether a message is addressed to the bot as a command, i.e. starts with a mention of the bot
pub fn is_command(content: &str, bot_id: Id<UserMarker>) -> bool {
	let content = content.trim().to_lowercase();
	bot_mentions(bot_id)
		.iter()
		.any(|mention| content.starts_with(mention.as_str()))
}

/// Gets the command text following the bot mention at the start of the message.
/// Returns `None` if the message doesn't start with a mention of the bot.
pub fn strip_bot_mention(content: &str, bot_id: Id<UserMarker>) -> Option<&str> {
	let content = content.trim_start();
	bot_mentions(bot_id)
		.iter()
		.find_map(|mention| content.strip_prefix(mention.as_str()))
		.map(str::trim_start)
}

/// Finds the first role mention in the text and returns its ID if it's one of the guild's roles
pub fn role_from_mention(
	text: &str,
	guild_roles: impl IntoIterator<Item = Id<RoleMarker>>,
) -> Option<Id<RoleMarker>> {
	let (role_id, _, _) = Id::<RoleMarker>::iter(text.trim()).next()?;
	guild_roles.into_iter().any(|id| id == role_id).then_some(role_id)
}

/// Looks up the guild role mentioned in the text
pub async fn find_mentioned_role(
	http_client: &Client,
	guild_id: Id<GuildMarker>,
	text: &str,
) -> miette::Result<Option<Role>> {
	let guild_roles = http_client
		.roles(guild_id)
		.await
		.into_diagnostic()?
		.models()
		.await
		.into_diagnostic()?;
	let Some(role_id) = role_from_mention(text, guild_roles.iter().map(|role| role.id)) else {
		return Ok(None);
	};
	Ok(guild_roles.into_iter().find(|role| role.id == role_id))
}
