// © 2025 The fluxx-helpers Developers
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub mod mentions;
pub mod messages;
pub mod platform;
pub mod roles;
pub mod utils;

pub use messages::{ChunkError, MessageChunker, MessagePayload};
pub use platform::{DiscordPlatform, MemberRef, PlatformError};
pub use roles::{RetryOutcome, RoleReconciler};
