// © 2025 The fluxx-helpers Developers
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::platform::{Delay, MemberRef, PlatformError, RoleClient, TokioDelay};
use std::time::Duration;
use twilight_model::id::Id;
use twilight_model::id::marker::RoleMarker;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_ATTEMPT_DELAY: Duration = Duration::from_millis(100);

/// The result of removing a set of roles from a member
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RetryOutcome {
	/// The number of rounds of removal requests that were issued.
	pub attempts: u32,
	/// The target roles the member still had after the final check. Empty when all of them were removed.
	pub remaining: Vec<Id<RoleMarker>>,
}

impl RetryOutcome {
	pub fn is_complete(&self) -> bool {
		self.remaining.is_empty()
	}
}

/// Removes roles from members until the member no longer reports having any of them.
///
/// A single removal request isn't reliably reflected the next time the member is read, so each round removes
/// whatever target roles are still reported, then waits before checking again.
pub struct RoleReconciler<C, D = TokioDelay> {
	client: C,
	delay: D,
	max_attempts: u32,
	attempt_delay: Duration,
}

impl<C: RoleClient> RoleReconciler<C> {
	pub fn new(client: C) -> Self {
		Self {
			client,
			delay: TokioDelay,
			max_attempts: DEFAULT_MAX_ATTEMPTS,
			attempt_delay: DEFAULT_ATTEMPT_DELAY,
		}
	}
}

impl<C: RoleClient, D: Delay> RoleReconciler<C, D> {
	pub fn with_delay<E: Delay>(self, delay: E) -> RoleReconciler<C, E> {
		RoleReconciler {
			client: self.client,
			delay,
			max_attempts: self.max_attempts,
			attempt_delay: self.attempt_delay,
		}
	}

	pub fn max_attempts(mut self, max_attempts: u32) -> Self {
		self.max_attempts = max_attempts;
		self
	}

	pub fn attempt_delay(mut self, attempt_delay: Duration) -> Self {
		self.attempt_delay = attempt_delay;
		self
	}

	/// Removes all of `roles` from the member.
	///
	/// Running out of attempts isn't an error; check [RetryOutcome::is_complete] on the result. Any failed request
	/// (including the bot lacking permission to manage the member's roles) aborts immediately.
	pub async fn reconcile(&self, member: MemberRef, roles: &[Id<RoleMarker>]) -> Result<RetryOutcome, PlatformError> {
		let mut attempts = 0;
		loop {
			let current_roles = self.client.member_roles(member).await?;
			let present = roles_still_present(&current_roles, roles);

			if present.is_empty() {
				tracing::info!(%member, attempts, "Removing roles from user took {} attempts", attempts);
				return Ok(RetryOutcome {
					attempts,
					remaining: present,
				});
			}
			if attempts >= self.max_attempts {
				tracing::warn!(%member, attempts, remaining = ?present, "Gave up removing roles from user");
				return Ok(RetryOutcome {
					attempts,
					remaining: present,
				});
			}

			attempts += 1;
			for role_id in present {
				self.client.remove_role(member, role_id).await?;
			}
			self.delay.delay(self.attempt_delay).await;
		}
	}
}

/// Gets the roles from `targets` that are in `current`, in the order they appear in `targets`
fn roles_still_present(current: &[Id<RoleMarker>], targets: &[Id<RoleMarker>]) -> Vec<Id<RoleMarker>> {
	let mut present: Vec<Id<RoleMarker>> = Vec::new();
	for role_id in targets {
		if current.contains(role_id) && !present.contains(role_id) {
			present.push(*role_id);
		}
	}
	present
}
