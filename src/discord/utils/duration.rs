// © 2025 The fluxx-helpers Developers
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::time::Duration;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;

/// Formats a duration as weeks, days, hours, minutes, and seconds. Sub-second precision is dropped.
pub fn format_duration(duration: Duration) -> String {
	let mut seconds = duration.as_secs();
	let weeks = seconds / WEEK;
	seconds %= WEEK;
	let days = seconds / DAY;
	seconds %= DAY;
	let hours = seconds / HOUR;
	seconds %= HOUR;
	let minutes = seconds / MINUTE;
	seconds %= MINUTE;

	format!(
		"{} weeks, {} days, {} hours, {} minutes, and {} seconds",
		weeks, days, hours, minutes, seconds
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn formats_every_unit() {
		let duration = Duration::from_secs(2 * WEEK + 3 * DAY + 4 * HOUR + 5 * MINUTE + 6);
		assert_eq!(
			format_duration(duration),
			"2 weeks, 3 days, 4 hours, 5 minutes, and 6 seconds"
		);
	}

	#[test]
	fn zero_and_fractional() {
		assert_eq!(
			format_duration(Duration::from_millis(999)),
			"0 weeks, 0 days, 0 hours, 0 minutes, and 0 seconds"
		);
		assert_eq!(
			format_duration(Duration::from_secs(DAY - 1)),
			"0 weeks, 0 days, 23 hours, 59 minutes, and 59 seconds"
		);
	}
}
