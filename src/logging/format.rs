// © 2025 The fluxx-helpers Developers
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::Local;
use std::fmt::{self, Write};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Formats events as `<local time>: <LEVEL>: <target>: <message and fields>`
#[derive(Clone, Copy, Debug, Default)]
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
	S: Subscriber + for<'a> LookupSpan<'a>,
	N: for<'a> FormatFields<'a> + 'static,
{
	fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
		let metadata = event.metadata();
		write!(
			writer,
			"{}: {}: {}: ",
			Local::now().format(TIMESTAMP_FORMAT),
			metadata.level(),
			metadata.target()
		)?;
		ctx.field_format().format_fields(writer.by_ref(), event)?;
		writeln!(writer)
	}
}

/// Renders an event the same way [LineFormat] does, without needing a subscriber context
pub(super) fn render_event(event: &Event<'_>) -> String {
	let metadata = event.metadata();
	let mut visitor = FieldCollector::default();
	event.record(&mut visitor);
	format!(
		"{}: {}: {}: {}{}",
		Local::now().format(TIMESTAMP_FORMAT),
		metadata.level(),
		metadata.target(),
		visitor.message,
		visitor.fields
	)
}

#[derive(Default)]
struct FieldCollector {
	message: String,
	fields: String,
}

impl Visit for FieldCollector {
	fn record_str(&mut self, field: &Field, value: &str) {
		if field.name() == "message" {
			self.message.push_str(value);
		} else {
			let _ = write!(self.fields, " {}={}", field.name(), value);
		}
	}

	fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
		if field.name() == "message" {
			let _ = write!(self.message, "{:?}", value);
		} else {
			let _ = write!(self.fields, " {}={:?}", field.name(), value);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io;
	use std::sync::{Arc, Mutex};
	use tracing_subscriber::layer::SubscriberExt;

	#[derive(Clone, Default)]
	struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

	impl io::Write for SharedBuffer {
		fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
			self.0.lock().unwrap().extend_from_slice(buf);
			Ok(buf.len())
		}

		fn flush(&mut self) -> io::Result<()> {
			Ok(())
		}
	}

	#[test]
	fn lines_have_level_target_and_message() {
		let buffer = SharedBuffer::default();
		let writer = buffer.clone();
		let layer = tracing_subscriber::fmt::layer()
			.event_format(LineFormat)
			.with_ansi(false)
			.with_writer(move || writer.clone());
		let subscriber = tracing_subscriber::registry().with(layer);

		tracing::subscriber::with_default(subscriber, || {
			tracing::warn!(target: "fluxx", attempts = 3, "Removing roles took a while");
		});

		let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
		assert!(output.ends_with("\n"));
		let (_timestamp, rest) = output.split_once(": ").unwrap();
		assert_eq!(rest.trim_end(), "WARN: fluxx: Removing roles took a while attempts=3");
	}
}
