// © 2025 The fluxx-helpers Developers
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::platform::{Delay, MessageClient, PlatformError, TokioDelay};
use miette::Diagnostic;
use std::error::Error;
use std::fmt;
use std::num::NonZeroUsize;
use std::time::Duration;
use twilight_model::id::Id;
use twilight_model::id::marker::ChannelMarker;
use twilight_validate::message::MESSAGE_CONTENT_LENGTH_MAX;

pub const DEFAULT_MESSAGE_DELAY: Duration = Duration::from_millis(500);

/// Text to be sent as one or more messages
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MessagePayload {
	/// A single piece of text, split as needed to fit the message length limit
	Text(String),
	/// Text that's already been split. Each part is sent as its own message and is never split further, so parts
	/// that are too long will fail to send.
	Parts(Vec<String>),
}

impl From<String> for MessagePayload {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}

impl From<&str> for MessagePayload {
	fn from(text: &str) -> Self {
		Self::Text(text.to_string())
	}
}

impl From<Vec<String>> for MessagePayload {
	fn from(parts: Vec<String>) -> Self {
		Self::Parts(parts)
	}
}

#[derive(Debug, Diagnostic)]
pub enum ChunkError {
	/// The prepended and appended text leave no room for message content.
	Configuration { max_len: usize, decoration_len: usize },
	Platform(PlatformError),
}

impl From<PlatformError> for ChunkError {
	fn from(error: PlatformError) -> Self {
		Self::Platform(error)
	}
}

impl Error for ChunkError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			Self::Configuration { .. } => None,
			Self::Platform(error) => Some(error),
		}
	}
}

impl fmt::Display for ChunkError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Configuration {
				max_len,
				decoration_len,
			} => write!(
				f,
				"{} characters of prepended and appended text leave no room in a {} character message",
				decoration_len, max_len
			),
			Self::Platform(error) => write!(f, "failed to send message part: {}", error),
		}
	}
}

/// Sends text that may be longer than the platform allows in one message.
///
/// Every part is wrapped in the same prepended and appended text, and each send is preceded by a pause (including the
/// first) to stay clear of rate limits. Parts are sent one at a time in order; the first failure stops the rest, and
/// parts already sent stay sent.
pub struct MessageChunker<C, D = TokioDelay> {
	client: C,
	delay: D,
	prepend: String,
	append: String,
	max_len: usize,
	message_delay: Duration,
}

impl<C: MessageClient> MessageChunker<C> {
	pub fn new(client: C) -> Self {
		Self {
			client,
			delay: TokioDelay,
			prepend: String::new(),
			append: String::new(),
			max_len: MESSAGE_CONTENT_LENGTH_MAX,
			message_delay: DEFAULT_MESSAGE_DELAY,
		}
	}
}

impl<C: MessageClient, D: Delay> MessageChunker<C, D> {
	pub fn with_delay<E: Delay>(self, delay: E) -> MessageChunker<C, E> {
		MessageChunker {
			client: self.client,
			delay,
			prepend: self.prepend,
			append: self.append,
			max_len: self.max_len,
			message_delay: self.message_delay,
		}
	}

	pub fn prepend(mut self, prepend: impl Into<String>) -> Self {
		self.prepend = prepend.into();
		self
	}

	pub fn append(mut self, append: impl Into<String>) -> Self {
		self.append = append.into();
		self
	}

	pub fn max_len(mut self, max_len: usize) -> Self {
		self.max_len = max_len;
		self
	}

	pub fn message_delay(mut self, message_delay: Duration) -> Self {
		self.message_delay = message_delay;
		self
	}

	/// Gets the number of payload characters that fit in each message alongside the decoration
	pub fn chunk_budget(&self) -> Result<NonZeroUsize, ChunkError> {
		let decoration_len = self.prepend.chars().count() + self.append.chars().count();
		self.max_len
			.checked_sub(1)
			.and_then(|len| len.checked_sub(decoration_len))
			.and_then(NonZeroUsize::new)
			.ok_or(ChunkError::Configuration {
				max_len: self.max_len,
				decoration_len,
			})
	}

	/// Produces the decorated messages for a payload without sending anything
	pub fn prepare(&self, payload: &MessagePayload) -> Result<Vec<String>, ChunkError> {
		let budget = self.chunk_budget()?;
		let messages = match payload {
			MessagePayload::Text(text) => split_message(text, budget)
				.into_iter()
				.map(|part| self.decorate(part))
				.collect(),
			MessagePayload::Parts(parts) => parts.iter().map(|part| self.decorate(part)).collect(),
		};
		Ok(messages)
	}

	/// Sends the payload to the channel, returning the number of messages sent
	pub async fn send(
		&self,
		channel_id: Id<ChannelMarker>,
		payload: impl Into<MessagePayload>,
	) -> Result<usize, ChunkError> {
		let messages = self.prepare(&payload.into())?;
		for message in messages.iter() {
			self.delay.delay(self.message_delay).await;
			self.client.send_message(channel_id, message).await?;
		}
		tracing::debug!(channel = %channel_id, parts = messages.len(), "Sent chunked message");
		Ok(messages.len())
	}

	fn decorate(&self, part: &str) -> String {
		format!("{}{}{}", self.prepend, part, self.append)
	}
}

/// Splits text into consecutive slices of at most `budget` characters each.
///
/// Slices always end on character boundaries, and joining them gives back the original text. Empty text gives no
/// slices.
pub fn split_message(text: &str, budget: NonZeroUsize) -> Vec<&str> {
	let budget = budget.get();
	let mut parts = Vec::new();
	let mut start = 0;
	let mut count = 0;
	for (index, _) in text.char_indices() {
		if count == budget {
			parts.push(&text[start..index]);
			start = index;
			count = 0;
		}
		count += 1;
	}
	if start < text.len() {
		parts.push(&text[start..]);
	}
	parts
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use std::sync::Mutex;

	#[derive(Debug, Eq, PartialEq)]
	enum Call {
		Wait(Duration),
		Send(Id<ChannelMarker>, String),
	}

	/// Records sends and waits in the order they happen
	#[derive(Default)]
	struct RecordingChannel {
		calls: Mutex<Vec<Call>>,
		fail_on_send: Option<usize>,
	}

	impl RecordingChannel {
		fn failing_on(send_number: usize) -> Self {
			Self {
				fail_on_send: Some(send_number),
				..Self::default()
			}
		}

		fn sent(&self) -> Vec<String> {
			self.calls
				.lock()
				.unwrap()
				.iter()
				.filter_map(|call| match call {
					Call::Send(_, content) => Some(content.clone()),
					Call::Wait(_) => None,
				})
				.collect()
		}
	}

	#[async_trait]
	impl MessageClient for RecordingChannel {
		async fn send_message(&self, channel_id: Id<ChannelMarker>, content: &str) -> Result<(), PlatformError> {
			let mut calls = self.calls.lock().unwrap();
			let sends_so_far = calls.iter().filter(|call| matches!(call, Call::Send(..))).count();
			if self.fail_on_send == Some(sends_so_far + 1) {
				return Err(PlatformError::Transient("Internal Server Error".into()));
			}
			calls.push(Call::Send(channel_id, content.to_string()));
			Ok(())
		}
	}

	#[async_trait]
	impl Delay for RecordingChannel {
		async fn delay(&self, duration: Duration) {
			self.calls.lock().unwrap().push(Call::Wait(duration));
		}
	}

	fn budget(n: usize) -> NonZeroUsize {
		NonZeroUsize::new(n).unwrap()
	}

	#[test]
	fn split_reassembles_exactly() {
		let text = "The quick brown fox jumps over the lazy dog, then naps. ".repeat(37);
		for size in [1, 2, 7, 64, 500, text.len(), text.len() + 1] {
			let parts = split_message(&text, budget(size));
			assert!(parts.iter().all(|part| part.chars().count() <= size));
			assert!(parts.iter().all(|part| !part.is_empty()));
			assert_eq!(parts.concat(), text);
		}
	}

	#[test]
	fn split_counts_characters_not_bytes() {
		let text = "ñ€😀".repeat(5);
		let parts = split_message(&text, budget(4));
		assert_eq!(parts.len(), 4);
		assert_eq!(parts[0], "ñ€😀ñ");
		assert_eq!(parts.concat(), text);
	}

	#[test]
	fn split_empty_text_has_no_parts() {
		assert!(split_message("", budget(10)).is_empty());
	}

	#[test]
	fn budget_accounts_for_decoration() {
		let chunker = MessageChunker::new(RecordingChannel::default())
			.prepend("[bot] ")
			.append("!");
		assert_eq!(chunker.chunk_budget().unwrap().get(), 2000 - 1 - 6 - 1);
	}

	#[tokio::test]
	async fn oversized_decoration_fails_before_sending() {
		let channel = RecordingChannel::default();
		let chunker = MessageChunker::new(&channel)
			.with_delay(&channel)
			.max_len(10)
			.prepend("12345")
			.append("6789");

		let result = chunker.send(Id::new(3), "hello").await;
		assert!(matches!(
			result,
			Err(ChunkError::Configuration {
				max_len: 10,
				decoration_len: 9
			})
		));
		assert!(channel.calls.lock().unwrap().is_empty());
	}

	#[tokio::test]
	async fn long_text_is_sent_in_paced_decorated_parts() {
		let channel = RecordingChannel::default();
		let channel_id = Id::new(42);
		let text = "x".repeat(4500);
		let sent = MessageChunker::new(&channel)
			.with_delay(&channel)
			.prepend("[bot] ")
			.send(channel_id, text.as_str())
			.await
			.unwrap();

		assert_eq!(sent, 3);
		let calls = channel.calls.lock().unwrap();
		assert_eq!(calls.len(), 6);
		for pair in calls.chunks(2) {
			assert_eq!(pair[0], Call::Wait(DEFAULT_MESSAGE_DELAY));
			let Call::Send(id, content) = &pair[1] else {
				panic!("expected a send after each wait, got {:?}", pair[1]);
			};
			assert_eq!(*id, channel_id);
			assert!(content.starts_with("[bot] "));
			assert!(content.chars().count() <= 2000);
		}
		drop(calls);

		let reassembled: String = channel
			.sent()
			.iter()
			.map(|message| message.strip_prefix("[bot] ").unwrap())
			.collect();
		assert_eq!(reassembled, text);
	}

	#[tokio::test]
	async fn pre_split_parts_are_not_resplit() {
		let channel = RecordingChannel::default();
		let parts = vec!["a".repeat(30), String::from("short")];
		MessageChunker::new(&channel)
			.with_delay(&channel)
			.max_len(20)
			.prepend("<")
			.append(">")
			.send(Id::new(1), parts)
			.await
			.unwrap();

		assert_eq!(channel.sent(), vec![format!("<{}>", "a".repeat(30)), String::from("<short>")]);
	}

	#[tokio::test]
	async fn first_failure_stops_remaining_parts() {
		let channel = RecordingChannel::failing_on(2);
		let result = MessageChunker::new(&channel)
			.with_delay(&channel)
			.max_len(11)
			.send(Id::new(1), "a".repeat(35))
			.await;

		assert!(matches!(result, Err(ChunkError::Platform(PlatformError::Transient(_)))));
		assert_eq!(channel.sent(), vec!["a".repeat(10)]);
	}
}
