// © 2025 The fluxx-helpers Developers
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use miette::Diagnostic;
use std::error::Error;
use std::fmt;

/// Removes the bold, italic, underline, and strikethrough markers (`*`, `_`, `~`) from the text
pub fn remove_discord_formatting(text: &str) -> String {
	text.chars().filter(|c| !matches!(c, '*' | '_' | '~')).collect()
}

/// Puts a word joiner after every backtick so the text can't open or close code formatting
pub fn escape_code_formatting(text: &str) -> String {
	text.replace('`', "`\u{2060}")
}

#[derive(Debug, Diagnostic, Eq, PartialEq)]
pub enum QuoteParseError {
	MissingOpeningQuote,
	QuoteCount { expected: usize, found: usize },
}

impl Error for QuoteParseError {}

impl fmt::Display for QuoteParseError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::MissingOpeningQuote => write!(f, "parameters must start with a double quote"),
			Self::QuoteCount { expected, found } => {
				write!(f, "expected {} double quotes but found {}", expected, found)
			}
		}
	}
}

/// Parses a fixed number of double-quoted parameters, e.g. `"first" "second one"`.
/// Text between and after the quoted parameters is ignored.
pub fn parse_quote_parameters(raw: &str, count: usize) -> Result<Vec<String>, QuoteParseError> {
	let raw = raw.trim();
	if !raw.starts_with('"') {
		return Err(QuoteParseError::MissingOpeningQuote);
	}
	let found = raw.matches('"').count();
	if found != count * 2 {
		return Err(QuoteParseError::QuoteCount {
			expected: count * 2,
			found,
		});
	}

	Ok(raw
		.split('"')
		.skip(1)
		.step_by(2)
		.take(count)
		.map(String::from)
		.collect())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strips_markdown_markers() {
		assert_eq!(remove_discord_formatting("**bold** __under__ ~~gone~~ *it*"), "bold under gone it");
		assert_eq!(remove_discord_formatting("plain"), "plain");
	}

	#[test]
	fn escapes_backticks() {
		assert_eq!(escape_code_formatting("```rust```"), "`\u{2060}`\u{2060}`\u{2060}rust`\u{2060}`\u{2060}`\u{2060}");
		assert_eq!(escape_code_formatting("none"), "none");
	}

	#[test]
	fn parses_quoted_parameters() {
		assert_eq!(
			parse_quote_parameters(r#"  "first" "second one"  "#, 2),
			Ok(vec![String::from("first"), String::from("second one")])
		);
		assert_eq!(parse_quote_parameters(r#""a"and"b""#, 2), Ok(vec![String::from("a"), String::from("b")]));
		assert_eq!(parse_quote_parameters(r#""""#, 1), Ok(vec![String::new()]));
	}

	#[test]
	fn rejects_malformed_parameters() {
		assert_eq!(parse_quote_parameters("first", 1), Err(QuoteParseError::MissingOpeningQuote));
		assert_eq!(
			parse_quote_parameters(r#""first" "second"#, 2),
			Err(QuoteParseError::QuoteCount { expected: 4, found: 3 })
		);
	}
}
