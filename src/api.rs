// © 2025 The fluxx-helpers Developers
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Requests to JSON web APIs that authenticate with a Mashape API key.

use crate::config::ConfigData;
use miette::{Diagnostic, bail};
use reqwest::header::{ACCEPT, HeaderMap};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::error::Error;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const API_KEY_HEADER: &str = "X-Mashape-Key";

#[derive(Clone)]
pub struct ApiClient {
	http_client: reqwest::Client,
	api_key: String,
}

impl ApiClient {
	pub fn new(api_key: impl Into<String>) -> Self {
		Self {
			http_client: reqwest::Client::new(),
			api_key: api_key.into(),
		}
	}

	pub fn from_config(config: &ConfigData) -> miette::Result<Self> {
		let Some(api_key) = &config.credentials.mashape_api_key else {
			bail!("No Mashape API key is configured");
		};
		Ok(Self::new(api_key.clone()))
	}

	/// Starts a request to the endpoint with the API key and JSON accept headers set and the default timeout
	pub fn request(&self, method: Method, endpoint: &str) -> ApiRequest {
		let builder = self
			.http_client
			.request(method, endpoint)
			.header(API_KEY_HEADER, &self.api_key)
			.header(ACCEPT, "application/json")
			.timeout(DEFAULT_TIMEOUT);
		ApiRequest {
			builder,
			endpoint: endpoint.to_string(),
		}
	}

	pub fn get(&self, endpoint: &str) -> ApiRequest {
		self.request(Method::GET, endpoint)
	}
}

/// A response as received, for endpoints that don't return JSON
#[derive(Debug)]
pub struct RawResponse {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Vec<u8>,
}

pub struct ApiRequest {
	builder: RequestBuilder,
	endpoint: String,
}

impl ApiRequest {
	/// Limits how long the whole request, including reading the body, may take
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.builder = self.builder.timeout(timeout);
		self
	}

	pub fn query<T: Serialize + ?Sized>(mut self, query: &T) -> Self {
		self.builder = self.builder.query(query);
		self
	}

	pub fn header(mut self, name: &'static str, value: &str) -> Self {
		self.builder = self.builder.header(name, value);
		self
	}

	pub async fn json<T: DeserializeOwned>(self) -> Result<T, ApiError> {
		let endpoint = self.endpoint.clone();
		let body = self.text().await?;
		serde_json::from_str(&body).map_err(|error| {
			tracing::info!(%endpoint, source = ?error, "Wasn't able to load API url");
			ApiError::Decode(error)
		})
	}

	pub async fn text(self) -> Result<String, ApiError> {
		let endpoint = self.endpoint;
		let result = async { self.builder.send().await?.text().await }.await;
		result.map_err(|error| ApiError::from_request(&endpoint, error))
	}

	pub async fn raw(self) -> Result<RawResponse, ApiError> {
		let endpoint = self.endpoint;
		let result = async {
			let response = self.builder.send().await?;
			let status = response.status();
			let headers = response.headers().clone();
			let body = response.bytes().await?.to_vec();
			Ok::<_, reqwest::Error>(RawResponse { status, headers, body })
		}
		.await;
		result.map_err(|error| ApiError::from_request(&endpoint, error))
	}
}

#[derive(Debug, Diagnostic)]
pub enum ApiError {
	Timeout(reqwest::Error),
	Http(reqwest::Error),
	Decode(serde_json::Error),
}

impl ApiError {
	fn from_request(endpoint: &str, error: reqwest::Error) -> Self {
		if error.is_timeout() {
			tracing::info!(%endpoint, "Wasn't able to load API url");
			Self::Timeout(error)
		} else {
			Self::Http(error)
		}
	}

	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Timeout(_))
	}
}

impl Error for ApiError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			Self::Timeout(error) => Some(error),
			Self::Http(error) => Some(error),
			Self::Decode(error) => Some(error),
		}
	}
}

impl fmt::Display for ApiError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Timeout(_) => write!(f, "API request timed out"),
			Self::Http(error) => write!(f, "API request failed: {}", error),
			Self::Decode(error) => write!(f, "API response wasn't valid JSON: {}", error),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn built(request: ApiRequest) -> reqwest::Request {
		request.builder.build().unwrap()
	}

	#[test]
	fn requests_carry_key_and_accept_headers() {
		let client = ApiClient::new("secret-key");
		let request = built(client.get("https://example.com/jokes").query(&[("category", "dad")]));

		assert_eq!(request.method(), Method::GET);
		assert_eq!(request.url().as_str(), "https://example.com/jokes?category=dad");
		assert_eq!(request.headers()[API_KEY_HEADER], "secret-key");
		assert_eq!(request.headers()[ACCEPT], "application/json");
		assert_eq!(request.timeout(), Some(&DEFAULT_TIMEOUT));
	}

	#[test]
	fn timeout_can_be_overridden() {
		let client = ApiClient::new("secret-key");
		let request = built(
			client
				.request(Method::POST, "https://example.com/translate")
				.timeout(Duration::from_secs(12)),
		);
		assert_eq!(request.method(), Method::POST);
		assert_eq!(request.timeout(), Some(&Duration::from_secs(12)));
	}

	#[test]
	fn config_without_key_is_rejected() {
		let mut config: ConfigData = serde_json::from_value(json!({
			"discord": { "bot_token": "token" },
			"logging": { "log_file_name": "bot.log" }
		}))
		.unwrap();
		assert!(ApiClient::from_config(&config).is_err());

		config.credentials.mashape_api_key = Some(String::from("key"));
		assert!(ApiClient::from_config(&config).is_ok());
	}
}
