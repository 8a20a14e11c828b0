pub mod deployments;
pub mod logs;
pub mod traces;
pub mod tracking;

mod error;

pub use error::{Error, Result};

use std::time::Duration;

use reqwest::{
	Client, RequestBuilder, StatusCode, Url,
	header::{AUTHORIZATION, HeaderMap, HeaderName},
};
use serde_json::{Map, Value};

use clue_config::ProviderConfig;

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

/// Joins percent-encoded path segments onto the provider base URL.
pub fn endpoint<'a, I>(cfg: &ProviderConfig, segments: I) -> Result<Url>
where
	I: IntoIterator<Item = &'a str>,
{
	let mut url = Url::parse(&cfg.api_base).map_err(|err| Error::InvalidConfig {
		message: format!("Invalid api_base {:?}: {err}.", cfg.api_base),
	})?;

	url.path_segments_mut()
		.map_err(|_| Error::InvalidConfig {
			message: format!("api_base {:?} cannot carry a path.", cfg.api_base),
		})?
		.pop_if_empty()
		.extend(segments);

	Ok(url)
}

pub(crate) fn client(cfg: &ProviderConfig) -> Result<Client> {
	Ok(Client::builder()
		.timeout(Duration::from_millis(cfg.timeout_ms))
		.default_headers(auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.build()?)
}

pub(crate) async fn send_json(request: RequestBuilder, resource: &str) -> Result<Value> {
	let res = request.send().await?;
	let status = res.status();

	if status == StatusCode::NOT_FOUND {
		return Err(Error::NotFound { resource: resource.to_string() });
	}
	if !status.is_success() {
		return Err(Error::Status { status: status.as_u16(), resource: resource.to_string() });
	}

	let bytes = res.bytes().await?;

	Ok(serde_json::from_slice(&bytes)?)
}

/// Accepts either a bare array or an object wrapping the array under one of `keys`.
pub(crate) fn unwrap_array(json: Value, keys: &[&str], what: &str) -> Result<Vec<Value>> {
	match json {
		Value::Array(items) => Ok(items),
		Value::Object(mut map) => keys
			.iter()
			.find_map(|key| match map.remove(*key) {
				Some(Value::Array(items)) => Some(items),
				_ => None,
			})
			.ok_or_else(|| Error::InvalidResponse {
				message: format!("{what} response is missing its array."),
			}),
		_ => Err(Error::InvalidResponse { message: format!("{what} response must be JSON.") }),
	}
}
