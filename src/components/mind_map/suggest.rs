use serde::{Deserialize, Serialize};
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

use super::error::MindMapError;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SuggestError {
	#[error("network error: {0}")]
	Network(String),
	#[error("suggestion service answered with status {0}")]
	Status(u16),
	#[error("unexpected suggestion response: {0}")]
	BadResponse(String),
}

impl SuggestError {
	fn network(err: JsValue) -> Self {
		Self::Network(format!("{err:?}"))
	}
}

/// A central topic, trimmed and known to be non-empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Topic(String);

impl Topic {
	pub fn parse(raw: &str) -> Result<Self, MindMapError> {
		match raw.trim() {
			"" => Err(MindMapError::EmptyTopic),
			topic => Ok(Self(topic.to_owned())),
		}
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

#[derive(Serialize)]
struct SuggestRequest<'a> {
	topic: &'a str,
}

#[derive(Deserialize)]
struct SuggestResponse {
	suggestions: Vec<String>,
}

/// Interpret a finished HTTP exchange.
pub fn parse_response(status: u16, body: &str) -> Result<Vec<String>, SuggestError> {
	if !(200..300).contains(&status) {
		return Err(SuggestError::Status(status));
	}
	serde_json::from_str::<SuggestResponse>(body)
		.map(|r| r.suggestions)
		.map_err(|e| SuggestError::BadResponse(e.to_string()))
}

/// POST `{ "topic": ... }` to the endpoint and return the ordered suggestions.
pub async fn fetch_suggestions(endpoint: &str, topic: &Topic) -> Result<Vec<String>, SuggestError> {
	let payload = serde_json::to_string(&SuggestRequest { topic: topic.as_str() })
		.map_err(|e| SuggestError::BadResponse(e.to_string()))?;

	let init = RequestInit::new();
	init.set_method("POST");
	init.set_body(&JsValue::from_str(&payload));
	let request = Request::new_with_str_and_init(endpoint, &init).map_err(SuggestError::network)?;
	request
		.headers()
		.set("Content-Type", "application/json")
		.map_err(SuggestError::network)?;

	let window = web_sys::window().ok_or_else(|| SuggestError::Network("no window".into()))?;
	let response: Response = JsFuture::from(window.fetch_with_request(&request))
		.await
		.map_err(SuggestError::network)?
		.dyn_into()
		.map_err(SuggestError::network)?;
	let body = JsFuture::from(response.text().map_err(SuggestError::network)?)
		.await
		.map_err(SuggestError::network)?
		.as_string()
		.unwrap_or_default();

	parse_response(response.status(), &body)
}
