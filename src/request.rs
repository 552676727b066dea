use axum::{async_trait, body::Bytes, extract::FromRequest, extract::Request};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// A request body read as a JSON object. An empty body reads as `{}`.
pub struct JsonBody(pub Map<String, Value>);

#[async_trait]
impl<S: Send + Sync> FromRequest<S> for JsonBody {
	type Rejection = ApiError;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let bytes = Bytes::from_request(req, state).await.map_err(|e| ApiError::BadRequest(e.body_text()))?;
		parse_body(&bytes).map(JsonBody)
	}
}

fn parse_body(bytes: &[u8]) -> Result<Map<String, Value>, ApiError> {
	if bytes.iter().all(u8::is_ascii_whitespace) {
		return Ok(Map::new());
	}
	match serde_json::from_slice(bytes) {
		Ok(Value::Object(map)) => Ok(map),
		Ok(Value::Null) => Ok(Map::new()),
		Ok(_) => Err(ApiError::BadRequest("request body must be a JSON object".to_string())),
		Err(e) => Err(ApiError::BadRequest(format!("invalid JSON body: {}", e))),
	}
}

/// Ids in paths are integers; anything else cannot name a row.
pub fn parse_id(raw: &str, not_found: &'static str) -> Result<i32, ApiError> {
	raw.parse().map_err(|_| ApiError::NotFound(not_found))
}

/// A present, non-empty string value.
pub fn non_empty_str<'a>(body: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
	body.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}
