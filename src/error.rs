use axum::{
	response::{IntoResponse, Response},
	Json,
};
use hyper::StatusCode;
use serde_json::json;

use crate::store::StoreError;

pub type ApiResult = Result<Response, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
	#[error("{0}")]
	NotFound(&'static str),
	#[error("{0}")]
	Conflict(&'static str),
	#[error("{0}")]
	BadRequest(String),
	#[error("{0}")]
	Unauthorized(&'static str),
	#[error(transparent)]
	Store(#[from] StoreError),
}

impl ApiError {
	pub fn status(&self) -> StatusCode {
		match self {
			ApiError::NotFound(_) => StatusCode::NOT_FOUND,
			ApiError::Conflict(_) => StatusCode::CONFLICT,
			ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
			ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
			// store failures are reported to the caller as a bad request
			ApiError::Store(_) => StatusCode::BAD_REQUEST,
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = self.status();
		match &self {
			ApiError::Store(err) => log::warn!("store error: {}", err),
			other => log::debug!("{} {}", status.as_u16(), other),
		}
		(status, Json(json!({"status": "error", "message": self.to_string()}))).into_response()
	}
}

/// `{"status": "success", "data": ...}`
pub fn success(status: StatusCode, data: impl serde::Serialize) -> Response {
	(status, Json(json!({"status": "success", "data": data}))).into_response()
}

/// `{"status": "success", "message": ...}`
pub fn success_message(message: String) -> Response {
	(StatusCode::OK, Json(json!({"status": "success", "message": message}))).into_response()
}
