use axum::{extract::State, response::IntoResponse, Json};
use hyper::StatusCode;
use serde_json::json;

use crate::{
	error::{ApiError, ApiResult},
	request::{non_empty_str, JsonBody},
	store::Db,
	users::register_user,
};

/// The one account treated as an administrator.
pub const ADMIN_USERNAME: &str = "admin";

pub async fn register(db: State<Db>, JsonBody(body): JsonBody) -> ApiResult {
	let user = register_user(&db.0, &body).await?;
	Ok((
		StatusCode::CREATED,
		Json(json!({
			"status": "success",
			"message": "User registered successfully.",
			"data": user,
		})),
	)
		.into_response())
}

/// Plain equality check against the stored password.
pub async fn login(db: State<Db>, JsonBody(body): JsonBody) -> ApiResult {
	let (Some(username), Some(password)) = (non_empty_str(&body, "username"), non_empty_str(&body, "password")) else {
		return Err(ApiError::BadRequest("Username and password required".to_string()));
	};
	let Some(user) = db.find_user_by_username(username).await? else {
		return Err(ApiError::Unauthorized("Invalid credentials"));
	};
	if user.password != password {
		return Err(ApiError::Unauthorized("Invalid credentials"));
	}

	let is_admin = user.username == ADMIN_USERNAME;
	log::info!("user {} logged in (admin: {})", user.id, is_admin);
	Ok((
		StatusCode::OK,
		Json(json!({
			"status": "success",
			"user": {
				"id": user.id,
				"username": user.username,
				"email": user.email,
				"isAdmin": is_admin,
			}
		})),
	)
		.into_response())
}
