use axum::extract::{Path, State};
use hyper::StatusCode;
use postgres_from_row::FromRow;
use serde_json::Value;

use crate::{
	error::{success, success_message, ApiError, ApiResult},
	request::{non_empty_str, parse_id, JsonBody},
	store::{Db, StoreError},
};

#[derive(serde::Serialize, FromRow, Debug, Clone, PartialEq)]
pub struct User {
	pub id: i32,
	pub username: String,
	pub email: String,
	#[serde(skip_serializing)]
	pub password: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
	pub username: String,
	pub email: String,
	pub password: String,
}

/// Fields to replace; `None` leaves the column as it is.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
	pub username: Option<String>,
	pub email: Option<String>,
	pub password: Option<String>,
}

impl UserChanges {
	fn from_body(body: &serde_json::Map<String, Value>) -> Result<UserChanges, ApiError> {
		let field = |key: &str| match body.get(key) {
			None => Ok(None),
			Some(Value::String(s)) => Ok(Some(s.clone())),
			Some(_) => Err(ApiError::BadRequest(format!("{} must be a string", key))),
		};
		Ok(UserChanges {
			username: field("username")?,
			email: field("email")?,
			password: field("password")?,
		})
	}

	pub fn is_empty(&self) -> bool {
		self.username.is_none() && self.email.is_none() && self.password.is_none()
	}
}

const USER_NOT_FOUND: &str = "User not found";

pub async fn get_users(db: State<Db>) -> ApiResult {
	let users = db.list_users().await?;
	Ok(success(StatusCode::OK, users))
}

pub async fn get_user(db: State<Db>, Path(id): Path<String>) -> ApiResult {
	let id = parse_id(&id, USER_NOT_FOUND)?;
	let user = db.get_user(id).await?.ok_or(ApiError::NotFound(USER_NOT_FOUND))?;
	Ok(success(StatusCode::OK, user))
}

pub async fn create_user(db: State<Db>, JsonBody(body): JsonBody) -> ApiResult {
	let user = register_user(&db.0, &body).await?;
	Ok(success(StatusCode::CREATED, user))
}

/// Shared by `POST /users` and `POST /api/register`.
pub async fn register_user(db: &Db, body: &serde_json::Map<String, Value>) -> Result<User, ApiError> {
	let (Some(username), Some(email), Some(password)) = (non_empty_str(body, "username"), non_empty_str(body, "email"), non_empty_str(body, "password")) else {
		return Err(ApiError::BadRequest("Username, email, and password are required".to_string()));
	};
	if db.find_user_by_username(username).await?.is_some() {
		return Err(ApiError::Conflict("Username already exists"));
	}
	if db.find_user_by_email(email).await?.is_some() {
		return Err(ApiError::Conflict("Email already exists"));
	}
	let new_user = NewUser {
		username: username.to_owned(),
		email: email.to_owned(),
		password: password.to_owned(),
	};
	match db.insert_user(new_user).await {
		Ok(user) => {
			log::info!("created user {} ({})", user.id, user.username);
			Ok(user)
		}
		// lost a race with a concurrent insert after the checks above
		Err(StoreError::Unique(constraint)) if constraint.contains("email") => Err(ApiError::Conflict("Email already exists")),
		Err(StoreError::Unique(_)) => Err(ApiError::Conflict("Username already exists")),
		Err(e) => Err(e.into()),
	}
}

pub async fn update_user(db: State<Db>, Path(id): Path<String>, JsonBody(body): JsonBody) -> ApiResult {
	let id = parse_id(&id, USER_NOT_FOUND)?;
	let changes = UserChanges::from_body(&body)?;
	let user = db.update_user(id, changes).await?.ok_or(ApiError::NotFound(USER_NOT_FOUND))?;
	Ok(success(StatusCode::OK, user))
}

pub async fn delete_user(db: State<Db>, Path(id): Path<String>) -> ApiResult {
	let id = parse_id(&id, USER_NOT_FOUND)?;
	if !db.delete_user(id).await? {
		return Err(ApiError::NotFound(USER_NOT_FOUND));
	}
	log::info!("deleted user {}", id);
	Ok(success_message(format!("User with id {} deleted", id)))
}
