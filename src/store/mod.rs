//! Storage seam between the HTTP handlers and the relational store.
//!
//! Handlers only ever see `Db`, so the Postgres client can be swapped for
//! [`MemoryStore`] in tests or local runs.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_postgres::error::SqlState;

use crate::{
	cars::{car::Car, fields::CarChanges},
	stats::Stats,
	users::{NewUser, User, UserChanges},
};

pub mod memory;

pub use memory::MemoryStore;

pub type Db = Arc<dyn Store>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("duplicate key value violates unique constraint \"{0}\"")]
	Unique(String),
	#[error("null value in column \"{0}\" violates not-null constraint")]
	NotNull(String),
	#[error("column \"{0}\" received a value of the wrong type")]
	TypeMismatch(String),
	/// Any other failure reported by the server, with its own message.
	#[error("{0}")]
	Database(String),
	#[error("{}", error_chain(.0))]
	Postgres(tokio_postgres::Error),
}

impl StoreError {
	fn from_db(code: &SqlState, constraint: Option<&str>, column: Option<&str>, message: &str) -> StoreError {
		if *code == SqlState::UNIQUE_VIOLATION {
			return StoreError::Unique(constraint.unwrap_or("unknown").to_owned());
		}
		if *code == SqlState::NOT_NULL_VIOLATION {
			return StoreError::NotNull(column.unwrap_or("unknown").to_owned());
		}
		StoreError::Database(message.to_owned())
	}
}

/// `tokio_postgres::Error` prints only its kind; the cause sits in `source()`.
fn error_chain(err: &tokio_postgres::Error) -> String {
	let mut text = err.to_string();
	let mut source = std::error::Error::source(err);
	while let Some(cause) = source {
		text.push_str(": ");
		text.push_str(&cause.to_string());
		source = cause.source();
	}
	text
}

impl From<tokio_postgres::Error> for StoreError {
	fn from(err: tokio_postgres::Error) -> Self {
		match err.as_db_error() {
			Some(db_err) => StoreError::from_db(db_err.code(), db_err.constraint(), db_err.column(), db_err.message()),
			None => StoreError::Postgres(err),
		}
	}
}

/// Every operation is a single read or a single atomic write.
#[async_trait]
pub trait Store: Send + Sync {
	/// `None` lists everything, `Some(flag)` filters on `approved`.
	async fn list_cars(&self, approved: Option<bool>) -> Result<Vec<Car>, StoreError>;
	async fn get_car(&self, id: i32) -> Result<Option<Car>, StoreError>;
	async fn insert_car(&self, changes: CarChanges) -> Result<Car, StoreError>;
	/// Returns `None` when no car has this id.
	async fn update_car(&self, id: i32, changes: CarChanges) -> Result<Option<Car>, StoreError>;
	/// Returns `false` when no car has this id.
	async fn approve_car(&self, id: i32) -> Result<bool, StoreError>;
	async fn delete_car(&self, id: i32) -> Result<bool, StoreError>;

	async fn list_users(&self) -> Result<Vec<User>, StoreError>;
	async fn get_user(&self, id: i32) -> Result<Option<User>, StoreError>;
	async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
	async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;
	async fn update_user(&self, id: i32, changes: UserChanges) -> Result<Option<User>, StoreError>;
	async fn delete_user(&self, id: i32) -> Result<bool, StoreError>;

	async fn stats(&self) -> Result<Stats, StoreError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn server_messages_are_kept_for_other_failures() {
		let err = StoreError::from_db(&SqlState::STRING_DATA_RIGHT_TRUNCATION, None, None, "value too long for type character varying(50)");
		assert_eq!(err.to_string(), "value too long for type character varying(50)");
	}

	#[test]
	fn constraint_failures_are_classified() {
		let err = StoreError::from_db(&SqlState::UNIQUE_VIOLATION, Some("cars_vin_key"), None, "duplicate key value");
		assert!(matches!(err, StoreError::Unique(ref c) if c == "cars_vin_key"));
		let err = StoreError::from_db(&SqlState::NOT_NULL_VIOLATION, None, Some("make"), "null value");
		assert_eq!(err.to_string(), "null value in column \"make\" violates not-null constraint");
	}
}
