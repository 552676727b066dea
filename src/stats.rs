use axum::{extract::State, Json};
use postgres_from_row::FromRow;

use crate::{error::ApiError, store::Db};

/// Dashboard counts, computed from the tables on every call.
#[derive(serde::Serialize, FromRow, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
	pub total_users: i64,
	pub admin_users: i64,
	pub total_cars: i64,
	pub approved_cars: i64,
	pub pending_cars: i64,
}

// Served bare, without the status envelope: the dashboard reads the counts at the top level.
pub async fn get_stats(db: State<Db>) -> Result<Json<Stats>, ApiError> {
	Ok(Json(db.stats().await?))
}
