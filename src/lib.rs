//! REST backend for a used-car marketplace: listings with an approval
//! workflow, users, a demo login and dashboard counts.

use axum::routing::{get, post, put, Router};
use tower_http::cors::CorsLayer;

pub mod auth;
pub mod cars;
pub mod config;
pub mod db_client;
pub mod error;
pub mod request;
pub mod stats;
pub mod store;
pub mod users;

use cars::cars::{approve_car, create_car, delete_car, get_approved_cars, get_car, get_cars, get_pending_cars, update_car};
use store::Db;
use users::{create_user, delete_user, get_user, get_users, update_user};

pub const LIVENESS_MESSAGE: &str = "🚗 Used Car Marketplace API is running!";

pub fn build_app(db: Db) -> Router {
	Router::new()
		.route("/", get(|| async { LIVENESS_MESSAGE }))
		.route("/cars", get(get_cars).post(create_car))
		.route("/cars/pending", get(get_pending_cars))
		.route("/cars/approved", get(get_approved_cars))
		.route("/cars/:id", get(get_car).put(update_car).delete(delete_car))
		.route("/cars/:id/approve", put(approve_car))
		.route("/users", get(get_users).post(create_user))
		.route("/users/:id", get(get_user).put(update_user).delete(delete_user))
		.route("/api/register", post(auth::register))
		.route("/login", post(auth::login))
		.route("/api/stats", get(stats::get_stats))
		.layer(CorsLayer::permissive())
		.with_state(db)
}
