//! The black-box flows again, this time over a real Postgres database.
//!
//! Set `CAR_MARKET_TEST_DB` to a key/value connection string such as
//! `host=localhost user=postgres password=postgres dbname=postgres` to run them;
//! each test works in its own schema, dropped and recreated on start.
//! Without the variable the database tests return early.

mod common;

use std::{collections::BTreeSet, sync::Arc};

use car_market::db_client::PgStore;
use common::TestServer;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio_postgres::NoTls;

const TEST_DB_VAR: &str = "CAR_MARKET_TEST_DB";

async fn pg_server(test: &str) -> Option<TestServer> {
	let Ok(base) = std::env::var(TEST_DB_VAR) else {
		eprintln!("skipping {}: {} is not set", test, TEST_DB_VAR);
		return None;
	};
	let schema = format!("car_market_test_{}", test);

	let (client, connection) = tokio_postgres::connect(&base, NoTls).await.expect("failed to connect to the test database");
	tokio::spawn(async move {
		let _ = connection.await;
	});
	client
		.batch_execute(&format!("DROP SCHEMA IF EXISTS {0} CASCADE; CREATE SCHEMA {0}", schema))
		.await
		.expect("failed to reset the test schema");

	let store = PgStore::connect_str(&format!("{} options=-csearch_path={}", base, schema)).await.unwrap();
	store.create_tables().await.unwrap();
	Some(TestServer::spawn_with(Arc::new(store)).await)
}

fn ids(list: &Value) -> BTreeSet<i64> {
	list["data"].as_array().unwrap().iter().map(|car| car["id"].as_i64().unwrap()).collect()
}

#[tokio::test]
async fn car_lifecycle() {
	let Some(srv) = pg_server("car_lifecycle").await else { return };
	let alice = srv.create_user("alice", "alice@example.com", "pw").await;

	let car = srv.create_car(json!({"make": "Toyota", "model": "Corolla", "vin": "T1", "userId": alice})).await;
	assert_eq!(car["submittedBy"], "alice");
	assert_eq!(car["approved"], false);
	assert_eq!(car["year"], 0);
	let path = format!("/cars/{}", car["id"]);

	let (status, body) = srv.put(&path, json!({"fuelType": "Diesel", "price": 9000, "year": null})).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["data"]["fuelType"], "Diesel");
	assert_eq!(body["data"]["price"], 9000.0);
	assert_eq!(body["data"]["year"], Value::Null);
	assert_eq!(body["data"]["model"], "Corolla");

	for _ in 0..2 {
		let (status, body) = srv.put(&format!("{}/approve", path), json!({})).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["message"], format!("Car with id {} approved", car["id"]));
	}
	let (_, body) = srv.get(&path).await;
	assert_eq!(body["data"]["approved"], true);

	let (status, _) = srv.delete(&path).await;
	assert_eq!(status, StatusCode::OK);
	for (status, body) in [srv.get(&path).await, srv.delete(&path).await, srv.put(&format!("{}/approve", path), json!({})).await] {
		assert_eq!(status, StatusCode::NOT_FOUND);
		assert_eq!(body["message"], "Car not found");
	}
}

#[tokio::test]
async fn pending_and_approved_partition_all_cars() {
	let Some(srv) = pg_server("partition").await else { return };
	for vin in ["P1", "P2", "P3", "P4"] {
		srv.create_car(json!({"make": "Audi", "vin": vin})).await;
	}
	srv.put("/cars/2/approve", json!({})).await;
	srv.put("/cars/3/approve", json!({})).await;
	srv.delete("/cars/3").await;

	let (_, all) = srv.get("/cars").await;
	let (_, pending) = srv.get("/cars/pending").await;
	let (_, approved) = srv.get("/cars/approved").await;
	let (all, pending, approved) = (ids(&all), ids(&pending), ids(&approved));

	assert!(pending.is_disjoint(&approved));
	assert_eq!(pending.union(&approved).copied().collect::<BTreeSet<_>>(), all);
	assert_eq!(approved, BTreeSet::from([2]));
	assert_eq!(pending, BTreeSet::from([1, 4]));
}

#[tokio::test]
async fn store_failures_reach_the_client() {
	let Some(srv) = pg_server("store_failures").await else { return };
	srv.create_car(json!({"make": "Opel", "vin": "DUP"})).await;

	let (status, body) = srv.post("/cars", json!({"make": "Opel", "vin": "DUP"})).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert!(body["message"].as_str().unwrap().contains("cars_vin_key"), "{}", body);

	let (status, body) = srv.post("/cars", json!({"make": null, "vin": "N1"})).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["message"], "null value in column \"make\" violates not-null constraint");

	// vin is VARCHAR(50)
	let (status, body) = srv.post("/cars", json!({"make": "Opel", "vin": "V".repeat(60)})).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["status"], "error");
	let message = body["message"].as_str().unwrap();
	assert!(message.contains("value too long"), "{}", message);
	assert_ne!(message, "db error");

	let (_, cars) = srv.get("/cars").await;
	assert_eq!(cars["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn users_and_login() {
	let Some(srv) = pg_server("users_and_login").await else { return };
	let admin = srv.create_user("admin", "admin@example.com", "root").await;
	let id = srv.create_user("erin", "erin@example.com", "pw").await;
	let path = format!("/users/{}", id);

	let (status, body) = srv.put(&path, json!({"username": "erin2"})).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["data"], json!({"id": id, "username": "erin2", "email": "erin@example.com"}));

	let (status, body) = srv.post("/api/register", json!({"username": "hank", "email": "erin@example.com", "password": "pw"})).await;
	assert_eq!(status, StatusCode::CONFLICT);
	assert_eq!(body["message"], "Email already exists");

	let (status, body) = srv.post("/login", json!({"username": "admin", "password": "root"})).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["user"]["id"], admin);
	assert_eq!(body["user"]["isAdmin"], true);

	let (status, _) = srv.post("/login", json!({"username": "erin2", "password": "wrong"})).await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);

	let (status, _) = srv.delete(&path).await;
	assert_eq!(status, StatusCode::OK);
	let (status, body) = srv.delete(&path).await;
	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn stats_reflect_current_tables() {
	let Some(srv) = pg_server("stats").await else { return };
	srv.create_user("admin", "admin@example.com", "root").await;
	srv.create_user("jo", "jo@example.com", "pw").await;
	for vin in ["S1", "S2", "S3"] {
		srv.create_car(json!({"make": "BMW", "vin": vin})).await;
	}
	srv.put("/cars/1/approve", json!({})).await;
	srv.put("/cars/3/approve", json!({})).await;

	let (status, body) = srv.get("/api/stats").await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body, json!({"total_users": 2, "admin_users": 1, "total_cars": 3, "approved_cars": 2, "pending_cars": 1}));
}

#[tokio::test]
async fn connection_failures_keep_their_cause() {
	// nothing listens on port 1
	let err = match PgStore::connect_str("host=127.0.0.1 port=1 user=nobody dbname=none connect_timeout=2").await {
		Ok(_) => panic!("connected to a closed port"),
		Err(err) => err.to_string(),
	};
	assert!(err.starts_with("error connecting to server: "), "{}", err);
}
