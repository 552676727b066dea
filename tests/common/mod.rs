#![allow(dead_code)]

use std::sync::Arc;

use car_market::{build_app, store::Db, store::MemoryStore};
use reqwest::StatusCode;
use serde_json::{json, Value};

pub struct TestServer {
	pub base_url: String,
	pub client: reqwest::Client,
	handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
	pub async fn spawn() -> Self {
		TestServer::spawn_with(Arc::new(MemoryStore::new())).await
	}

	pub async fn spawn_with(db: Db) -> Self {
		let app = build_app(db);
		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("failed to bind ephemeral port");
		let base_url = format!("http://{}", listener.local_addr().unwrap());

		let handle = tokio::spawn(async move {
			axum::serve(listener, app).await.unwrap();
		});

		Self {
			base_url,
			client: reqwest::Client::new(),
			handle,
		}
	}

	pub async fn send(&self, method: reqwest::Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
		let mut req = self.client.request(method, format!("{}{}", self.base_url, path));
		if let Some(body) = body {
			req = req.json(&body);
		}
		let res = req.send().await.unwrap();
		let status = res.status();
		let text = res.text().await.unwrap();
		let value = serde_json::from_str(&text).unwrap_or(Value::String(text));
		(status, value)
	}

	pub async fn get(&self, path: &str) -> (StatusCode, Value) {
		self.send(reqwest::Method::GET, path, None).await
	}

	pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
		self.send(reqwest::Method::POST, path, Some(body)).await
	}

	pub async fn put(&self, path: &str, body: Value) -> (StatusCode, Value) {
		self.send(reqwest::Method::PUT, path, Some(body)).await
	}

	pub async fn delete(&self, path: &str) -> (StatusCode, Value) {
		self.send(reqwest::Method::DELETE, path, None).await
	}

	pub async fn create_user(&self, username: &str, email: &str, password: &str) -> i64 {
		let (status, body) = self.post("/users", json!({"username": username, "email": email, "password": password})).await;
		assert_eq!(status, StatusCode::CREATED, "{}", body);
		body["data"]["id"].as_i64().unwrap()
	}

	pub async fn create_car(&self, body: Value) -> Value {
		let (status, body) = self.post("/cars", body).await;
		assert_eq!(status, StatusCode::CREATED, "{}", body);
		body["data"].clone()
	}
}

impl Drop for TestServer {
	fn drop(&mut self) {
		self.handle.abort();
	}
}
