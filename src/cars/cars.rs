use axum::extract::{Path, State};
use hyper::StatusCode;
use serde_json::{Map, Value};

use super::fields::{as_int, changes_from_body, CarChanges, CarField, FieldValue};
use crate::{
	error::{success, success_message, ApiError, ApiResult},
	request::{parse_id, JsonBody},
	store::Db,
};

const CAR_NOT_FOUND: &str = "Car not found";

pub async fn get_cars(db: State<Db>) -> ApiResult {
	let cars = db.list_cars(None).await?;
	Ok(success(StatusCode::OK, cars))
}

pub async fn get_pending_cars(db: State<Db>) -> ApiResult {
	let cars = db.list_cars(Some(false)).await?;
	Ok(success(StatusCode::OK, cars))
}

pub async fn get_approved_cars(db: State<Db>) -> ApiResult {
	let cars = db.list_cars(Some(true)).await?;
	Ok(success(StatusCode::OK, cars))
}

pub async fn get_car(db: State<Db>, Path(id): Path<String>) -> ApiResult {
	let id = parse_id(&id, CAR_NOT_FOUND)?;
	let car = db.get_car(id).await?.ok_or(ApiError::NotFound(CAR_NOT_FOUND))?;
	Ok(success(StatusCode::OK, car))
}

pub async fn create_car(db: State<Db>, JsonBody(body): JsonBody) -> ApiResult {
	let submitted_by = resolve_submitter(&db.0, &body).await?;
	let mut changes = listing_changes(&body).map_err(ApiError::BadRequest)?;
	changes.push((CarField::SubmittedBy, FieldValue::Text(Some(submitted_by))));

	let car = db.insert_car(changes).await?;
	log::info!("car {} submitted by {}", car.id, car.submitted_by.as_deref().unwrap_or_default());
	Ok(success(StatusCode::CREATED, car))
}

/// Every field except the submitter, taken from the body or defaulted.
fn listing_changes(body: &Map<String, Value>) -> Result<CarChanges, String> {
	CarField::all()
		.filter(|field| *field != CarField::SubmittedBy)
		.map(|field| {
			let value = match body.get(field.api_name()) {
				Some(v) => field.coerce(v)?,
				None => field.default_value(),
			};
			Ok((field, value))
		})
		.collect()
}

/// `userId` wins over `submittedBy`, which wins over "Anonymous".
async fn resolve_submitter(db: &Db, body: &Map<String, Value>) -> Result<String, ApiError> {
	let invalid = || ApiError::BadRequest("Invalid userId".to_string());
	let user_id = match body.get("userId") {
		None | Some(Value::Null) | Some(Value::Bool(false)) => None,
		Some(Value::String(s)) if s.is_empty() => None,
		Some(Value::Number(n)) if n.as_f64() == Some(0.0) => None,
		Some(v @ (Value::Number(_) | Value::String(_))) => Some(as_int(v).ok_or_else(invalid)?),
		Some(_) => return Err(invalid()),
	};

	if let Some(user_id) = user_id {
		let user = db.get_user(user_id).await?.ok_or_else(invalid)?;
		return Ok(user.username);
	}
	match body.get("submittedBy").and_then(Value::as_str) {
		Some(name) if !name.is_empty() => Ok(name.to_owned()),
		_ => Ok("Anonymous".to_owned()),
	}
}

pub async fn update_car(db: State<Db>, Path(id): Path<String>, JsonBody(body): JsonBody) -> ApiResult {
	let id = parse_id(&id, CAR_NOT_FOUND)?;
	let changes = changes_from_body(&body).map_err(ApiError::BadRequest)?;
	let car = db.update_car(id, changes).await?.ok_or(ApiError::NotFound(CAR_NOT_FOUND))?;
	Ok(success(StatusCode::OK, car))
}

pub async fn approve_car(db: State<Db>, Path(id): Path<String>) -> ApiResult {
	let id = parse_id(&id, CAR_NOT_FOUND)?;
	if !db.approve_car(id).await? {
		return Err(ApiError::NotFound(CAR_NOT_FOUND));
	}
	log::info!("approved car {}", id);
	Ok(success_message(format!("Car with id {} approved", id)))
}

pub async fn delete_car(db: State<Db>, Path(id): Path<String>) -> ApiResult {
	let id = parse_id(&id, CAR_NOT_FOUND)?;
	if !db.delete_car(id).await? {
		return Err(ApiError::NotFound(CAR_NOT_FOUND));
	}
	log::info!("deleted car {}", id);
	Ok(success_message(format!("Car with id {} deleted", id)))
}
