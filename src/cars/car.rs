use postgres_from_row::FromRow;

use super::fields::{CarField, FieldValue};
use crate::store::StoreError;

/// A listing as stored in `cars`; serializes with the external field names.
#[derive(serde::Serialize, FromRow, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Car {
	pub id: i32,
	pub make: String,
	pub model: String,
	pub year: Option<i32>,
	pub price: Option<f64>,
	pub mileage: Option<i32>,
	pub transmission: Option<String>,
	pub fuel_type: Option<String>,
	pub vin: Option<String>,
	pub image_url: Option<String>,
	pub location: Option<String>,
	pub description: Option<String>,
	pub contact_info: Option<String>,
	pub submitted_by: Option<String>,
	pub approved: bool,
}

impl Car {
	/// Row state before any column is written, mirroring the table defaults.
	pub fn empty(id: i32) -> Car {
		Car {
			id,
			make: String::new(),
			model: String::new(),
			year: None,
			price: None,
			mileage: None,
			transmission: None,
			fuel_type: None,
			vin: None,
			image_url: None,
			location: None,
			description: None,
			contact_info: None,
			submitted_by: None,
			approved: false,
		}
	}

	/// Writes one column, rejecting values the `cars` table would refuse.
	pub fn set(&mut self, field: CarField, value: FieldValue) -> Result<(), StoreError> {
		let not_null = || StoreError::NotNull(field.column().to_owned());
		match (field, value) {
			(CarField::Make, FieldValue::Text(v)) => self.make = v.ok_or_else(not_null)?,
			(CarField::Model, FieldValue::Text(v)) => self.model = v.ok_or_else(not_null)?,
			(CarField::Year, FieldValue::Int(v)) => self.year = v,
			(CarField::Price, FieldValue::Float(v)) => self.price = v,
			(CarField::Mileage, FieldValue::Int(v)) => self.mileage = v,
			(CarField::Transmission, FieldValue::Text(v)) => self.transmission = v,
			(CarField::FuelType, FieldValue::Text(v)) => self.fuel_type = v,
			(CarField::Vin, FieldValue::Text(v)) => self.vin = v,
			(CarField::ImageUrl, FieldValue::Text(v)) => self.image_url = v,
			(CarField::Location, FieldValue::Text(v)) => self.location = v,
			(CarField::Description, FieldValue::Text(v)) => self.description = v,
			(CarField::ContactInfo, FieldValue::Text(v)) => self.contact_info = v,
			(CarField::SubmittedBy, FieldValue::Text(v)) => self.submitted_by = v,
			(CarField::Approved, FieldValue::Bool(v)) => self.approved = v,
			(field, _) => return Err(StoreError::TypeMismatch(field.column().to_owned())),
		}
		Ok(())
	}
}
