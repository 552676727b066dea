use serde_json::Value;
use tokio_postgres::types::ToSql;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
	Text,
	Int,
	Float,
	Bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CarField {
	Make,
	Model,
	Year,
	Price,
	Mileage,
	Transmission,
	FuelType,
	Vin,
	ImageUrl,
	Location,
	Description,
	ContactInfo,
	SubmittedBy,
	Approved,
}

/// External name, column name and kind of every writable car field.
/// `id` is absent on purpose: it is assigned by the store and never written.
static CAR_FIELDS: [(CarField, &str, &str, FieldKind); 14] = [
	(CarField::Make, "make", "make", FieldKind::Text),
	(CarField::Model, "model", "model", FieldKind::Text),
	(CarField::Year, "year", "year", FieldKind::Int),
	(CarField::Price, "price", "price", FieldKind::Float),
	(CarField::Mileage, "mileage", "mileage", FieldKind::Int),
	(CarField::Transmission, "transmission", "transmission", FieldKind::Text),
	(CarField::FuelType, "fuelType", "fuel_type", FieldKind::Text),
	(CarField::Vin, "vin", "vin", FieldKind::Text),
	(CarField::ImageUrl, "imageUrl", "image_url", FieldKind::Text),
	(CarField::Location, "location", "location", FieldKind::Text),
	(CarField::Description, "description", "description", FieldKind::Text),
	(CarField::ContactInfo, "contactInfo", "contact_info", FieldKind::Text),
	(CarField::SubmittedBy, "submittedBy", "submitted_by", FieldKind::Text),
	(CarField::Approved, "approved", "approved", FieldKind::Bool),
];

impl CarField {
	pub fn all() -> impl Iterator<Item = CarField> {
		CAR_FIELDS.iter().map(|entry| entry.0)
	}

	fn entry(self) -> &'static (CarField, &'static str, &'static str, FieldKind) {
		// rows follow the variant order
		&CAR_FIELDS[self as usize]
	}

	pub fn api_name(self) -> &'static str {
		self.entry().1
	}

	pub fn column(self) -> &'static str {
		self.entry().2
	}

	pub fn kind(self) -> FieldKind {
		self.entry().3
	}

	pub fn from_api_name(name: &str) -> Option<CarField> {
		CAR_FIELDS.iter().find(|entry| entry.1 == name).map(|entry| entry.0)
	}

	/// Value stored when a create payload leaves the field out.
	pub fn default_value(self) -> FieldValue {
		match self.kind() {
			FieldKind::Text => FieldValue::Text(Some(String::new())),
			FieldKind::Int => FieldValue::Int(Some(0)),
			FieldKind::Float => FieldValue::Float(Some(0.0)),
			FieldKind::Bool => FieldValue::Bool(false),
		}
	}

	/// Coerces a client-supplied JSON value into this field's storage type.
	pub fn coerce(self, value: &Value) -> Result<FieldValue, String> {
		let name = self.api_name();
		match (self.kind(), value) {
			(FieldKind::Text, Value::Null) => Ok(FieldValue::Text(None)),
			(FieldKind::Text, Value::String(s)) => Ok(FieldValue::Text(Some(s.clone()))),
			(FieldKind::Text, Value::Number(n)) => Ok(FieldValue::Text(Some(n.to_string()))),
			(FieldKind::Text, Value::Bool(b)) => Ok(FieldValue::Text(Some(b.to_string()))),
			(FieldKind::Int, Value::Null) => Ok(FieldValue::Int(None)),
			(FieldKind::Int, v) => as_int(v).map(|n| FieldValue::Int(Some(n))).ok_or_else(|| format!("{} must be an integer", name)),
			(FieldKind::Float, Value::Null) => Ok(FieldValue::Float(None)),
			(FieldKind::Float, v) => as_float(v).map(|n| FieldValue::Float(Some(n))).ok_or_else(|| format!("{} must be a number", name)),
			(FieldKind::Bool, Value::Bool(b)) => Ok(FieldValue::Bool(*b)),
			(FieldKind::Bool, _) => Err(format!("{} must be a boolean", name)),
			(FieldKind::Text, _) => Err(format!("{} must be a string", name)),
		}
	}
}

/// Integers, integral floats and numeric strings that fit an `i32`.
pub fn as_int(value: &Value) -> Option<i32> {
	match value {
		Value::Number(n) => {
			if let Some(i) = n.as_i64() {
				return i32::try_from(i).ok();
			}
			let f = n.as_f64()?;
			if f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 {
				Some(f as i32)
			} else {
				None
			}
		}
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}

fn as_float(value: &Value) -> Option<f64> {
	match value {
		Value::Number(n) => n.as_f64(),
		Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
		_ => None,
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
	Text(Option<String>),
	Int(Option<i32>),
	Float(Option<f64>),
	Bool(bool),
}

impl FieldValue {
	pub fn to_sql(&self) -> Box<dyn ToSql + Sync + Send> {
		match self {
			FieldValue::Text(v) => Box::new(v.clone()),
			FieldValue::Int(v) => Box::new(*v),
			FieldValue::Float(v) => Box::new(*v),
			FieldValue::Bool(v) => Box::new(*v),
		}
	}
}

/// Ordered column writes for one insert or update.
pub type CarChanges = Vec<(CarField, FieldValue)>;

/// Translates the keys of a request body into column writes.
/// Unknown keys, including `id`, are skipped.
pub fn changes_from_body(body: &serde_json::Map<String, Value>) -> Result<CarChanges, String> {
	let mut changes = Vec::new();
	for (key, value) in body {
		if let Some(field) = CarField::from_api_name(key) {
			changes.push((field, field.coerce(value)?));
		}
	}
	Ok(changes)
}
