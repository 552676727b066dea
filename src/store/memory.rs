use std::{collections::BTreeMap, sync::Mutex};

use async_trait::async_trait;

use super::{Store, StoreError};
use crate::{
	auth::ADMIN_USERNAME,
	cars::{car::Car, fields::CarChanges},
	stats::Stats,
	users::{NewUser, User, UserChanges},
};

#[derive(Default)]
struct Tables {
	cars: BTreeMap<i32, Car>,
	users: BTreeMap<i32, User>,
	last_car_id: i32,
	last_user_id: i32,
}

impl Tables {
	fn check_car(&self, car: &Car) -> Result<(), StoreError> {
		if let Some(vin) = &car.vin {
			if self.cars.values().any(|other| other.id != car.id && other.vin.as_ref() == Some(vin)) {
				return Err(StoreError::Unique("cars_vin_key".to_owned()));
			}
		}
		Ok(())
	}

	fn check_user(&self, user: &User) -> Result<(), StoreError> {
		for other in self.users.values().filter(|other| other.id != user.id) {
			if other.username == user.username {
				return Err(StoreError::Unique("users_username_key".to_owned()));
			}
			if other.email == user.email {
				return Err(StoreError::Unique("users_email_key".to_owned()));
			}
		}
		Ok(())
	}
}

/// In-process store with the same constraints as the Postgres schema.
/// Every operation holds the lock for its whole duration, so writes are atomic.
#[derive(Default)]
pub struct MemoryStore {
	tables: Mutex<Tables>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
		// a panic mid-operation never leaves a half-applied row, so a poisoned lock is still consistent
		self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}

fn build_car(base: Car, changes: CarChanges) -> Result<Car, StoreError> {
	let mut car = base;
	for (field, value) in changes {
		car.set(field, value)?;
	}
	Ok(car)
}

#[async_trait]
impl Store for MemoryStore {
	async fn list_cars(&self, approved: Option<bool>) -> Result<Vec<Car>, StoreError> {
		let tables = self.tables();
		Ok(tables.cars.values().filter(|car| approved.map_or(true, |flag| car.approved == flag)).cloned().collect())
	}

	async fn get_car(&self, id: i32) -> Result<Option<Car>, StoreError> {
		Ok(self.tables().cars.get(&id).cloned())
	}

	async fn insert_car(&self, changes: CarChanges) -> Result<Car, StoreError> {
		let mut tables = self.tables();
		let car = build_car(Car::empty(tables.last_car_id + 1), changes)?;
		tables.check_car(&car)?;
		tables.last_car_id = car.id;
		tables.cars.insert(car.id, car.clone());
		Ok(car)
	}

	async fn update_car(&self, id: i32, changes: CarChanges) -> Result<Option<Car>, StoreError> {
		let mut tables = self.tables();
		let Some(current) = tables.cars.get(&id).cloned() else {
			return Ok(None);
		};
		let car = build_car(current, changes)?;
		tables.check_car(&car)?;
		tables.cars.insert(id, car.clone());
		Ok(Some(car))
	}

	async fn approve_car(&self, id: i32) -> Result<bool, StoreError> {
		let mut tables = self.tables();
		match tables.cars.get_mut(&id) {
			Some(car) => {
				car.approved = true;
				Ok(true)
			}
			None => Ok(false),
		}
	}

	async fn delete_car(&self, id: i32) -> Result<bool, StoreError> {
		Ok(self.tables().cars.remove(&id).is_some())
	}

	async fn list_users(&self) -> Result<Vec<User>, StoreError> {
		Ok(self.tables().users.values().cloned().collect())
	}

	async fn get_user(&self, id: i32) -> Result<Option<User>, StoreError> {
		Ok(self.tables().users.get(&id).cloned())
	}

	async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
		Ok(self.tables().users.values().find(|user| user.username == username).cloned())
	}

	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
		Ok(self.tables().users.values().find(|user| user.email == email).cloned())
	}

	async fn insert_user(&self, new_user: NewUser) -> Result<User, StoreError> {
		let mut tables = self.tables();
		let user = User {
			id: tables.last_user_id + 1,
			username: new_user.username,
			email: new_user.email,
			password: new_user.password,
		};
		tables.check_user(&user)?;
		tables.last_user_id = user.id;
		tables.users.insert(user.id, user.clone());
		Ok(user)
	}

	async fn update_user(&self, id: i32, changes: UserChanges) -> Result<Option<User>, StoreError> {
		let mut tables = self.tables();
		let Some(mut user) = tables.users.get(&id).cloned() else {
			return Ok(None);
		};
		if let Some(username) = changes.username {
			user.username = username;
		}
		if let Some(email) = changes.email {
			user.email = email;
		}
		if let Some(password) = changes.password {
			user.password = password;
		}
		tables.check_user(&user)?;
		tables.users.insert(id, user.clone());
		Ok(Some(user))
	}

	async fn delete_user(&self, id: i32) -> Result<bool, StoreError> {
		Ok(self.tables().users.remove(&id).is_some())
	}

	async fn stats(&self) -> Result<Stats, StoreError> {
		let tables = self.tables();
		let count = |n: usize| n as i64;
		let approved = tables.cars.values().filter(|car| car.approved).count();
		Ok(Stats {
			total_users: count(tables.users.len()),
			admin_users: count(tables.users.values().filter(|user| user.username == ADMIN_USERNAME).count()),
			total_cars: count(tables.cars.len()),
			approved_cars: count(approved),
			pending_cars: count(tables.cars.len() - approved),
		})
	}
}
