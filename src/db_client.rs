use async_trait::async_trait;
use postgres_from_row::FromRow;
use tokio_postgres::{types::ToSql, Client, NoTls};

use crate::{
	auth::ADMIN_USERNAME,
	cars::{car::Car, fields::CarChanges},
	config::DbConfig,
	stats::Stats,
	store::{Store, StoreError},
	users::{NewUser, User, UserChanges},
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS cars (
	id SERIAL PRIMARY KEY,
	make VARCHAR(50) NOT NULL,
	model VARCHAR(50) NOT NULL,
	year INTEGER,
	price DOUBLE PRECISION,
	mileage INTEGER,
	transmission VARCHAR(50),
	fuel_type VARCHAR(50),
	vin VARCHAR(50) UNIQUE,
	image_url TEXT,
	location VARCHAR(100),
	description TEXT,
	contact_info VARCHAR(100),
	submitted_by VARCHAR(50),
	approved BOOLEAN NOT NULL DEFAULT FALSE
);
CREATE TABLE IF NOT EXISTS users (
	id SERIAL PRIMARY KEY,
	username VARCHAR(50) NOT NULL UNIQUE,
	email VARCHAR(120) NOT NULL UNIQUE,
	password VARCHAR(100) NOT NULL
);
";

/// `Store` backed by a single Postgres connection.
///
/// Each operation is one statement, so Postgres commits or rolls back the
/// whole write on its own.
pub struct PgStore {
	client: Client,
}

impl PgStore {
	pub async fn connect(config: &DbConfig) -> Result<PgStore, StoreError> {
		PgStore::connect_str(&config.connection_string()).await
	}

	/// Connects with a libpq-style string, e.g. `host=localhost user=postgres dbname=market`.
	pub async fn connect_str(conn: &str) -> Result<PgStore, StoreError> {
		let (client, connection) = tokio_postgres::connect(conn, NoTls).await?;

		tokio::spawn(async move {
			if let Err(e) = connection.await {
				log::error!("Connection error: {}", e);
			}
		});

		Ok(PgStore { client })
	}

	/// Creates the tables if they do not exist yet.
	pub async fn create_tables(&self) -> Result<(), StoreError> {
		self.client.batch_execute(SCHEMA).await?;
		Ok(())
	}
}

fn params(values: &[Box<dyn ToSql + Sync + Send>]) -> Vec<&(dyn ToSql + Sync)> {
	values.iter().map(|v| v.as_ref() as &(dyn ToSql + Sync)).collect()
}

#[async_trait]
impl Store for PgStore {
	async fn list_cars(&self, approved: Option<bool>) -> Result<Vec<Car>, StoreError> {
		let rows = match approved {
			Some(flag) => self.client.query("SELECT * FROM cars WHERE approved = $1 ORDER BY id", &[&flag]).await?,
			None => self.client.query("SELECT * FROM cars ORDER BY id", &[]).await?,
		};
		Ok(rows.iter().map(Car::try_from_row).collect::<Result<_, _>>()?)
	}

	async fn get_car(&self, id: i32) -> Result<Option<Car>, StoreError> {
		let row = self.client.query_opt("SELECT * FROM cars WHERE id = $1", &[&id]).await?;
		Ok(row.as_ref().map(Car::try_from_row).transpose()?)
	}

	async fn insert_car(&self, changes: CarChanges) -> Result<Car, StoreError> {
		let columns: Vec<&str> = changes.iter().map(|(field, _)| field.column()).collect();
		let placeholders: Vec<String> = (1..=changes.len()).map(|i| format!("${}", i)).collect();
		let statement = if changes.is_empty() {
			"INSERT INTO cars DEFAULT VALUES RETURNING *".to_owned()
		} else {
			format!("INSERT INTO cars ({}) VALUES ({}) RETURNING *", columns.join(", "), placeholders.join(", "))
		};
		let values: Vec<_> = changes.iter().map(|(_, value)| value.to_sql()).collect();
		let row = self.client.query_one(statement.as_str(), &params(&values)).await?;
		Ok(Car::try_from_row(&row)?)
	}

	async fn update_car(&self, id: i32, changes: CarChanges) -> Result<Option<Car>, StoreError> {
		if changes.is_empty() {
			return self.get_car(id).await;
		}
		// column names come from the static field table, never from the request
		let assignments: Vec<String> = changes.iter().enumerate().map(|(i, (field, _))| format!("{} = ${}", field.column(), i + 1)).collect();
		let statement = format!("UPDATE cars SET {} WHERE id = ${} RETURNING *", assignments.join(", "), changes.len() + 1);
		let mut values: Vec<_> = changes.iter().map(|(_, value)| value.to_sql()).collect();
		values.push(Box::new(id));
		let row = self.client.query_opt(statement.as_str(), &params(&values)).await?;
		Ok(row.as_ref().map(Car::try_from_row).transpose()?)
	}

	async fn approve_car(&self, id: i32) -> Result<bool, StoreError> {
		let n = self.client.execute("UPDATE cars SET approved = TRUE WHERE id = $1", &[&id]).await?;
		Ok(n > 0)
	}

	async fn delete_car(&self, id: i32) -> Result<bool, StoreError> {
		let n = self.client.execute("DELETE FROM cars WHERE id = $1", &[&id]).await?;
		Ok(n > 0)
	}

	async fn list_users(&self) -> Result<Vec<User>, StoreError> {
		let rows = self.client.query("SELECT * FROM users ORDER BY id", &[]).await?;
		Ok(rows.iter().map(User::try_from_row).collect::<Result<_, _>>()?)
	}

	async fn get_user(&self, id: i32) -> Result<Option<User>, StoreError> {
		let row = self.client.query_opt("SELECT * FROM users WHERE id = $1", &[&id]).await?;
		Ok(row.as_ref().map(User::try_from_row).transpose()?)
	}

	async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
		let row = self.client.query_opt("SELECT * FROM users WHERE username = $1", &[&username]).await?;
		Ok(row.as_ref().map(User::try_from_row).transpose()?)
	}

	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
		let row = self.client.query_opt("SELECT * FROM users WHERE email = $1", &[&email]).await?;
		Ok(row.as_ref().map(User::try_from_row).transpose()?)
	}

	async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
		let statement = "INSERT INTO users (username, email, password) VALUES ($1, $2, $3) RETURNING *";
		let row = self.client.query_one(statement, &[&user.username, &user.email, &user.password]).await?;
		Ok(User::try_from_row(&row)?)
	}

	async fn update_user(&self, id: i32, changes: UserChanges) -> Result<Option<User>, StoreError> {
		if changes.is_empty() {
			return self.get_user(id).await;
		}
		let statement = "UPDATE users SET username = COALESCE($1, username), email = COALESCE($2, email), password = COALESCE($3, password) WHERE id = $4 RETURNING *";
		let row = self.client.query_opt(statement, &[&changes.username, &changes.email, &changes.password, &id]).await?;
		Ok(row.as_ref().map(User::try_from_row).transpose()?)
	}

	async fn delete_user(&self, id: i32) -> Result<bool, StoreError> {
		let n = self.client.execute("DELETE FROM users WHERE id = $1", &[&id]).await?;
		Ok(n > 0)
	}

	async fn stats(&self) -> Result<Stats, StoreError> {
		let statement = "SELECT
			(SELECT COUNT(*) FROM users) AS total_users,
			(SELECT COUNT(*) FROM users WHERE username = $1) AS admin_users,
			COUNT(*) AS total_cars,
			COUNT(*) FILTER (WHERE approved) AS approved_cars,
			COUNT(*) FILTER (WHERE NOT approved) AS pending_cars
			FROM cars";
		let row = self.client.query_one(statement, &[&ADMIN_USERNAME]).await?;
		Ok(Stats::try_from_row(&row)?)
	}
}
