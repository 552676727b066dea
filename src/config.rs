use std::{env, net::SocketAddr};

use anyhow::{Context, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
	pub host: String,
	pub port: u16,
	pub user: String,
	pub password: Option<String>,
	pub dbname: String,
}

impl DbConfig {
	pub fn connection_string(&self) -> String {
		let mut config_string = format!("host={} port={} user={} dbname={}", self.host, self.port, self.user, self.dbname);
		if let Some(password) = &self.password {
			config_string.push_str(&format!(" password={}", password));
		}
		config_string
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
	pub addr: SocketAddr,
	pub db: DbConfig,
	pub in_memory: bool,
}

impl Config {
	pub fn from_env() -> Result<Config> {
		Config::from_lookup(|key| env::var(key).ok())
	}

	fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
		let var = |key: &str, default: &str| lookup(key).filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_owned());

		let addr = var("CAR_MARKET_ADDR", "0.0.0.0:5000");
		let addr = addr.trim().parse().with_context(|| format!("CAR_MARKET_ADDR is not a socket address: {}", addr))?;
		let port = var("CAR_MARKET_DB_PORT", "5432");
		let port = port.trim().parse().with_context(|| format!("CAR_MARKET_DB_PORT is not a port: {}", port))?;
		let in_memory = lookup("CAR_MARKET_IN_MEMORY").is_some_and(|v| !matches!(v.trim(), "" | "0" | "false"));

		Ok(Config {
			addr,
			db: DbConfig {
				host: var("CAR_MARKET_DB_HOST", "localhost"),
				port,
				user: var("CAR_MARKET_DB_USER", "postgres"),
				password: lookup("CAR_MARKET_DB_PASSWORD").filter(|v| !v.is_empty()),
				dbname: var("CAR_MARKET_DB_NAME", "postgres"),
			},
			in_memory,
		})
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;

	fn config(vars: &[(&str, &str)]) -> Result<Config> {
		let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
		Config::from_lookup(|key| vars.get(key).cloned())
	}

	#[test]
	fn defaults_target_local_postgres_on_port_5000() {
		let config = config(&[]).unwrap();
		assert_eq!(config.addr, "0.0.0.0:5000".parse().unwrap());
		assert!(!config.in_memory);
		assert_eq!(config.db.connection_string(), "host=localhost port=5432 user=postgres dbname=postgres");
	}

	#[test]
	fn password_is_appended_when_set() {
		let config = config(&[("CAR_MARKET_DB_PASSWORD", "secret"), ("CAR_MARKET_DB_USER", "ubuntu")]).unwrap();
		assert_eq!(config.db.connection_string(), "host=localhost port=5432 user=ubuntu dbname=postgres password=secret");
	}

	#[test]
	fn in_memory_flag() {
		assert!(config(&[("CAR_MARKET_IN_MEMORY", "1")]).unwrap().in_memory);
		assert!(!config(&[("CAR_MARKET_IN_MEMORY", "false")]).unwrap().in_memory);
	}

	#[test]
	fn bad_values_name_the_variable() {
		let err = config(&[("CAR_MARKET_DB_PORT", "many")]).unwrap_err();
		assert!(err.to_string().contains("CAR_MARKET_DB_PORT"));
		assert!(config(&[("CAR_MARKET_ADDR", "nowhere")]).is_err());
	}
}
