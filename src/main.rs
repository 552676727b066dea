use std::sync::Arc;

use car_market::{build_app, config::Config, db_client::PgStore, store::Db, store::MemoryStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = Config::from_env()?;
	let db: Db = if config.in_memory {
		log::warn!("using the in-memory store; data is lost on exit");
		Arc::new(MemoryStore::new())
	} else {
		let store = PgStore::connect(&config.db).await?;
		store.create_tables().await?;
		log::info!("connected to postgres at {}:{}/{}", config.db.host, config.db.port, config.db.dbname);
		Arc::new(store)
	};

	let listener = tokio::net::TcpListener::bind(config.addr).await?;
	log::info!("listening on {}", listener.local_addr()?);
	axum::serve(listener, build_app(db)).await?;
	Ok(())
}
