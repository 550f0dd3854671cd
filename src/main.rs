#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod flash;
mod guard;
mod jar;
mod ratelimit;
mod route;
mod session;
mod trace;

use std::{net::SocketAddr, str::FromStr};

use argon2::Argon2;
use axum::extract::FromRef;
use cookie::Key;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::config::Config;

pub type Database = sqlx::Pool<sqlx::Sqlite>;
pub type AppState = State;

/// The shared application state.
///
/// This should contain all shared dependencies that handlers need to access,
/// such as a database connection pool, a hash configuration (if it's expensive to create),
/// or the key used to sign cookies.
#[derive(Clone, FromRef)]
pub struct State {
	pub database: Database,
	pub hasher: Argon2<'static>,
	pub key: Key,
	/// Applied to the credential routes when set.
	#[from_ref(skip)]
	pub limiter: Option<ratelimit::Limiter>,
}

/// An error that stops the server from starting or running.
#[derive(Debug, thiserror::Error)]
enum Error {
	#[error(transparent)]
	Config(#[from] config::ConfigError),
	#[error("failed to initialize tracing: {0}")]
	Trace(#[from] opentelemetry::trace::TraceError),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), Error> {
	dotenvy::dotenv().ok();

	let config = Config::from_env()?;
	let _guard = trace::init_tracing_subscriber(&config)?;

	let options = SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
	let database = SqlitePoolOptions::new().connect_with(options).await?;

	sqlx::migrate!().run(&database).await?;

	tracing::info!(url = %config.database_url, "database migrated");

	let limiter = if config.rate_limit {
		ratelimit::credentials()
	} else {
		None
	};

	if let Some(limiter) = &limiter {
		ratelimit::cleanup_old_limits(&[limiter]);
	}

	let state = State {
		database,
		hasher: Argon2::default(),
		key: config.key(),
		limiter,
	};

	let app = route::app(state);
	let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;

	tracing::info!(address = %listener.local_addr()?, "listening");

	axum::serve(
		listener,
		app.into_make_service_with_connect_info::<SocketAddr>(),
	)
	.with_graceful_shutdown(shutdown_signal())
	.await?;

	Ok(())
}

async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(error) = tokio::signal::ctrl_c().await {
			tracing::error!(%error, "failed to listen for ctrl+c");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut stream) => {
				stream.recv().await;
			}
			Err(error) => {
				tracing::error!(%error, "failed to listen for SIGTERM");
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		() = ctrl_c => {},
		() = terminate => {},
	}

	tracing::info!("shutting down");
}
