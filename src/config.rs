use cookie::Key;
use tracing::Level;

/// The file used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://blog.db";

/// `Key::derive_from` requires a master key of at least this many bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("{name} must be a number, got {value:?}")]
	Number { name: &'static str, value: String },
	#[error("SECRET_KEY must be at least {MIN_SECRET_LENGTH} bytes long")]
	ShortSecret,
	#[error("unknown log level {0:?}")]
	LogLevel(String),
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
	pub database_url: String,
	pub secret_key: Option<String>,
	pub host: String,
	pub port: u16,
	pub log_level: Level,
	/// OTLP collector to export spans to, if any.
	pub otlp_endpoint: Option<String>,
	/// Whether the credential routes are rate limited per peer address.
	pub rate_limit: bool,
}

impl Config {
	/// Loads the configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
		let secret_key = lookup("SECRET_KEY").filter(|key| !key.is_empty());

		if secret_key
			.as_ref()
			.is_some_and(|key| key.len() < MIN_SECRET_LENGTH)
		{
			return Err(ConfigError::ShortSecret);
		}

		let port = match lookup("PORT") {
			Some(value) => value.parse().map_err(|_| ConfigError::Number {
				name: "PORT",
				value,
			})?,
			None => 3000,
		};

		let log_level = match lookup("LOG_LEVEL") {
			Some(value) => value.parse().map_err(|_| ConfigError::LogLevel(value))?,
			None => Level::INFO,
		};

		Ok(Self {
			database_url: lookup("DATABASE_URL")
				.filter(|url| !url.is_empty())
				.unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
			secret_key,
			host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".into()),
			port,
			log_level,
			otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|url| !url.is_empty()),
			rate_limit: lookup("RATE_LIMIT").map_or(true, |value| value != "false" && value != "0"),
		})
	}

	/// Returns the key used to sign cookies.
	///
	/// Without a `SECRET_KEY`, a random key is generated, which means that
	/// sessions do not survive a restart.
	pub fn key(&self) -> Key {
		match &self.secret_key {
			Some(secret) => Key::derive_from(secret.as_bytes()),
			None => {
				tracing::warn!("SECRET_KEY is not set, sessions will be invalidated on restart");
				Key::generate()
			}
		}
	}
}
