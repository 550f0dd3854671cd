use std::{sync::Arc, time::Duration};

use axum::{
	body::Body,
	response::{IntoResponse, Response},
};
use governor::{
	clock::QuantaInstant,
	middleware::{RateLimitingMiddleware, StateInformationMiddleware},
};
use tower_governor::{
	governor::{GovernorConfig, GovernorConfigBuilder},
	key_extractor::{KeyExtractor, PeerIpKeyExtractor},
	GovernorError,
};

use crate::error::AppError;

pub type Limiter = Arc<GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>>;

/// Limits for routes that check credentials: one request per second per
/// peer address, with bursts of up to five.
pub fn credentials() -> Option<Limiter> {
	GovernorConfigBuilder::default()
		.per_second(1)
		.burst_size(5)
		.use_headers()
		.error_handler(error_handler)
		.finish()
		.map(Arc::new)
}

fn error_handler(error: GovernorError) -> Response<Body> {
	AppError::from(error).into_response()
}

/// Purges the state of addresses that have not been seen recently, once a minute.
pub fn cleanup_old_limits<T, M>(configs: &[&Arc<GovernorConfig<T, M>>])
where
	T: KeyExtractor,
	<T as KeyExtractor>::Key: Send + Sync + 'static,
	M: RateLimitingMiddleware<QuantaInstant> + Send + Sync + 'static,
{
	let limiters = configs
		.iter()
		.map(|config| config.limiter().clone())
		.collect::<Vec<_>>();
	let interval = Duration::from_secs(60);

	std::thread::spawn(move || loop {
		std::thread::sleep(interval);

		for limiter in &limiters {
			tracing::debug!(keys = limiter.len(), "purging rate limit storage");

			limiter.retain_recent();
		}
	});
}

#[cfg(test)]
mod test {
	use std::net::SocketAddr;

	use axum::{
		extract::ConnectInfo,
		http::{header, Request, StatusCode},
	};
	use tower::ServiceExt;

	use super::*;
	use crate::test::Database;

	fn login_from(peer: SocketAddr) -> Request<Body> {
		let mut request = Request::post("/login")
			.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
			.body(Body::from("email=nobody%40nowhere.com&password=hunter2"))
			.unwrap();

		request.extensions_mut().insert(ConnectInfo(peer));
		request
	}

	#[test]
	fn test_credentials_config_is_valid() {
		assert!(credentials().is_some());
	}

	#[sqlx::test]
	async fn test_login_is_limited_after_burst(pool: Database) {
		let mut state = crate::test::state(pool);

		state.limiter = credentials();

		let app = crate::route::app(state);
		let peer = SocketAddr::from(([1, 2, 3, 4], 4000));

		for _ in 0..5 {
			let response = app.clone().oneshot(login_from(peer)).await.unwrap();

			assert_eq!(response.status(), StatusCode::SEE_OTHER);
		}

		let response = app.clone().oneshot(login_from(peer)).await.unwrap();

		assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
		assert!(response
			.headers()
			.keys()
			.any(|name| name.as_str().starts_with("x-ratelimit")));

		// Other addresses keep their own budget.
		let other = SocketAddr::from(([5, 6, 7, 8], 4000));
		let response = app.oneshot(login_from(other)).await.unwrap();

		assert_eq!(response.status(), StatusCode::SEE_OTHER);
	}
}
