pub mod auth;
pub mod model;
pub mod page;
pub mod post;

use axum::{http::HeaderName, Router};
use tower::ServiceBuilder;
use tower_http::{
	compression::CompressionLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

use crate::AppState;

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Builds every route of the application, with the shared layers applied.
pub fn app(state: AppState) -> Router {
	Router::new()
		.merge(post::routes(&state))
		.merge(auth::routes(&state))
		.merge(page::routes())
		.layer(
			ServiceBuilder::new()
				.layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
				.layer(TraceLayer::new_for_http())
				.layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
				.layer(CompressionLayer::new()),
		)
		.with_state(state)
}
