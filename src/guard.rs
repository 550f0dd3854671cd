//! Guards that wrap handlers and block them before they run.
//!
//! Guards are applied with [`axum::middleware::from_fn_with_state`] as route
//! layers, so they compose by wrapping order: the layer added last runs first.
//!
//! ```rust,ignore
//! get(edit_post)
//! 	.route_layer(from_fn_with_state(state.clone(), guard::login_required))
//! 	.route_layer(from_fn_with_state(state.clone(), guard::admin_only))
//! ```

use axum::{
	extract::Request,
	middleware::Next,
	response::{IntoResponse, Redirect, Response},
};

use crate::{error::AppError, extract::Identity, route::auth};

/// Rejects every identity that is not an administrator with a 403,
/// without invoking the wrapped handler.
pub async fn admin_only(identity: Identity, mut request: Request, next: Next) -> Response {
	if !identity.is_admin() {
		tracing::debug!(
			user_id = identity.user().map(|user| user.id),
			path = %request.uri().path(),
			"rejected non-admin request"
		);

		return AppError::Forbidden.into_response();
	}

	request.extensions_mut().insert(identity);
	next.run(request).await
}

/// Redirects anonymous requests to the login page.
pub async fn login_required(identity: Identity, mut request: Request, next: Next) -> Response {
	if let Identity::Anonymous = identity {
		tracing::debug!(path = %request.uri().path(), "redirecting anonymous request to login");

		return Redirect::to(auth::LOGIN_PATH).into_response();
	}

	request.extensions_mut().insert(identity);
	next.run(request).await
}
