use axum::{
	extract::{FromRequestParts, Path},
	http::{request, StatusCode},
	middleware::from_fn_with_state,
	routing::get,
	Router,
};

use crate::{
	error::{self, AppError},
	guard, AppState,
};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post {0}")]
	UnknownPost(i64),
	#[error("unknown post {0:?}")]
	MalformedPost(String),
	#[error("a post with this title already exists")]
	DuplicateTitle,
}

pub type RouteError = error::RouteError<Error>;

/// The `:id` segment of a post route.
///
/// Anything that is not an integer names no post, so it is rejected the same
/// way as an id that is not in the database.
pub struct PostId(pub i64);

#[axum::async_trait]
impl<S> FromRequestParts<S> for PostId
where
	S: Send + Sync,
{
	type Rejection = RouteError;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let Path(id) = Path::<String>::from_request_parts(parts, state)
			.await
			.map_err(AppError::from)?;

		match id.parse() {
			Ok(id) => Ok(Self(id)),
			Err(_) => Err(Error::MalformedPost(id).into()),
		}
	}
}

pub fn routes(state: &AppState) -> Router<AppState> {
	use route::*;

	let admin_only = || from_fn_with_state(state.clone(), guard::admin_only);

	Router::new()
		.route("/", get(get_posts))
		.route("/post/:id", get(get_post).post(add_comment))
		.route(
			"/new-post",
			get(new_post_page)
				.post(create_post)
				.route_layer(admin_only()),
		)
		.route(
			"/edit-post/:id",
			get(edit_post_page)
				.post(update_post)
				.route_layer(from_fn_with_state(state.clone(), guard::login_required))
				.route_layer(admin_only()),
		)
		.route("/delete/:id", get(delete_post).route_layer(admin_only()))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) | Self::MalformedPost(..) => StatusCode::NOT_FOUND,
			Self::DuplicateTitle => StatusCode::CONFLICT,
		}
	}

	fn errors(&self) -> Vec<error::Message> {
		match self {
			Self::UnknownPost(..) | Self::MalformedPost(..) => {
				vec![error::Message::new(self.to_string())]
			}
			Self::DuplicateTitle => vec![error::Message::new(self.to_string()).field("title")],
		}
	}
}
