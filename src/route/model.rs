use axum::{
	body::Body,
	http::{header, Response},
	response::{AppendHeaders, IntoResponse},
	Json,
};
use serde::Serialize;

use crate::{
	extract::Identity,
	flash::{self, Flash, Flashes},
	jar,
	route::auth::model::User,
};

/// Content for pages that only carry the shared fields.
#[derive(Debug, Serialize)]
pub struct Empty {}

/// The view model handed to the presentation layer for a single page.
#[derive(Debug, Serialize)]
pub struct Page<T> {
	/// The template this page is rendered with.
	pub page: &'static str,
	/// The logged in user, or `null` for anonymous visitors.
	pub identity: Option<User>,
	pub flashes: Vec<Flash>,
	#[serde(flatten)]
	pub content: T,
}

impl<T> Page<T> {
	pub fn new(page: &'static str, identity: &Identity, Flashes(flashes): Flashes, content: T) -> Self {
		Self {
			page,
			identity: identity.user().cloned(),
			flashes,
			content,
		}
	}
}

/// Renders the page, clearing any flash messages it consumed.
impl<T: Serialize> IntoResponse for Page<T> {
	fn into_response(self) -> Response<Body> {
		if self.flashes.is_empty() {
			return Json(self).into_response();
		}

		(
			AppendHeaders([(
				header::SET_COOKIE,
				jar::header_value(&flash::clear_cookie()),
			)]),
			Json(self),
		)
			.into_response()
	}
}
