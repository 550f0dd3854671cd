//! One-shot messages carried across a redirect.
//!
//! A handler that redirects can leave messages in a signed `flash` cookie.
//! The next page that renders drains them and clears the cookie.

use std::convert::Infallible;

use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request},
	response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use cookie::{Cookie, Key};
use serde::{Deserialize, Serialize};

use crate::jar;

pub const COOKIE_NAME: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
	Message,
	Info,
	Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
	pub category: Category,
	pub text: String,
}

impl Flash {
	pub fn message(text: impl Into<String>) -> Self {
		Self {
			category: Category::Message,
			text: text.into(),
		}
	}

	pub fn info(text: impl Into<String>) -> Self {
		Self {
			category: Category::Info,
			text: text.into(),
		}
	}

	pub fn error(text: impl Into<String>) -> Self {
		Self {
			category: Category::Error,
			text: text.into(),
		}
	}
}

/// Creates a signed cookie holding the messages.
pub fn create_cookie(key: &Key, flashes: &[Flash]) -> Cookie<'static> {
	// Serializing a list of plain structs cannot fail.
	let value = serde_json::to_string(flashes).unwrap_or_default();
	let cookie = Cookie::build((COOKIE_NAME, value))
		.http_only(true)
		.path("/")
		.build();

	jar::sign(key, cookie)
}

/// Creates an expired cookie used to drop messages that have been shown.
pub fn clear_cookie() -> Cookie<'static> {
	Cookie::build(COOKIE_NAME)
		.http_only(true)
		.path("/")
		.max_age(cookie::time::Duration::ZERO)
		.build()
}

/// Redirects to `to`, leaving a message for the next page.
pub fn redirect(key: &Key, to: &str, flash: Flash) -> Response {
	(
		AppendHeaders([(
			header::SET_COOKIE,
			jar::header_value(&create_cookie(key, &[flash])),
		)]),
		Redirect::to(to),
	)
		.into_response()
}

/// Extracts the messages left by a previous response.
///
/// A missing, forged or malformed cookie yields no messages.
#[derive(Debug, Default)]
pub struct Flashes(pub Vec<Flash>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Flashes
where
	Key: FromRef<S>,
	S: Send + Sync,
{
	type Rejection = Infallible;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let key = Key::from_ref(state);
		let flashes = jar::verified(&key, &parts.headers, COOKIE_NAME)
			.and_then(|cookie| serde_json::from_str(cookie.value()).ok())
			.unwrap_or_default();

		Ok(Self(flashes))
	}
}

#[cfg(test)]
mod test {
	use axum::http::{HeaderMap, HeaderValue, StatusCode};

	use super::*;

	#[test]
	fn test_redirect_carries_flash() {
		let key = Key::generate();
		let response = redirect(&key, "/login", Flash::error("USER ALREADY EXISTS"));

		assert_eq!(response.status(), StatusCode::SEE_OTHER);
		assert_eq!(response.headers()[header::LOCATION], "/login");

		let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
		let cookie = Cookie::parse_encoded(set_cookie.to_owned()).unwrap();

		let mut headers = HeaderMap::new();
		headers.insert(
			header::COOKIE,
			HeaderValue::from_str(&cookie.stripped().encoded().to_string()).unwrap(),
		);

		let verified = jar::verified(&key, &headers, COOKIE_NAME).unwrap();
		let flashes: Vec<Flash> = serde_json::from_str(verified.value()).unwrap();

		assert_eq!(flashes, vec![Flash::error("USER ALREADY EXISTS")]);
	}

	#[test]
	fn test_categories_serialize_lowercase() {
		let json = serde_json::to_value(Flash::info("bye")).unwrap();

		assert_eq!(json["category"], "info");
		assert_eq!(json["text"], "bye");
	}
}
