//! Signing and verification of the cookies the application sets.
//!
//! Values are signed with the application [`Key`] and percent-encoded, so
//! they can carry arbitrary text and cannot be forged by the client.

use axum::http::{header, HeaderMap, HeaderValue};
use cookie::{Cookie, CookieJar, Key};

/// Signs a cookie, returning the cookie that should be sent to the client.
pub fn sign(key: &Key, cookie: Cookie<'static>) -> Cookie<'static> {
	let name = cookie.name().to_owned();
	let mut jar = CookieJar::new();

	jar.signed_mut(key).add(cookie);
	jar.get(&name)
		.cloned()
		.unwrap_or_else(|| Cookie::new(name, ""))
}

/// Returns the verified value of the named cookie, if the request carries
/// one with a valid signature.
pub fn verified(key: &Key, headers: &HeaderMap, name: &str) -> Option<Cookie<'static>> {
	let mut jar = CookieJar::new();

	headers
		.get_all(header::COOKIE)
		.into_iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(Cookie::split_parse_encoded)
		.filter_map(Result::ok)
		.filter(|cookie| cookie.name() == name)
		.for_each(|cookie| jar.add_original(cookie.into_owned()));

	jar.signed(key).get(name)
}

/// Serializes a cookie into a `Set-Cookie` header value.
pub fn header_value(cookie: &Cookie<'_>) -> HeaderValue {
	// Percent-encoding leaves only visible ASCII, which is always a valid header value.
	HeaderValue::from_str(&cookie.encoded().to_string())
		.unwrap_or_else(|_| HeaderValue::from_static(""))
}

#[cfg(test)]
mod test {
	use super::*;

	fn request_with(cookie: &Cookie<'_>) -> HeaderMap {
		let mut headers = HeaderMap::new();
		let stripped = cookie.stripped().encoded().to_string();

		headers.insert(header::COOKIE, HeaderValue::from_str(&stripped).unwrap());
		headers
	}

	#[test]
	fn test_signed_cookie_verifies() {
		let key = Key::generate();
		let cookie = sign(&key, Cookie::new("flash", r#"[{"text": "hello, world"}]"#));

		let verified = verified(&key, &request_with(&cookie), "flash").unwrap();

		assert_eq!(verified.value(), r#"[{"text": "hello, world"}]"#);
	}

	#[test]
	fn test_tampered_cookie_is_rejected() {
		let key = Key::generate();
		let mut cookie = sign(&key, Cookie::new("session", "1"));
		let forged = cookie.value().replace('1', "2");

		cookie.set_value(forged);

		assert!(verified(&key, &request_with(&cookie), "session").is_none());
	}

	#[test]
	fn test_other_key_is_rejected() {
		let cookie = sign(&Key::generate(), Cookie::new("session", "1"));

		assert!(verified(&Key::generate(), &request_with(&cookie), "session").is_none());
	}
}
