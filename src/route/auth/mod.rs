use axum::{
	http::StatusCode,
	middleware::from_fn_with_state,
	routing::{get, post},
	Router,
};
use tower_governor::GovernorLayer;

use crate::{error, flash::Flash, guard, AppState};

pub mod model;
pub mod route;

pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("USER ALREADY EXISTS")]
	DuplicateEmail,
	#[error("User does not exist, please create an account")]
	UnknownUser,
	#[error("Incorrect password, please try again.")]
	BadPassword,
	#[error("password hashing error: {0}")]
	Hash(argon2::password_hash::Error),
}

pub type RouteError = error::RouteError<Error>;

impl Error {
	/// Where the user is sent, and what they are told, when this error
	/// interrupts a form submission. Errors without a redirect are faults.
	pub fn redirect(&self) -> Option<(&'static str, Flash)> {
		match self {
			Self::DuplicateEmail => Some((LOGIN_PATH, Flash::error(self.to_string()))),
			Self::UnknownUser => Some((REGISTER_PATH, Flash::message(self.to_string()))),
			Self::BadPassword => Some((LOGIN_PATH, Flash::message(self.to_string()))),
			Self::Hash(..) => None,
		}
	}
}

pub fn routes(state: &AppState) -> Router<AppState> {
	use route::*;

	let mut register_route = post(register);
	let mut login_route = post(login);

	if let Some(config) = &state.limiter {
		register_route = register_route.layer(GovernorLayer {
			config: config.clone(),
		});
		login_route = login_route.layer(GovernorLayer {
			config: config.clone(),
		});
	}

	Router::new()
		.route(REGISTER_PATH, register_route.get(register_page))
		.route(LOGIN_PATH, login_route.get(login_page))
		.route(
			"/logout",
			get(logout).route_layer(from_fn_with_state(state.clone(), guard::login_required)),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownUser | Self::BadPassword => StatusCode::UNAUTHORIZED,
			Self::DuplicateEmail => StatusCode::CONFLICT,
			Self::Hash(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn errors(&self) -> Vec<error::Message> {
		match self {
			Self::Hash(..) => Vec::new(),
			_ => vec![error::Message::new(self.to_string())],
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[sqlx::test]
	async fn test_signup_flow(pool: Database) {
		let app = app(pool.clone());

		let response = register(&app, "john@smith.com", "John").await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header("location"), "/");
		assert!(response
			.header("set-cookie")
			.to_str()
			.unwrap()
			.contains("session="));

		let body = app.get("/").await.json::<Value>();

		assert_eq!(body["identity"]["name"], "John");
		assert_eq!(body["identity"]["role"], "admin");
		// Credentials never leave the server.
		assert!(body["identity"].get("email").is_none());
		assert!(body["identity"].get("password").is_none());

		let (count, password): (i64, String) =
			sqlx::query_as(r#"SELECT COUNT(*), MAX(password) FROM "user""#)
				.fetch_one(&pool)
				.await
				.unwrap();

		assert_eq!(count, 1);
		assert!(!password.is_empty());
		assert_ne!(password, PASSWORD);
	}

	#[sqlx::test]
	async fn test_only_first_user_is_admin(pool: Database) {
		register(&app(pool.clone()), "admin@blog.com", "Admin").await;

		let app = app(pool.clone());
		register(&app, "jane@doe.com", "Jane").await;

		let body = app.get("/").await.json::<Value>();

		assert_eq!(body["identity"]["name"], "Jane");
		assert_eq!(body["identity"]["role"], "user");

		let roles: Vec<(i64, String)> = sqlx::query_as(r#"SELECT id, role FROM "user" ORDER BY id"#)
			.fetch_all(&pool)
			.await
			.unwrap();

		assert_eq!(roles, vec![(1, "admin".into()), (2, "user".into())]);
	}

	#[sqlx::test]
	async fn test_duplicate_email_redirects_to_login(pool: Database) {
		register(&app(pool.clone()), "john@smith.com", "John").await;

		let app = app(pool.clone());
		let response = register(&app, "john@smith.com", "Impostor").await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header("location"), "/login");
		assert_eq!(count(&pool, "user").await, 1);

		let body = app.get("/login").await.json::<Value>();

		assert_eq!(body["identity"], Value::Null);
		assert_eq!(body["flashes"][0]["text"], "USER ALREADY EXISTS");
		assert_eq!(body["flashes"][0]["category"], "error");

		// Flashes are shown once.
		let body = app.get("/login").await.json::<Value>();

		assert_eq!(body["flashes"], json!([]));
	}

	#[sqlx::test]
	async fn test_invalid_registration_is_rejected(pool: Database) {
		let app = app(pool.clone());

		let response = app
			.post("/register")
			.form(&[("email", "not-an-email"), ("password", PASSWORD), ("name", "John")])
			.await;

		assert_eq!(response.status_code(), 422);
		assert_eq!(response.json::<Value>()["errors"][0]["field"], "email");
		assert_eq!(count(&pool, "user").await, 0);
	}

	#[sqlx::test]
	async fn test_login(pool: Database) {
		register(&app(pool.clone()), "john@smith.com", "John").await;

		let app = app(pool);
		let response = login(&app, "john@smith.com", PASSWORD).await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header("location"), "/");

		let body = app.get("/").await.json::<Value>();

		assert_eq!(body["identity"]["id"], 1);
		assert_eq!(body["identity"]["name"], "John");
	}

	#[sqlx::test]
	async fn test_login_with_bad_password(pool: Database) {
		register(&app(pool.clone()), "john@smith.com", "John").await;

		let app = app(pool);
		let response = login(&app, "john@smith.com", "wrong password").await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header("location"), "/login");

		let body = app.get("/login").await.json::<Value>();

		assert_eq!(body["identity"], Value::Null);
		assert_eq!(body["flashes"][0]["text"], "Incorrect password, please try again.");
	}

	#[sqlx::test]
	async fn test_login_with_unknown_user(pool: Database) {
		let app = app(pool);
		let response = login(&app, "nobody@nowhere.com", PASSWORD).await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header("location"), "/register");

		let body = app.get("/register").await.json::<Value>();

		assert_eq!(body["identity"], Value::Null);
		assert_eq!(
			body["flashes"][0]["text"],
			"User does not exist, please create an account"
		);
	}

	#[sqlx::test]
	async fn test_logout(pool: Database) {
		let app = app(pool.clone());

		let response = app.get("/logout").await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header("location"), "/login");

		register(&app, "john@smith.com", "John").await;

		let response = app.get("/logout").await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header("location"), "/");
		assert_eq!(count(&pool, "session").await, 0);

		let body = app.get("/").await.json::<Value>();

		assert_eq!(body["identity"], Value::Null);
		assert_eq!(
			body["flashes"][0]["text"],
			"You have been logged out successfully, John"
		);
		assert_eq!(body["flashes"][0]["category"], "info");
	}

	#[sqlx::test]
	async fn test_forged_session_is_anonymous(pool: Database) {
		let app = app(pool);

		register(&app, "john@smith.com", "John").await;

		let response = app
			.get("/")
			.add_header(
				header::COOKIE,
				header::HeaderValue::from_static("session=00000000-0000-0000-0000-000000000000"),
			)
			.clear_cookies()
			.await;

		assert_eq!(response.json::<Value>()["identity"], Value::Null);
	}
}
