use axum::{
	extract::{FromRef, FromRequestParts},
	http::request,
	response::{IntoResponse, Redirect, Response},
};
use cookie::Key;
use uuid::Uuid;

use crate::{error::AppError, jar, route::auth, session, Database};

/// The resolved user for the current request, or the anonymous sentinel.
///
/// Resolution never fails because of the client: a missing, forged or
/// unknown session cookie yields [`Identity::Anonymous`]. Only database
/// faults are rejected.
///
/// Guards store the identity they resolved in the request extensions, so
/// it is only looked up once per request.
#[derive(Debug, Clone)]
pub enum Identity {
	Anonymous,
	Authenticated(Session),
}

impl Identity {
	pub fn user(&self) -> Option<&auth::model::User> {
		match self {
			Self::Anonymous => None,
			Self::Authenticated(session) => Some(&session.user),
		}
	}

	pub fn is_admin(&self) -> bool {
		self.user().is_some_and(auth::model::User::is_admin)
	}

	async fn resolve(database: &Database, key: &Key, parts: &request::Parts) -> Result<Self, AppError> {
		let Some(session_id) = jar::verified(key, &parts.headers, session::COOKIE_NAME)
			.and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
		else {
			return Ok(Self::Anonymous);
		};

		let user = sqlx::query_as::<_, auth::model::User>(
			r#"
				SELECT "user".* FROM "user"
				JOIN session ON session.user_id = "user".id
				WHERE session.id = ?
			"#,
		)
		.bind(session_id)
		.fetch_optional(database)
		.await?;

		Ok(user.map_or(Self::Anonymous, |user| {
			Self::Authenticated(Session {
				id: session_id,
				user,
			})
		}))
	}
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Identity
where
	Database: FromRef<S>,
	Key: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = AppError;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		if let Some(identity) = parts.extensions.get::<Identity>() {
			return Ok(identity.clone());
		}

		let identity = Self::resolve(&Database::from_ref(state), &Key::from_ref(state), parts).await?;

		parts.extensions.insert(identity.clone());
		Ok(identity)
	}
}

/// Extracts the session and related user from the request.
///
/// Anonymous requests are redirected to the login page.
///
/// ```rust,ignore
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Session {
	pub id: Uuid,
	pub user: auth::model::User,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Database: FromRef<S>,
	Key: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = Response;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		match Identity::from_request_parts(parts, state)
			.await
			.map_err(IntoResponse::into_response)?
		{
			Identity::Authenticated(session) => Ok(session),
			Identity::Anonymous => Err(Redirect::to(auth::LOGIN_PATH).into_response()),
		}
	}
}
