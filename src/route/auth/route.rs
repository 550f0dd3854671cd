use argon2::{
	password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
	Argon2,
};
use axum::{
	extract::State,
	http::header,
	response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use cookie::Key;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::{
	extract::{Form, Identity, Session},
	flash::{self, Flash, Flashes},
	jar,
	route::model::{Empty, Page},
	session, AppState,
};

use super::{
	model::{self, Role, User},
	Error, RouteError,
};

/// Hashes a password with Argon2 and a random salt, returning a PHC string.
pub fn hash_password(hasher: &Argon2, password: &str) -> Result<String, Error> {
	let salt = SaltString::generate(&mut OsRng);

	hasher
		.hash_password(password.as_bytes(), &salt)
		.map(|hash| hash.to_string())
		.map_err(Error::Hash)
}

/// Checks a password against a stored PHC string.
pub fn verify_password(hasher: &Argon2, password: &str, hash: &str) -> Result<bool, Error> {
	let hash = PasswordHash::new(hash).map_err(Error::Hash)?;

	match hasher.verify_password(password.as_bytes(), &hash) {
		Ok(()) => Ok(true),
		Err(argon2::password_hash::Error::Password) => Ok(false),
		Err(error) => Err(Error::Hash(error)),
	}
}

async fn find_by_email(conn: &mut SqliteConnection, email: &str) -> Result<Option<User>, sqlx::Error> {
	sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE email = ?"#)
		.bind(email)
		.fetch_optional(&mut *conn)
		.await
}

/// Creates a new user. The role is decided in the same transaction as the
/// insert, so only one account can ever become the first administrator.
pub async fn create_user(
	conn: &mut SqliteConnection,
	hasher: &Argon2<'_>,
	input: &model::RegisterInput,
) -> Result<User, RouteError> {
	if find_by_email(conn, &input.email).await?.is_some() {
		return Err(Error::DuplicateEmail.into());
	}

	let password = hash_password(hasher, &input.password)?;
	let existing = sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM "user""#)
		.fetch_one(&mut *conn)
		.await?;

	sqlx::query_as::<_, User>(
		r#"
			INSERT INTO "user" (email, password, name, role)
			VALUES (?, ?, ?, ?)
			RETURNING *
		"#,
	)
	.bind(&input.email)
	.bind(password)
	.bind(&input.name)
	.bind(Role::for_new_user(existing))
	.fetch_one(&mut *conn)
	.await
	.map_err(|e| match e {
		sqlx::Error::Database(ref d) if d.is_unique_violation() => Error::DuplicateEmail.into(),
		e => RouteError::from(e),
	})
}

/// Looks up a user by their credentials.
pub async fn authenticate(
	conn: &mut SqliteConnection,
	hasher: &Argon2<'_>,
	input: &model::LoginInput,
) -> Result<User, RouteError> {
	let user = find_by_email(conn, &input.email)
		.await?
		.ok_or(Error::UnknownUser)?;

	if !verify_password(hasher, &input.password, &user.password)? {
		return Err(Error::BadPassword.into());
	}

	Ok(user)
}

/// Sends the user home with a fresh session cookie.
fn start_session(key: &Key, session_id: Uuid) -> Response {
	(
		AppendHeaders([(
			header::SET_COOKIE,
			jar::header_value(&session::create_cookie(key, session_id)),
		)]),
		Redirect::to("/"),
	)
		.into_response()
}

/// Turns a credential error into a redirect with a flash message.
fn bounce(key: &Key, error: RouteError) -> Result<Response, RouteError> {
	let error = match error {
		RouteError::Route(error) => error,
		error => return Err(error),
	};

	match error.redirect() {
		Some((to, flash)) => {
			tracing::info!(reason = %error, "rejected credentials");

			Ok(flash::redirect(key, to, flash))
		}
		None => Err(error.into()),
	}
}

pub async fn register_page(identity: Identity, flashes: Flashes) -> Page<Empty> {
	Page::new("register", &identity, flashes, Empty {})
}

/// Registers an account and logs it in.
pub async fn register(
	State(state): State<AppState>,
	Form(input): Form<model::RegisterInput>,
) -> Result<Response, RouteError> {
	let mut tx = state.database.begin().await?;

	let user = match create_user(&mut tx, &state.hasher, &input).await {
		Ok(user) => user,
		Err(error) => return bounce(&state.key, error),
	};

	let session_id = session::start(&mut tx, user.id).await?;

	tx.commit().await?;

	tracing::info!(
		user_id = user.id,
		email = %user.email,
		role = ?user.role,
		"registered user"
	);

	Ok(start_session(&state.key, session_id))
}

pub async fn login_page(identity: Identity, flashes: Flashes) -> Page<Empty> {
	Page::new("login", &identity, flashes, Empty {})
}

/// Logs in to an account.
pub async fn login(
	State(state): State<AppState>,
	Form(input): Form<model::LoginInput>,
) -> Result<Response, RouteError> {
	let mut tx = state.database.begin().await?;

	let user = match authenticate(&mut tx, &state.hasher, &input).await {
		Ok(user) => user,
		Err(error) => return bounce(&state.key, error),
	};

	let session_id = session::start(&mut tx, user.id).await?;

	tx.commit().await?;

	tracing::info!(user_id = user.id, "logged in");

	Ok(start_session(&state.key, session_id))
}

/// Logs out, ending the session on the server and clearing the cookie.
pub async fn logout(
	State(state): State<AppState>,
	session: Session,
) -> Result<Response, RouteError> {
	let mut conn = state.database.acquire().await?;

	session::end(&mut conn, session.id).await?;

	let flash = Flash::info(format!(
		"You have been logged out successfully, {}",
		session.user.name
	));

	Ok((
		AppendHeaders([
			(
				header::SET_COOKIE,
				jar::header_value(&session::clear_cookie()),
			),
			(
				header::SET_COOKIE,
				jar::header_value(&flash::create_cookie(&state.key, &[flash])),
			),
		]),
		Redirect::to("/"),
	)
		.into_response())
}
