use cookie::{Cookie, Key, SameSite};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::jar;

pub const COOKIE_NAME: &str = "session";

/// Creates a signed session cookie with no expiry.
pub fn create_cookie(key: &Key, session_id: Uuid) -> Cookie<'static> {
	let cookie = Cookie::build((COOKIE_NAME, session_id.to_string()))
		.secure(!cfg!(debug_assertions))
		.http_only(true)
		.same_site(SameSite::Lax)
		.path("/")
		.build();

	jar::sign(key, cookie)
}

/// Creates an empty session cookie used to invalidate a previous one.
pub fn clear_cookie() -> Cookie<'static> {
	Cookie::build(COOKIE_NAME)
		.http_only(true)
		.path("/")
		.max_age(cookie::time::Duration::ZERO)
		.build()
}

/// Starts a new session for the user, returning its id.
pub async fn start(conn: &mut SqliteConnection, user_id: i64) -> Result<Uuid, sqlx::Error> {
	let session_id = Uuid::new_v4();

	sqlx::query("INSERT INTO session (id, user_id) VALUES (?, ?)")
		.bind(session_id)
		.bind(user_id)
		.execute(&mut *conn)
		.await?;

	Ok(session_id)
}

/// Ends a session. Ending a session that does not exist is not an error.
pub async fn end(conn: &mut SqliteConnection, session_id: Uuid) -> Result<(), sqlx::Error> {
	sqlx::query("DELETE FROM session WHERE id = ?")
		.bind(session_id)
		.execute(&mut *conn)
		.await?;

	Ok(())
}
