use axum::{
	extract::{rejection::FormRejection, State},
	response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use cookie::Key;
use sqlx::SqliteConnection;
use validator::Validate;

use crate::{
	error::AppError,
	extract::{Form, Identity, Session},
	flash::{self, Flash, Flashes},
	route::{auth, model::Page},
	Database,
};

use super::{model, Error, PostId, RouteError};

/// The display format of a post's date, e.g. `October 17, 2024`.
pub const DATE_FORMAT: &str = "%B %d, %Y";

fn map_unique_title(error: sqlx::Error) -> RouteError {
	match error {
		sqlx::Error::Database(ref d) if d.is_unique_violation() => Error::DuplicateTitle.into(),
		e => RouteError::from(e),
	}
}

async fn find_post(conn: &mut SqliteConnection, post_id: i64) -> Result<model::PostView, RouteError> {
	let post = sqlx::query_as::<_, model::PostView>(
		r#"
			SELECT post.*, "user".name AS author FROM post
			JOIN "user" ON "user".id = post.author_id
			WHERE post.id = ?
		"#,
	)
	.bind(post_id)
	.fetch_optional(&mut *conn)
	.await?;

	Ok(post.ok_or(Error::UnknownPost(post_id))?)
}

/// Loads a post and its comments, oldest comment first.
async fn post_page(conn: &mut SqliteConnection, post_id: i64) -> Result<model::PostPage, RouteError> {
	let model::PostView { post, author } = find_post(conn, post_id).await?;
	let comments = sqlx::query_as::<_, model::Comment>(
		r#"
			SELECT comment.*, "user".name AS author FROM comment
			JOIN "user" ON "user".id = comment.author_id
			WHERE comment.post_id = ?
			ORDER BY comment.id
		"#,
	)
	.bind(post_id)
	.fetch_all(&mut *conn)
	.await?;

	Ok(model::PostPage {
		post,
		author,
		comments,
	})
}

/// Lists every post, newest first.
pub async fn get_posts(
	State(database): State<Database>,
	identity: Identity,
	flashes: Flashes,
) -> Result<Page<model::Posts>, RouteError> {
	let posts = sqlx::query_as::<_, model::PostView>(
		r#"
			SELECT post.*, "user".name AS author FROM post
			JOIN "user" ON "user".id = post.author_id
			ORDER BY post.id DESC
		"#,
	)
	.fetch_all(&database)
	.await?;

	Ok(Page::new("index", &identity, flashes, model::Posts { posts }))
}

/// Shows a single post with its comments.
pub async fn get_post(
	State(database): State<Database>,
	identity: Identity,
	flashes: Flashes,
	PostId(id): PostId,
) -> Result<Page<model::PostPage>, RouteError> {
	let mut conn = database.acquire().await?;
	let page = post_page(&mut conn, id).await?;

	Ok(Page::new("post", &identity, flashes, page))
}

/// Adds a comment to a post and shows it again. Anonymous visitors are sent
/// to the login page instead.
///
/// The form is only read once the post is known to exist and the visitor is
/// logged in.
pub async fn add_comment(
	State(database): State<Database>,
	State(key): State<Key>,
	identity: Identity,
	flashes: Flashes,
	PostId(id): PostId,
	form: Result<axum::Form<model::CommentInput>, FormRejection>,
) -> Result<Response, RouteError> {
	let mut tx = database.begin().await?;

	find_post(&mut tx, id).await?;

	let Some(user) = identity.user() else {
		return Ok(flash::redirect(
			&key,
			auth::LOGIN_PATH,
			Flash::message("Please login to make a comment"),
		));
	};

	let axum::Form(input) = form.map_err(AppError::from)?;

	input.validate().map_err(AppError::from)?;

	sqlx::query("INSERT INTO comment (text, author_id, post_id) VALUES (?, ?, ?)")
		.bind(&input.comment)
		.bind(user.id)
		.bind(id)
		.execute(&mut *tx)
		.await?;

	let page = post_page(&mut tx, id).await?;

	tx.commit().await?;

	tracing::info!(post_id = id, user_id = user.id, "added comment");

	Ok(Page::new("post", &identity, flashes, page).into_response())
}

pub async fn new_post_page(identity: Identity, flashes: Flashes) -> Page<model::Editor> {
	Page::new(
		"make-post",
		&identity,
		flashes,
		model::Editor {
			is_edit: false,
			form: None,
		},
	)
}

/// Creates a new post, dated today.
pub async fn create_post(
	State(database): State<Database>,
	session: Session,
	Form(input): Form<model::CreatePost>,
) -> Result<Redirect, RouteError> {
	let date = Utc::now().format(DATE_FORMAT).to_string();
	let mut tx = database.begin().await?;

	let post = sqlx::query_as::<_, model::Post>(
		r#"
			INSERT INTO post (author_id, title, subtitle, date, body, img_url)
			VALUES (?, ?, ?, ?, ?, ?)
			RETURNING *
		"#,
	)
	.bind(session.user.id)
	.bind(&input.title)
	.bind(&input.subtitle)
	.bind(date)
	.bind(&input.body)
	.bind(&input.img_url)
	.fetch_one(&mut *tx)
	.await
	.map_err(map_unique_title)?;

	tx.commit().await?;

	tracing::info!(post_id = post.id, "created post");

	Ok(Redirect::to("/"))
}

/// Shows the editor filled with the current values of a post.
pub async fn edit_post_page(
	State(database): State<Database>,
	identity: Identity,
	flashes: Flashes,
	PostId(id): PostId,
) -> Result<Page<model::Editor>, RouteError> {
	let mut conn = database.acquire().await?;
	let model::PostView { post, .. } = find_post(&mut conn, id).await?;

	Ok(Page::new(
		"make-post",
		&identity,
		flashes,
		model::Editor {
			is_edit: true,
			form: Some(model::CreatePost::from(&post)),
		},
	))
}

/// Overwrites the editable fields of a post. The author and date never change.
pub async fn update_post(
	State(database): State<Database>,
	PostId(id): PostId,
	Form(input): Form<model::UpdatePost>,
) -> Result<Redirect, RouteError> {
	let mut tx = database.begin().await?;

	let post = sqlx::query_as::<_, model::Post>(
		r#"
			UPDATE post
			SET
				title = COALESCE(?, title),
				subtitle = COALESCE(?, subtitle),
				body = COALESCE(?, body),
				img_url = COALESCE(?, img_url)
			WHERE id = ?
			RETURNING *
		"#,
	)
	.bind(input.title)
	.bind(input.subtitle)
	.bind(input.body)
	.bind(input.img_url)
	.bind(id)
	.fetch_optional(&mut *tx)
	.await
	.map_err(map_unique_title)?
	.ok_or(Error::UnknownPost(id))?;

	tx.commit().await?;

	tracing::info!(post_id = post.id, "updated post");

	Ok(Redirect::to(&format!("/post/{}", post.id)))
}

/// Deletes a post along with its comments.
pub async fn delete_post(
	State(database): State<Database>,
	PostId(id): PostId,
) -> Result<Redirect, RouteError> {
	let mut tx = database.begin().await?;

	let comments = sqlx::query("DELETE FROM comment WHERE post_id = ?")
		.bind(id)
		.execute(&mut *tx)
		.await?;

	let post = sqlx::query("DELETE FROM post WHERE id = ?")
		.bind(id)
		.execute(&mut *tx)
		.await?;

	if post.rows_affected() == 0 {
		return Err(Error::UnknownPost(id).into());
	}

	tx.commit().await?;

	tracing::info!(
		post_id = id,
		comments = comments.rows_affected(),
		"deleted post"
	);

	Ok(Redirect::to("/"))
}
