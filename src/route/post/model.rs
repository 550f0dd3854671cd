use macros::model;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A single post, written by the administrator.
#[model]
#[derive(Debug, Clone, Deserialize, Serialize, Validate, sqlx::FromRow)]
pub struct Post {
	/// The unique identifier of the post.
	#[serde(skip_deserializing)]
	pub id: i64,
	/// The user that wrote the post.
	#[serde(skip_deserializing)]
	pub author_id: i64,
	/// The day the post was written, formatted for display (e.g. `October 17, 2024`).
	#[serde(skip_deserializing)]
	pub date: String,
	#[validate(length(min = 1, max = 250))]
	pub title: String,
	#[validate(length(min = 1, max = 250))]
	pub subtitle: String,
	/// The content of the post, as written in the editor.
	#[validate(length(min = 1))]
	pub body: String,
	/// The cover image of the post.
	#[validate(url, length(max = 250))]
	pub img_url: String,
}

/// A post along with the name of its author.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PostView {
	#[sqlx(flatten)]
	#[serde(flatten)]
	pub post: Post,
	pub author: String,
}

/// A comment along with the name of its author.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Comment {
	pub id: i64,
	pub text: String,
	pub author_id: i64,
	pub post_id: i64,
	pub author: String,
}

#[derive(Deserialize, Validate)]
pub struct CommentInput {
	#[validate(length(min = 1))]
	pub comment: String,
}

#[derive(Debug, Serialize)]
pub struct Posts {
	pub posts: Vec<PostView>,
}

#[derive(Debug, Serialize)]
pub struct PostPage {
	pub post: Post,
	pub author: String,
	pub comments: Vec<Comment>,
}

/// The editor, empty for a new post or filled with the current values of an existing one.
#[derive(Debug, Serialize)]
pub struct Editor {
	pub is_edit: bool,
	pub form: Option<CreatePost>,
}
