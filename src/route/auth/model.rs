use serde::{Deserialize, Serialize};
use validator::Validate;

/// What a user is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
	/// Can create, edit and delete posts.
	Admin,
	/// Can comment on posts.
	User,
}

impl Role {
	/// The first account ever registered administers the blog.
	pub fn for_new_user(existing_users: i64) -> Self {
		if existing_users == 0 {
			Self::Admin
		} else {
			Self::User
		}
	}
}

/// A single user.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
	/// The unique identifier of the user.
	pub id: i64,
	/// The email address used for logging in.
	#[serde(skip_serializing)]
	pub email: String,
	/// The salted password hash, in PHC string format.
	#[serde(skip)]
	pub password: String,
	/// The name that is displayed to the public.
	pub name: String,
	pub role: Role,
}

impl User {
	pub fn is_admin(&self) -> bool {
		self.role == Role::Admin
	}
}

#[derive(Deserialize, Validate)]
pub struct RegisterInput {
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 1, max = 128))]
	pub password: String,
	/// The name that is displayed to the public.
	#[validate(length(min = 1, max = 250))]
	pub name: String,
}

#[derive(Deserialize, Validate)]
pub struct LoginInput {
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 1, max = 128))]
	pub password: String,
}

#[cfg(test)]
mod test {
	use super::Role;

	#[test]
	fn test_first_user_is_admin() {
		assert_eq!(Role::for_new_user(0), Role::Admin);
		assert_eq!(Role::for_new_user(1), Role::User);
		assert_eq!(Role::for_new_user(42), Role::User);
	}
}
