mod session;

pub use session::{Identity, Session};

use axum::extract::{FromRequest, Request};
use serde::de;

use crate::error::AppError;

/// Extractor that deserializes a url-encoded form body and validates it.
///
/// T must implement [`serde::de::DeserializeOwned`] and [`validator::Validate`]
/// in order to be used in an extractor.
///
/// ```rust,ignore
/// async fn route(Form(input): Form<LoginInput>) {
///   // ...
/// }
/// ```
pub struct Form<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for Form<T>
where
	T: de::DeserializeOwned + validator::Validate,
	S: Send + Sync,
{
	type Rejection = AppError;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let result = axum::extract::Form::<T>::from_request(req, state).await?.0;

		result.validate().map_err(Self::Rejection::Validation)?;
		Ok(Self(result))
	}
}
