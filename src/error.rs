use axum::{
	body::Body,
	extract::rejection,
	http::{Response, StatusCode},
	response::IntoResponse,
	Json,
};
use serde::Serialize;
use tower_governor::GovernorError;

/// Error type for the application.
///
/// The Display trait is not sent to the client, so it can show
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("form error: {0}")]
	Form(#[from] rejection::FormRejection),
	#[error("path error: {0}")]
	Path(#[from] rejection::PathRejection),
	#[error("forbidden")]
	Forbidden,
	#[error("rate limited: {0}")]
	RateLimit(#[from] GovernorError),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
}

/// A single error message shown to the client.
#[derive(Debug, Serialize)]
pub struct Message {
	pub content: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<String>,
}

impl Message {
	pub fn new(content: impl Into<String>) -> Self {
		Self {
			content: content.into(),
			field: None,
		}
	}

	pub fn field(mut self, field: impl Into<String>) -> Self {
		self.field = Some(field.into());
		self
	}
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
	pub success: bool,
	pub errors: Vec<Message>,
}

impl ErrorResponse {
	pub fn build(status: StatusCode, errors: Vec<Message>) -> Response<Body> {
		(
			status,
			Json(ErrorResponse {
				success: false,
				errors,
			}),
		)
			.into_response()
	}
}

/// Implemented by the error type of each route module.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;

	fn errors(&self) -> Vec<Message>;
}

/// The error returned by handlers, either specific to the
/// route module or shared with the rest of the application.
#[derive(Debug, thiserror::Error)]
pub enum RouteError<E> {
	#[error(transparent)]
	Route(E),
	#[error(transparent)]
	App(#[from] AppError),
}

impl<E: ErrorShape> From<E> for RouteError<E> {
	fn from(error: E) -> Self {
		Self::Route(error)
	}
}

impl<E> From<sqlx::Error> for RouteError<E> {
	fn from(error: sqlx::Error) -> Self {
		Self::App(AppError::Database(error))
	}
}

impl<E: ErrorShape> IntoResponse for RouteError<E> {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::Route(error) => {
				let status = error.status();

				if status.is_server_error() {
					tracing::error!(%error, "route error");
				}

				ErrorResponse::build(status, error.errors())
			}
			Self::App(error) => error.into_response(),
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::Validation(errors) => ErrorResponse::build(
				StatusCode::UNPROCESSABLE_ENTITY,
				errors
					.field_errors()
					.into_iter()
					.flat_map(|(field, errors)| {
						let field = field.to_string();

						errors
							.iter()
							.map(move |error| Message::new(error.to_string()).field(field.clone()))
					})
					.collect(),
			),
			Self::Form(rejection) => {
				ErrorResponse::build(rejection.status(), vec![Message::new(rejection.body_text())])
			}
			Self::Path(rejection) => {
				ErrorResponse::build(rejection.status(), vec![Message::new(rejection.body_text())])
			}
			// No custom page, just the status.
			Self::Forbidden => StatusCode::FORBIDDEN.into_response(),
			Self::RateLimit(error) => rate_limit_response(error),
			error => {
				tracing::error!(%error, "internal error");

				ErrorResponse::build(StatusCode::INTERNAL_SERVER_ERROR, Vec::new())
			}
		}
	}
}

fn rate_limit_response(error: GovernorError) -> Response<Body> {
	match error {
		GovernorError::TooManyRequests { headers, .. } => {
			let mut response = ErrorResponse::build(
				StatusCode::TOO_MANY_REQUESTS,
				vec![Message::new("too many requests, slow down")],
			);

			if let Some(headers) = headers {
				response.headers_mut().extend(headers);
			}

			response
		}
		GovernorError::Other { code, .. } => ErrorResponse::build(code, Vec::new()),
		error => {
			tracing::error!(%error, "rate limiter failed");

			ErrorResponse::build(StatusCode::INTERNAL_SERVER_ERROR, Vec::new())
		}
	}
}
