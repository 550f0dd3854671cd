use axum::{routing::get, Router};
use serde::Serialize;

use crate::{extract::Identity, flash::Flashes, AppState};

use super::model::Page;

pub fn routes() -> Router<AppState> {
	Router::new()
		.route("/about", get(about))
		.route("/contact", get(contact))
}

#[derive(Debug, Serialize)]
pub struct Static {
	pub title: &'static str,
	pub body: &'static str,
}

async fn about(identity: Identity, flashes: Flashes) -> Page<Static> {
	Page::new(
		"about",
		&identity,
		flashes,
		Static {
			title: "About Me",
			body: "A blog about whatever is on my mind this week.",
		},
	)
}

async fn contact(identity: Identity, flashes: Flashes) -> Page<Static> {
	Page::new(
		"contact",
		&identity,
		flashes,
		Static {
			title: "Contact Me",
			body: "Have questions? I have answers.",
		},
	)
}
