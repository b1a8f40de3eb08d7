pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use services::ensure_movie;

pub fn router() -> Router<AppState> {
    handlers::movie_routes()
}
