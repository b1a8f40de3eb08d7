//! Remote movie catalog.
//!
//! The rest of the crate only sees the [`MovieCatalog`] trait; [`tmdb::TmdbClient`] is the
//! production implementation and tests substitute mocks or fakes.

use async_trait::async_trait;

pub mod dto;
pub mod tmdb;

pub use dto::{MovieList, RemoteGenre, RemoteMovie, RemoteMovieDetails};
pub use tmdb::TmdbClient;

/// Failure of an outbound call to a remote service.
#[derive(thiserror::Error, Debug)]
pub enum RemoteError {
    #[error("remote call timed out")]
    Timeout,

    #[error("remote transport error: {0}")]
    Transport(String),

    #[error("remote returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected remote response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RemoteError::Timeout
        } else if e.is_decode() {
            RemoteError::Decode(e.to_string())
        } else {
            RemoteError::Transport(e.to_string())
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Full-text movie search.
    async fn search(&self, query: &str) -> Result<Vec<RemoteMovie>, RemoteError>;

    /// Details for one movie, including its genres.
    async fn movie(&self, id: i64) -> Result<RemoteMovieDetails, RemoteError>;

    /// Movies the catalog recommends for the given movie.
    async fn recommendations(&self, id: i64) -> Result<Vec<RemoteMovie>, RemoteError>;

    /// First page of non-adult, non-video movies of one genre, most popular first.
    async fn discover_by_genre(&self, genre_id: i64) -> Result<Vec<RemoteMovie>, RemoteError>;

    /// One of the curated lists (top rated, popular, ...).
    async fn list(&self, list: MovieList) -> Result<Vec<RemoteMovie>, RemoteError>;
}
