//! Genre aggregation over a user's watchlist and genre-based recommendations.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    catalog::MovieCatalog,
    error::{AppError, AppResult, FieldErrors},
    movies::dto::MovieCard,
};

pub const MIN_STATUS_ID: i32 = 1;
pub const MAX_STATUS_ID: i32 = 4;
pub const MAX_SCORE: i32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreCount {
    pub id: i64,
    pub name: String,
    pub count: u32,
}

/// Genre id to its tally, ordered by id.
pub type GenreTally = BTreeMap<i64, GenreCount>;

/// Fetches each movie's genres in order, one remote call per id, and counts them.
///
/// The first name seen for a genre id is kept. A failed lookup is logged and skipped.
pub async fn tally_genres(catalog: &dyn MovieCatalog, movie_ids: &[i64]) -> GenreTally {
    let mut tally = GenreTally::new();
    for &movie_id in movie_ids {
        let details = match catalog.movie(movie_id).await {
            Ok(details) => details,
            Err(e) => {
                warn!(error = %e, movie_id, "genre lookup failed; skipping movie");
                continue;
            }
        };
        for genre in details.genres {
            tally
                .entry(genre.id)
                .and_modify(|g| g.count += 1)
                .or_insert(GenreCount {
                    id: genre.id,
                    name: genre.name,
                    count: 1,
                });
        }
    }
    debug!(movies = movie_ids.len(), genres = tally.len(), "genres tallied");
    tally
}

/// Highest count wins; equal counts go to the lower genre id.
pub fn most_common(tally: &GenreTally) -> Option<&GenreCount> {
    // Ids ascend, so keeping the current best on equal counts keeps the lowest id.
    tally.values().fold(None, |best, g| match best {
        Some(b) if b.count >= g.count => Some(b),
        _ => Some(g),
    })
}

/// Popular movies of one genre. An empty page is a 404.
pub async fn recommend_by_genre(
    catalog: &dyn MovieCatalog,
    genre_id: i64,
) -> AppResult<Vec<MovieCard>> {
    let movies = catalog.discover_by_genre(genre_id).await?;
    if movies.is_empty() {
        return Err(AppError::NotFound(
            "No recommendations found for this genre".into(),
        ));
    }
    Ok(movies.into_iter().map(MovieCard::from).collect())
}

/// Checks a watchlist body and returns the movie id.
pub fn validate_entry(
    movie_id: Option<i64>,
    status_id: Option<i32>,
    score: Option<i32>,
) -> AppResult<(i64, i32)> {
    let mut errors = FieldErrors::new();
    match movie_id {
        None => errors.add("movie_id", "The movie id field is required."),
        Some(id) if id <= 0 => errors.add("movie_id", "The movie id must be a positive integer."),
        Some(_) => {}
    }
    match status_id {
        None => errors.add("status_id", "The status id field is required."),
        Some(id) if !(MIN_STATUS_ID..=MAX_STATUS_ID).contains(&id) => errors.add(
            "status_id",
            format!("The status id must be between {MIN_STATUS_ID} and {MAX_STATUS_ID}."),
        ),
        Some(_) => {}
    }
    if let Some(score) = score {
        if !(0..=MAX_SCORE).contains(&score) {
            errors.add("score", format!("The score must be between 0 and {MAX_SCORE}."));
        }
    }
    errors.into_result()?;
    Ok((movie_id.unwrap_or_default(), status_id.unwrap_or_default()))
}
