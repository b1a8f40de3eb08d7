use std::collections::HashSet;

use tracing::{debug, warn};

use crate::{
    error::{AppError, AppResult, FieldErrors},
    movies::{
        dto::{MovieDetails, MovieInput},
        repo,
        repo_types::MovieSummary,
    },
    state::AppState,
    translate::translate_or_original,
};

pub const MAX_QUERY_LEN: usize = 255;

/// Local rows first, then every remote row whose id has not been seen yet.
///
/// Local rows are never overridden by remote data, and no id appears twice.
pub fn merge_movies(local: Vec<MovieSummary>, remote: Vec<MovieSummary>) -> Vec<MovieSummary> {
    let mut seen: HashSet<i64> = HashSet::with_capacity(local.len() + remote.len());
    let mut merged = Vec::with_capacity(local.len() + remote.len());
    for movie in local.into_iter().chain(remote) {
        if seen.insert(movie.id) {
            merged.push(movie);
        }
    }
    merged
}

pub fn check_query(term: &str) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    if term.chars().count() > MAX_QUERY_LEN {
        errors.add(
            "query",
            format!("The query field must not be greater than {MAX_QUERY_LEN} characters."),
        );
    }
    errors.into_result()
}

/// Search local movies and the remote catalog. A remote failure degrades to local matches.
pub async fn search_movies(state: &AppState, term: &str) -> AppResult<Vec<MovieSummary>> {
    let term = term.trim();
    check_query(term)?;

    if term.is_empty() {
        return Ok(repo::list_all(&state.db).await?);
    }

    let local = repo::search_by_title(&state.db, term).await?;
    let remote = match state.catalog.search(term).await {
        Ok(results) => results.into_iter().map(MovieSummary::from).collect(),
        Err(e) => {
            warn!(error = %e, term, "remote search failed; returning local matches only");
            Vec::new()
        }
    };

    debug!(local = local.len(), remote = remote.len(), "merging search results");
    Ok(merge_movies(local, remote))
}

/// Makes sure a movie row exists before something references it.
///
/// Unknown ids are checked against the remote catalog and stored as id-only placeholders.
pub async fn ensure_movie(state: &AppState, movie_id: i64) -> AppResult<()> {
    if repo::exists(&state.db, movie_id).await? {
        return Ok(());
    }
    match state.catalog.movie(movie_id).await {
        Ok(_) => {
            repo::insert_placeholder(&state.db, movie_id).await?;
            debug!(movie_id, "placeholder movie created");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, movie_id, "remote lookup for unknown movie failed");
            Err(AppError::NotFound("Movie not found in remote catalog".into()))
        }
    }
}

/// Remote details with a translated overview; the stored row when the remote call fails.
pub async fn movie_details(state: &AppState, movie_id: i64) -> AppResult<(MovieDetails, bool)> {
    match state.catalog.movie(movie_id).await {
        Ok(details) => {
            let overview = match details.overview.as_deref() {
                Some(text) => Some(translate_or_original(state.translator.as_ref(), text).await),
                None => None,
            };
            Ok((MovieDetails::from_remote(details, overview), true))
        }
        Err(e) => {
            warn!(error = %e, movie_id, "remote details failed; trying local row");
            let Some(movie) = repo::find(&state.db, movie_id).await? else {
                return Err(AppError::NotFound("Movie not found".into()));
            };
            let genres = repo::genres_of(&state.db, movie_id).await?;
            Ok((MovieDetails::from_local(movie, genres), false))
        }
    }
}

/// Field errors for an admin movie body. `id` is only required on create.
pub async fn validate_movie_input(
    state: &AppState,
    input: &MovieInput,
    creating: bool,
) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    if creating {
        match input.id {
            None => errors.add("id", "The id field is required."),
            Some(id) if id <= 0 => errors.add("id", "The id must be a positive integer."),
            Some(_) => {}
        }
    }
    if let Some(title) = &input.title {
        if title.chars().count() > MAX_QUERY_LEN {
            errors.add(
                "title",
                format!("The title field must not be greater than {MAX_QUERY_LEN} characters."),
            );
        }
    }
    if let Some(vote) = input.vote_average {
        if !(0.0..=10.0).contains(&vote) {
            errors.add("vote_average", "The vote average must be between 0 and 10.");
        }
    }
    if let Some(genres) = &input.genres {
        if !genres.is_empty() {
            for id in repo::unknown_genres(&state.db, genres).await? {
                errors.add("genres", format!("The selected genre {id} is invalid."));
            }
        }
    }
    errors.into_result()
}
