use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    extract::{JsonBody, PathParam},
    movies::{dto::MovieCard, ensure_movie},
    response::ApiResponse,
    state::AppState,
    watchlists::{
        dto::{group_by_status, StatusGroup, WatchlistRequest},
        repo,
        repo_types::{Status, StatusCount, WatchlistEntry},
        services::{most_common, recommend_by_genre, tally_genres, validate_entry, GenreCount},
    },
};

const EMPTY_WATCHLIST: &str = "No movies found in the user's watchlist";
const NO_GENRES: &str = "No genres found in the user's watchlist";
const NOT_IN_WATCHLIST: &str = "Movie not found in current user's watchlist";

pub fn watchlist_routes() -> Router<AppState> {
    Router::new()
        .route("/watchlists", get(list_grouped).post(store_entry))
        .route(
            "/watchlists/:id",
            get(list_by_status).patch(update_entry).delete(delete_entry),
        )
        .route("/watchlist/genres", get(watchlist_genres))
        .route("/watchlist/most-genre", get(most_genre))
        .route("/watchlist/status-count", get(status_count))
        .route("/recs/dynamic", get(dynamic_recommendations))
        .route("/statuses", get(list_statuses))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_grouped(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<ApiResponse<Vec<StatusGroup>>>> {
    let entries = repo::list_for_user(&state.db, user.id).await?;
    if entries.is_empty() {
        return Err(AppError::NotFound(EMPTY_WATCHLIST.into()));
    }
    Ok(ApiResponse::ok(
        "All movies in current user's watchlist",
        group_by_status(entries),
    ))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_by_status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    PathParam(status_id): PathParam<i32>,
) -> AppResult<Json<ApiResponse<Vec<WatchlistEntry>>>> {
    let entries = repo::list_by_status(&state.db, user.id, status_id).await?;
    Ok(ApiResponse::ok(
        "All movies in current user's watchlist with status",
        entries,
    ))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn store_entry(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(payload): JsonBody<WatchlistRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<WatchlistEntry>>)> {
    let (movie_id, status_id) =
        validate_entry(payload.movie_id, payload.status_id, payload.score)?;

    ensure_movie(&state, movie_id).await?;
    let entry = repo::create(&state.db, user.id, movie_id, status_id, payload.score).await?;

    info!(entry_id = %entry.id, movie_id, status_id, "watchlist entry created");
    Ok(ApiResponse::created("Movie added to watchlist", entry))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_entry(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    PathParam(id): PathParam<Uuid>,
    JsonBody(payload): JsonBody<WatchlistRequest>,
) -> AppResult<Json<ApiResponse<WatchlistEntry>>> {
    let Some(current) = repo::find_owned(&state.db, id, user.id).await? else {
        warn!(entry_id = %id, "update of missing or foreign watchlist entry");
        return Err(AppError::NotFound(NOT_IN_WATCHLIST.into()));
    };

    let (movie_id, status_id) =
        validate_entry(payload.movie_id, payload.status_id, payload.score)?;
    if movie_id != current.movie_id {
        ensure_movie(&state, movie_id).await?;
    }

    let Some(entry) =
        repo::update_owned(&state.db, id, user.id, movie_id, status_id, payload.score).await?
    else {
        return Err(AppError::NotFound(NOT_IN_WATCHLIST.into()));
    };

    info!(entry_id = %id, movie_id, status_id, "watchlist entry updated");
    Ok(ApiResponse::ok("Movie updated in watchlist", entry))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_entry(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    if !repo::delete_owned(&state.db, id, user.id).await? {
        warn!(entry_id = %id, "delete of missing or foreign watchlist entry");
        return Err(AppError::NotFound(NOT_IN_WATCHLIST.into()));
    }
    info!(entry_id = %id, "watchlist entry deleted");
    Ok(ApiResponse::message("Movie deleted from watchlist"))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn watchlist_genres(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<ApiResponse<Vec<GenreCount>>>> {
    let movie_ids = repo::movie_ids(&state.db, user.id).await?;
    if movie_ids.is_empty() {
        return Err(AppError::NotFound(EMPTY_WATCHLIST.into()));
    }
    let tally = tally_genres(state.catalog.as_ref(), &movie_ids).await;
    Ok(ApiResponse::ok(
        "All genres in current user's watchlist",
        tally.into_values().collect(),
    ))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn most_genre(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<ApiResponse<GenreCount>>> {
    let movie_ids = repo::movie_ids(&state.db, user.id).await?;
    if movie_ids.is_empty() {
        return Err(AppError::NotFound(EMPTY_WATCHLIST.into()));
    }
    let tally = tally_genres(state.catalog.as_ref(), &movie_ids).await;
    let Some(top) = most_common(&tally) else {
        return Err(AppError::NotFound(NO_GENRES.into()));
    };
    Ok(ApiResponse::ok(
        "Most common genre in the user's watchlist",
        top.clone(),
    ))
}

/// Recommendations for the watchlist's most common genre, or the default genre when the
/// watchlist is empty.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn dynamic_recommendations(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<ApiResponse<Vec<MovieCard>>>> {
    let movie_ids = repo::movie_ids(&state.db, user.id).await?;

    let genre_id = if movie_ids.is_empty() {
        state.config.default_genre_id
    } else {
        let tally = tally_genres(state.catalog.as_ref(), &movie_ids).await;
        match most_common(&tally) {
            Some(top) => top.id,
            None => return Err(AppError::NotFound(NO_GENRES.into())),
        }
    };

    info!(genre_id, "recommending by genre");
    let movies = recommend_by_genre(state.catalog.as_ref(), genre_id).await?;
    Ok(ApiResponse::ok(
        "Recommended movies fetched successfully",
        movies,
    ))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn status_count(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<ApiResponse<Vec<StatusCount>>>> {
    let counts = repo::status_counts(&state.db, user.id).await?;
    Ok(ApiResponse::ok(
        "Count of each status in the user's watchlist",
        counts,
    ))
}

#[instrument(skip(state))]
pub async fn list_statuses(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Status>>>> {
    let statuses = repo::list_statuses(&state.db).await?;
    Ok(ApiResponse::ok("Statuses fetched successfully", statuses))
}
