use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::AdminUser,
    catalog::MovieList,
    error::{AppError, AppResult, FieldErrors},
    extract::{JsonBody, PathParam},
    movies::{
        dto::{MovieCard, MovieDetails, MovieInput, MovieSearchQuery, MovieWithGenres},
        repo,
        repo_types::MovieSummary,
        services::{movie_details, search_movies, validate_movie_input},
    },
    response::ApiResponse,
    state::AppState,
};

pub fn movie_routes() -> Router<AppState> {
    Router::new()
        .route("/movies", get(search).post(create_movie))
        .route(
            "/movies/:id",
            get(show).patch(update_movie).delete(delete_movie),
        )
        .route("/movies/:id/recommendations", get(recommendations))
        .route("/recs", get(missing_list_kind))
        .route("/recs/:kind", get(curated_list))
}

#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(q): Query<MovieSearchQuery>,
) -> AppResult<Json<ApiResponse<Vec<MovieSummary>>>> {
    let term = q.query.unwrap_or_default();
    let movies = search_movies(&state, &term).await?;
    Ok(ApiResponse::ok("Movies fetched successfully", movies))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> AppResult<Json<ApiResponse<MovieDetails>>> {
    let (details, from_remote) = movie_details(&state, id).await?;
    let message = if from_remote {
        "Movie details fetched from remote catalog"
    } else {
        "Movie fetched from local database"
    };
    Ok(ApiResponse::ok(message, details))
}

#[instrument(skip(state))]
pub async fn recommendations(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> AppResult<Json<ApiResponse<Vec<MovieCard>>>> {
    let movies = state.catalog.recommendations(id).await?;
    if movies.is_empty() {
        return Err(AppError::NotFound(
            "No recommendations found for this movie".into(),
        ));
    }
    Ok(ApiResponse::ok(
        "Recommendations fetched successfully",
        movies.into_iter().map(MovieCard::from).collect(),
    ))
}

pub async fn missing_list_kind() -> AppError {
    AppError::BadRequest("You need to specify the type of recommendation.".into())
}

#[instrument(skip(state))]
pub async fn curated_list(
    State(state): State<AppState>,
    PathParam(kind): PathParam<String>,
) -> AppResult<Json<ApiResponse<Vec<MovieCard>>>> {
    let Some(list) = MovieList::from_slug(&kind) else {
        return Err(AppError::NotFound(format!(
            "Unknown recommendation type '{kind}'"
        )));
    };
    let movies = state.catalog.list(list).await?;
    Ok(ApiResponse::ok(
        format!("{} movies fetched successfully", list.label()),
        movies.into_iter().map(MovieCard::from).collect(),
    ))
}

#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn create_movie(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    JsonBody(input): JsonBody<MovieInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<MovieWithGenres>>)> {
    validate_movie_input(&state, &input, true).await?;
    let id = input.id.unwrap_or_default();

    if repo::exists(&state.db, id).await? {
        return Err(AppError::Validation(FieldErrors::single(
            "id",
            "The movie already exists.",
        )));
    }

    let movie = repo::create(&state.db, id, &input).await?;
    let genres = repo::genres_of(&state.db, id).await?;
    info!(movie_id = id, "movie created");
    Ok(ApiResponse::created(
        "Movie created successfully",
        MovieWithGenres { movie, genres },
    ))
}

#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn update_movie(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    PathParam(id): PathParam<i64>,
    JsonBody(input): JsonBody<MovieInput>,
) -> AppResult<Json<ApiResponse<MovieWithGenres>>> {
    validate_movie_input(&state, &input, false).await?;

    let Some(movie) = repo::update(&state.db, id, &input).await? else {
        return Err(AppError::NotFound("Movie not found".into()));
    };
    let genres = repo::genres_of(&state.db, id).await?;
    info!(movie_id = id, "movie updated");
    Ok(ApiResponse::ok(
        "Movie updated successfully",
        MovieWithGenres { movie, genres },
    ))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_movie(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    PathParam(id): PathParam<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    if repo::delete(&state.db, id).await?.is_none() {
        warn!(movie_id = id, "delete of unknown movie");
        return Err(AppError::NotFound("Movie not found".into()));
    }
    info!(movie_id = id, "movie deleted");
    Ok(ApiResponse::message("Movie deleted successfully"))
}
