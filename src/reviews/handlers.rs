use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::{AppError, AppResult, FieldErrors},
    extract::{JsonBody, PathParam},
    movies::ensure_movie,
    response::ApiResponse,
    reviews::{
        dto::{
            CreateReviewRequest, ReviewResource, UpdateReviewRequest, UserReview,
            REVIEW_PLACEHOLDER,
        },
        repo,
        repo_types::ReviewRow,
        services::resolve_movie_title,
    },
    state::AppState,
    storage::pfp_url,
};

pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", get(list_reviews))
        .route("/review", post(store_review))
        .route("/reviews/:id", patch(update_review).delete(delete_review))
        .route("/movies/:id/reviews", get(movie_reviews))
        .route("/movies/:id/reviews/latest", get(latest_movie_review))
        .route("/movies/:id/reviews/user", get(user_movie_review))
}

async fn to_resource(state: &AppState, mut row: ReviewRow) -> ReviewResource {
    let title = resolve_movie_title(state, row.movie_id, row.movie_title.take()).await;
    let pfp = match row.user_pfp.take() {
        Some(key) => Some(pfp_url(state.storage.as_ref(), key).await),
        None => None,
    };
    ReviewResource::new(row, title, pfp)
}

async fn to_resources(state: &AppState, rows: Vec<ReviewRow>) -> Vec<ReviewResource> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(to_resource(state, row).await);
    }
    out
}

#[instrument(skip(state))]
pub async fn list_reviews(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<ReviewResource>>>> {
    let rows = repo::list_all(&state.db).await?;
    let reviews = to_resources(&state, rows).await;
    Ok(ApiResponse::ok("Reviews fetched successfully", reviews))
}

#[instrument(skip(state))]
pub async fn movie_reviews(
    State(state): State<AppState>,
    PathParam(movie_id): PathParam<i64>,
) -> AppResult<Json<ApiResponse<Vec<ReviewResource>>>> {
    let rows = repo::list_for_movie(&state.db, movie_id).await?;
    let reviews = to_resources(&state, rows).await;
    Ok(ApiResponse::ok("Movie reviews fetched successfully", reviews))
}

#[instrument(skip(state))]
pub async fn latest_movie_review(
    State(state): State<AppState>,
    PathParam(movie_id): PathParam<i64>,
) -> AppResult<Json<ApiResponse<ReviewResource>>> {
    let Some(row) = repo::latest_for_movie(&state.db, movie_id).await? else {
        return Err(AppError::NotFound("No reviews found for this movie".into()));
    };
    let review = to_resource(&state, row).await;
    Ok(ApiResponse::ok("Latest review fetched successfully", review))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn user_movie_review(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    PathParam(movie_id): PathParam<i64>,
) -> AppResult<Json<ApiResponse<UserReview>>> {
    match repo::find_for_user(&state.db, user.id, movie_id).await? {
        Some(row) => {
            let review = to_resource(&state, row).await;
            Ok(ApiResponse::ok("Review fetched successfully", UserReview::Found(review)))
        }
        None => Ok(ApiResponse::ok(
            "Review not found",
            UserReview::Placeholder(REVIEW_PLACEHOLDER),
        )),
    }
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn store_review(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(payload): JsonBody<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ReviewResource>>)> {
    let movie_id = match payload.movie_id {
        Some(id) if id > 0 => id,
        Some(_) => {
            return Err(AppError::Validation(FieldErrors::single(
                "movie_id",
                "The movie id must be a positive integer.",
            )))
        }
        None => {
            return Err(AppError::Validation(FieldErrors::single(
                "movie_id",
                "The movie id field is required.",
            )))
        }
    };

    ensure_movie(&state, movie_id).await?;
    let review = repo::create(&state.db, user.id, movie_id, payload.body.as_deref()).await?;
    info!(review_id = %review.id, movie_id, "review created");

    let Some(row) = repo::find_row(&state.db, review.id).await? else {
        return Err(AppError::Internal(anyhow::anyhow!("review vanished after insert")));
    };
    let review = to_resource(&state, row).await;
    Ok(ApiResponse::created("Review created successfully", review))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_review(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    PathParam(id): PathParam<Uuid>,
    JsonBody(payload): JsonBody<UpdateReviewRequest>,
) -> AppResult<Json<ApiResponse<ReviewResource>>> {
    let body = payload.body.unwrap_or_default();
    if body.trim().is_empty() {
        return Err(AppError::Validation(FieldErrors::single(
            "body",
            "The body field is required.",
        )));
    }

    if repo::update_owned(&state.db, id, user.id, &body).await?.is_none() {
        warn!(review_id = %id, "update of missing or foreign review");
        return Err(AppError::NotFound("Review not found".into()));
    }
    let Some(row) = repo::find_row(&state.db, id).await? else {
        return Err(AppError::NotFound("Review not found".into()));
    };

    info!(review_id = %id, "review updated");
    let review = to_resource(&state, row).await;
    Ok(ApiResponse::ok("Review updated successfully", review))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_review(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    if !repo::delete_owned(&state.db, id, user.id).await? {
        warn!(review_id = %id, "delete of missing or foreign review");
        return Err(AppError::NotFound("Review not found".into()));
    }
    info!(review_id = %id, "review deleted");
    Ok(ApiResponse::message("Review deleted successfully"))
}
