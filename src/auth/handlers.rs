use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest, UserResource, UserSearchQuery},
        extractors::AuthUser,
        repo_types::{ProfileChanges, User},
        services::{
            check_email, check_password, check_username, duplicate_user_field, hash_password,
            new_session_token, validate_login, validate_registration, verify_password,
        },
    },
    db::unique_violation,
    error::{AppError, AppResult, FieldErrors},
    extract::JsonBody,
    response::ApiResponse,
    state::AppState,
    storage::{pfp_key, pfp_url},
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users",
            post(register).get(get_me).patch(update_profile),
        )
        .route("/users/login", post(login))
        .route("/users/logout", post(logout))
        .route("/users/all", get(list_users))
        .route("/users/search", get(search_users))
        .layer(DefaultBodyLimit::max(5 * 1024 * 1024))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(mut payload): JsonBody<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserResource>>)> {
    validate_registration(&mut payload).into_result()?;

    let mut errors = FieldErrors::new();
    if User::find_by_username(&state.db, &payload.username).await?.is_some() {
        errors.add("username", "Username already exists");
    }
    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        errors.add("email", "Email already exists");
    }
    if !errors.is_empty() {
        warn!(username = %payload.username, "registration conflict");
        return Err(AppError::Validation(errors));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, &payload.username, &payload.email, &hash)
        .await
        .map_err(user_write_error)?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(ApiResponse::created(
        "User registered successfully",
        UserResource::public(user),
    ))
}

/// A unique violation on `users` becomes the same field error the pre-checks report.
fn user_write_error(err: anyhow::Error) -> AppError {
    match unique_violation(&err).as_deref().and_then(duplicate_user_field) {
        Some(errors) => {
            warn!(error = %err, "user write lost a uniqueness race");
            AppError::Validation(errors)
        }
        None => AppError::Internal(err),
    }
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(mut payload): JsonBody<LoginRequest>,
) -> AppResult<Json<ApiResponse<UserResource>>> {
    validate_login(&mut payload).into_result()?;

    let Some(mut user) = User::find_by_username(&state.db, &payload.username).await? else {
        warn!(username = %payload.username, "login unknown username");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = new_session_token();
    User::set_token(&state.db, user.id, Some(&token)).await?;
    user.token = Some(token);

    info!(user_id = %user.id, "user logged in");
    Ok(ApiResponse::ok(
        "Login successful",
        UserResource::with_token(user),
    ))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<ApiResponse<UserResource>>> {
    let resource = with_pfp_url(&state, UserResource::public(user)).await;
    Ok(ApiResponse::ok("Current user", resource))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<ApiResponse<bool>>> {
    User::set_token(&state.db, user.id, None).await?;
    info!(user_id = %user.id, "user logged out");
    Ok(ApiResponse::ok("Logged out", true))
}

struct UploadedImage {
    body: Bytes,
    content_type: String,
    file_name: Option<String>,
}

#[derive(Default)]
struct ProfileForm {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
    pfp: Option<UploadedImage>,
}

async fn read_profile_form(mut mp: Multipart) -> AppResult<ProfileForm> {
    let mut form = ProfileForm::default();
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("pfp") => {
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| "application/octet-stream".into());
                let file_name = field.file_name().map(str::to_string);
                let body = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                if !body.is_empty() {
                    form.pfp = Some(UploadedImage {
                        body,
                        content_type,
                        file_name,
                    });
                }
            }
            Some(key @ ("username" | "email" | "password")) => {
                let key = key.to_string();
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                let value = value.trim().to_string();
                match key.as_str() {
                    "username" => form.username = Some(value),
                    "email" => form.email = Some(value.to_lowercase()),
                    _ => form.password = Some(value),
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

/// Multipart fields `username`, `email`, `password`, `pfp` (file); all optional.
#[instrument(skip(state, user, mp), fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mp: Multipart,
) -> AppResult<Json<ApiResponse<UserResource>>> {
    let form = read_profile_form(mp).await?;

    let mut errors = FieldErrors::new();
    if let Some(username) = &form.username {
        check_username(&mut errors, username);
    }
    if let Some(email) = &form.email {
        check_email(&mut errors, email);
    }
    if let Some(password) = &form.password {
        check_password(&mut errors, password);
    }
    errors.into_result()?;

    let mut errors = FieldErrors::new();
    let username = form.username.filter(|u| *u != user.username);
    if let Some(username) = &username {
        if User::find_by_username(&state.db, username).await?.is_some() {
            errors.add("username", "Username already exists");
        }
    }
    let email = form.email.filter(|e| *e != user.email);
    if let Some(email) = &email {
        if User::find_by_email(&state.db, email).await?.is_some() {
            errors.add("email", "Email already exists");
        }
    }
    errors.into_result()?;

    let password_hash = form.password.as_deref().map(hash_password).transpose()?;

    let replaced_pfp = form.pfp.as_ref().and(user.pfp.clone());
    let updated = save_profile(
        &state,
        user.id,
        ProfileChanges {
            username,
            email,
            password_hash,
            pfp: None,
        },
        form.pfp,
    )
    .await?;

    if let Some(old) = replaced_pfp {
        if let Err(e) = state.storage.delete_object(&old).await {
            warn!(error = %e, key = %old, "failed to delete previous profile image");
        }
    }

    info!(user_id = %updated.id, "profile updated");
    let resource = with_pfp_url(&state, UserResource::public(updated)).await;
    Ok(ApiResponse::ok("Profile updated", resource))
}

/// Uploads `image` (if any) and writes `changes`. A failed write removes the new object.
async fn save_profile(
    state: &AppState,
    user_id: Uuid,
    mut changes: ProfileChanges,
    image: Option<UploadedImage>,
) -> AppResult<User> {
    if let Some(image) = image {
        let key = pfp_key(image.file_name.as_deref(), &image.content_type);
        state
            .storage
            .put_object(&key, image.body, &image.content_type)
            .await?;
        changes.pfp = Some(key);
    }

    let uploaded = changes.pfp.clone();
    match User::update_profile(&state.db, user_id, changes).await {
        Ok(user) => Ok(user),
        Err(e) => {
            if let Some(key) = uploaded {
                if let Err(del) = state.storage.delete_object(&key).await {
                    warn!(error = %del, key = %key, "failed to delete orphaned profile image");
                }
            }
            Err(user_write_error(e))
        }
    }
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<UserResource>>>> {
    let users = User::list_non_admin(&state.db).await?;
    Ok(ApiResponse::ok(
        "Users fetched successfully",
        users.into_iter().map(UserResource::public).collect(),
    ))
}

#[instrument(skip(state))]
pub async fn search_users(
    State(state): State<AppState>,
    Query(q): Query<UserSearchQuery>,
) -> AppResult<Json<ApiResponse<Vec<UserResource>>>> {
    let term = q.query.unwrap_or_default();
    let users = User::search(&state.db, term.trim()).await?;
    Ok(ApiResponse::ok(
        "Users fetched successfully",
        users.into_iter().map(UserResource::public).collect(),
    ))
}

/// Swaps the stored image key for a presigned link.
async fn with_pfp_url(state: &AppState, mut resource: UserResource) -> UserResource {
    if let Some(key) = resource.pfp.take() {
        resource.pfp = Some(pfp_url(state.storage.as_ref(), key).await);
    }
    resource
}
