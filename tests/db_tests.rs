//! End-to-end flows against a real Postgres. Skipped unless `TEST_DATABASE_URL` is set.

mod common;

use std::sync::Arc;

use axum::{http::StatusCode, Router};
use cinelog::{
    app::build_app,
    auth::{services::duplicate_user_field, User},
    db,
    state::AppState,
};
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use common::{get, get_as, json_request, remote_movie, send, FailingTranslator, StubCatalog};

async fn test_state() -> Option<AppState> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("connect to test database");
    db::migrate(&pool).await.expect("migrate test database");
    Some(AppState::fake().with_db(pool))
}

fn unique(prefix: &str) -> String {
    format!("{prefix}{}", &Uuid::new_v4().simple().to_string()[..12])
}

fn unique_movie_id() -> i64 {
    2_000_000_000 + (Uuid::new_v4().as_u128() % 1_000_000_000) as i64
}

/// Registers and logs in a fresh user, returning its token.
async fn sign_up(app: &Router) -> (String, String) {
    let username = unique("user");
    let body = json!({
        "username": username,
        "email": format!("{username}@Example.com"),
        "password": "secret-password",
    });
    let (status, created) = send(app, json_request("POST", "/users", None, body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["email"], format!("{username}@example.com"));

    let login = json!({"username": username, "password": "secret-password"});
    let (status, body) = send(app, json_request("POST", "/users/login", None, login)).await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["token"].as_str().expect("token").to_string();
    (username, token)
}

#[tokio::test]
async fn session_lifecycle() {
    let Some(state) = test_state().await else { return };
    let app = common::app_with(state);
    let (username, token) = sign_up(&app).await;

    let (status, body) = send(&app, get_as("/users", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], username);
    assert!(body["data"].get("token").is_none());

    let (status, _) = send(&app, get_as("/users", "not-a-real-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, json_request("POST", "/users/logout", Some(&token), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], true);

    let (status, _) = send(&app, get_as("/users", &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_and_duplicates() {
    let Some(state) = test_state().await else { return };
    let app = common::app_with(state);
    let (username, _) = sign_up(&app).await;

    let login = json!({"username": username, "password": "nope"});
    let (status, body) = send(&app, json_request("POST", "/users/login", None, login)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Username or password wrong");

    let again = json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": "secret-password",
    });
    let (status, body) = send(&app, json_request("POST", "/users", None, again)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["username"][0], "Username already exists");
    assert_eq!(body["errors"]["email"][0], "Email already exists");
}

#[tokio::test]
async fn empty_watchlist_answers() {
    let Some(state) = test_state().await else { return };
    let app = common::app_with(state);
    let (_, token) = sign_up(&app).await;

    let (status, body) = send(&app, get_as("/watchlist/most-genre", &token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No movies found in the user's watchlist");

    let (status, _) = send(&app, get_as("/watchlists", &token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Default genre 14 when there is nothing to aggregate.
    let (status, body) = send(&app, get_as("/recs/dynamic", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], 1400);

    let (status, body) = send(&app, get_as("/watchlist/status-count", &token)).await;
    assert_eq!(status, StatusCode::OK);
    let counts: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["count"].as_i64().unwrap())
        .collect();
    assert_eq!(counts, vec![0, 0, 0, 0]);
}

#[tokio::test]
async fn watchlist_drives_genre_recommendations() {
    let Some(state) = test_state().await else { return };
    let app = common::app_with(state);
    let (_, token) = sign_up(&app).await;

    for movie_id in [333623, 10494] {
        let body = json!({"movie_id": movie_id, "status_id": 2, "score": 8});
        let (status, _) = send(&app, json_request("POST", "/watchlists", Some(&token), body)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, get_as("/watchlist/most-genre", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"id": 18, "name": "Drama", "count": 2}));

    let (status, body) = send(&app, get_as("/recs/dynamic", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], 1800);

    let (status, body) = send(&app, get_as("/watchlist/genres", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (status, body) = send(&app, get_as("/watchlists", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["status_id"], 2);
    assert_eq!(body["data"][0]["count"], 2);

    let (status, body) = send(&app, get_as("/watchlists/2", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_remote_movie_is_not_stored() {
    let Some(state) = test_state().await else { return };
    let app = common::app_with(state);
    let (_, token) = sign_up(&app).await;

    let body = json!({"movie_id": unique_movie_id(), "status_id": 1});
    let (status, body) = send(&app, json_request("POST", "/watchlists", Some(&token), body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Movie not found in remote catalog");

    let body = json!({"movie_id": 333623, "status_id": 9, "score": 11});
    let (status, body) = send(&app, json_request("POST", "/watchlists", Some(&token), body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["status_id"].is_array());
    assert!(body["errors"]["score"].is_array());
}

#[tokio::test]
async fn watchlist_entries_are_owner_only() {
    let Some(state) = test_state().await else { return };
    let app = common::app_with(state);
    let (_, owner) = sign_up(&app).await;
    let (_, other) = sign_up(&app).await;

    let body = json!({"movie_id": 10494, "status_id": 4});
    let (_, created) = send(&app, json_request("POST", "/watchlists", Some(&owner), body)).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/watchlists/{id}");

    let update = json!({"movie_id": 10494, "status_id": 2, "score": 6});
    let (status, _) = send(&app, json_request("PATCH", &uri, Some(&other), update.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, json_request("PATCH", &uri, Some(&owner), update)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status_id"], 2);
    assert_eq!(body["data"]["score"], 6);

    let (status, _) = send(&app, json_request("DELETE", &uri, Some(&other), json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, json_request("DELETE", &uri, Some(&owner), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn review_flow_with_labels() {
    let Some(state) = test_state().await else { return };
    let app = common::app_with(state);
    let (username, token) = sign_up(&app).await;

    let (status, body) = send(&app, get_as("/movies/10494/reviews/user", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], "type your review here");

    let entry = json!({"movie_id": 10494, "status_id": 2, "score": 5});
    send(&app, json_request("POST", "/watchlists", Some(&token), entry)).await;

    let review = json!({"movie_id": 10494, "body": "Unsettling."});
    let (status, body) = send(&app, json_request("POST", "/review", Some(&token), review)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["user_name"], username);
    assert_eq!(body["data"]["movie_title"], "Perfect Blue");
    assert_eq!(body["data"]["recommendation_message"], "Mixed Feelings");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, get_as("/movies/10494/reviews/user", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id.as_str());

    let (status, body) = send(&app, get("/movies/10494/reviews/latest")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["date"].as_str().is_some());

    let uri = format!("/reviews/{id}");
    let (status, _) = send(&app, json_request("PATCH", &uri, Some(&token), json!({"body": " "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = send(&app, json_request("PATCH", &uri, Some(&token), json!({"body": "Still great."}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["body"], "Still great.");

    let (status, _) = send(&app, json_request("DELETE", &uri, Some(&token), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, json_request("DELETE", &uri, Some(&token), json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn search_prefers_local_rows() {
    let Some(state) = test_state().await else { return };
    let local_id = unique_movie_id();
    let title = unique("Zeta Heist ");

    let catalog = StubCatalog::new().with_search_results(vec![
        remote_movie(local_id, "Remote copy"),
        remote_movie(680, "Pulp Fiction"),
    ]);
    let app = build_app(
        state
            .clone()
            .with_catalog(Arc::new(catalog))
            .with_translator(Arc::new(FailingTranslator)),
    );

    let (_, user_token) = sign_up(&app).await;
    let (admin_name, admin_token) = sign_up(&app).await;
    sqlx::query("UPDATE users SET is_admin = TRUE WHERE username = $1")
        .bind(&admin_name)
        .execute(&state.db)
        .await
        .unwrap();

    let movie = json!({"id": local_id, "title": title, "genres": [18, 80]});
    let (status, _) = send(&app, json_request("POST", "/movies", Some(&user_token), movie.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, json_request("POST", "/movies", Some(&admin_token), movie)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["genres"].as_array().unwrap().len(), 2);

    let bad = json!({"id": unique_movie_id(), "genres": [999999]});
    let (status, body) = send(&app, json_request("POST", "/movies", Some(&admin_token), bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["genres"].is_array());

    let query = title.replace(' ', "%20");
    let (status, body) = send(&app, get(&format!("/movies?query={query}"))).await;
    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_array().unwrap();
    let ids: Vec<i64> = data.iter().map(|m| m["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![local_id, 680]);
    assert_eq!(data[0]["title"], title.as_str());

    let uri = format!("/movies/{local_id}");
    let (status, _) = send(&app, json_request("DELETE", &uri, Some(&admin_token), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
}

fn app_with_catalog(state: AppState, catalog: StubCatalog) -> Router {
    build_app(
        state
            .with_catalog(Arc::new(catalog))
            .with_translator(Arc::new(FailingTranslator)),
    )
}

#[tokio::test]
async fn search_survives_remote_failure() {
    let Some(state) = test_state().await else { return };
    let local_id = unique_movie_id();
    let title = unique("Quiet Harbor ");
    sqlx::query("INSERT INTO movies (id, title) VALUES ($1, $2)")
        .bind(local_id)
        .bind(&title)
        .execute(&state.db)
        .await
        .unwrap();

    let catalog = StubCatalog::new()
        .with_search_results(vec![remote_movie(680, "Pulp Fiction")])
        .failing_search();
    let app = app_with_catalog(state.clone(), catalog);

    let query = title.replace(' ', "%20");
    let (status, body) = send(&app, get(&format!("/movies?query={query}"))).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![local_id]);

    sqlx::query("DELETE FROM movies WHERE id = $1")
        .bind(local_id)
        .execute(&state.db)
        .await
        .unwrap();
}

#[tokio::test]
async fn local_search_ignores_letter_case() {
    let Some(state) = test_state().await else { return };
    let local_id = unique_movie_id();
    let title = unique("Quiet Harbor ");
    sqlx::query("INSERT INTO movies (id, title) VALUES ($1, $2)")
        .bind(local_id)
        .bind(&title)
        .execute(&state.db)
        .await
        .unwrap();

    let app = app_with_catalog(state.clone(), StubCatalog::new());
    for term in [title.to_uppercase(), title.to_lowercase()] {
        let query = term.replace(' ', "%20");
        let (status, body) = send(&app, get(&format!("/movies?query={query}"))).await;
        assert_eq!(status, StatusCode::OK, "{term}");
        assert_eq!(body["data"][0]["id"], local_id, "{term}");
        assert_eq!(body["data"][0]["title"], title.as_str());
    }

    sqlx::query("DELETE FROM movies WHERE id = $1")
        .bind(local_id)
        .execute(&state.db)
        .await
        .unwrap();
}

#[tokio::test]
async fn failed_lookups_leave_no_genres() {
    let Some(state) = test_state().await else { return };
    let app = common::app_with(state.clone());
    let (_, token) = sign_up(&app).await;

    for movie_id in [333623, 10494] {
        let body = json!({"movie_id": movie_id, "status_id": 1});
        let (status, _) = send(&app, json_request("POST", "/watchlists", Some(&token), body)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let offline = app_with_catalog(state, StubCatalog::new().failing_lookups());
    for uri in ["/watchlist/most-genre", "/recs/dynamic"] {
        let (status, body) = send(&offline, get_as(uri, &token)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["message"], "No genres found in the user's watchlist", "{uri}");
    }

    let (status, body) = send(&offline, get_as("/watchlist/genres", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn duplicate_insert_maps_to_a_field_error() {
    let Some(state) = test_state().await else { return };
    let username = unique("user");
    let hash = "not-a-real-hash";

    User::create(&state.db, &username, &format!("{username}@example.com"), hash)
        .await
        .unwrap();
    let err = User::create(&state.db, &username, &format!("{username}.2@example.com"), hash)
        .await
        .unwrap_err();

    let constraint = db::unique_violation(&err).expect("unique violation");
    let errors = duplicate_user_field(&constraint).expect("username field");
    assert_eq!(
        errors.get("username"),
        Some(&["Username already exists".to_string()][..])
    );

    let other = unique("user");
    let err = User::create(&state.db, &other, &format!("{username}@example.com"), hash)
        .await
        .unwrap_err();
    let constraint = db::unique_violation(&err).expect("unique violation");
    assert!(duplicate_user_field(&constraint).unwrap().get("email").is_some());
}

#[tokio::test]
async fn racing_registrations_never_fail_with_500() {
    let Some(state) = test_state().await else { return };
    let app = common::app_with(state);
    let username = unique("user");

    let first = json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": "secret-password",
    });
    let second = json!({
        "username": username,
        "email": format!("{username}.2@example.com"),
        "password": "secret-password",
    });
    let (a, b) = tokio::join!(
        send(&app, json_request("POST", "/users", None, first)),
        send(&app, json_request("POST", "/users", None, second)),
    );

    let mut statuses = vec![a.0, b.0];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::BAD_REQUEST]);
    let loser = if a.0 == StatusCode::BAD_REQUEST { a.1 } else { b.1 };
    assert_eq!(loser["errors"]["username"][0], "Username already exists");
}
