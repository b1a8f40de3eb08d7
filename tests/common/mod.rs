#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use cinelog::{
    app::build_app,
    catalog::{MovieCatalog, MovieList, RemoteError, RemoteGenre, RemoteMovie, RemoteMovieDetails},
    state::AppState,
    translate::Translator,
};

/// In-memory catalog with a fixed set of known movies.
#[derive(Default)]
pub struct StubCatalog {
    pub movies: HashMap<i64, RemoteMovieDetails>,
    pub search_results: Vec<RemoteMovie>,
    /// `search` answers with a timeout.
    pub fail_search: bool,
    /// `movie` answers with a timeout for every id.
    pub fail_lookups: bool,
}

pub fn remote_movie(id: i64, title: &str) -> RemoteMovie {
    RemoteMovie {
        id,
        title: Some(title.to_string()),
        poster_path: Some(format!("/{id}.jpg")),
        release_date: None,
    }
}

impl StubCatalog {
    /// Knows 333623 (Action, Drama) and 10494 (Drama, Comedy) plus The Shawshank Redemption.
    pub fn new() -> Self {
        let mut stub = Self::default();
        stub.add(333623, "The Great Wall", &[(28, "Action"), (18, "Drama")]);
        stub.add(10494, "Perfect Blue", &[(18, "Drama"), (35, "Comedy")]);

        let mut shawshank = RemoteMovieDetails::with_genres(
            278,
            vec![RemoteGenre {
                id: 18,
                name: "Drama".into(),
            }],
        );
        shawshank.title = Some("The Shawshank Redemption".into());
        shawshank.overview = Some("Framed in the 1940s for a double murder.".into());
        shawshank.vote_average = Some(8.7123);
        stub.movies.insert(278, shawshank);
        stub
    }

    pub fn add(&mut self, id: i64, title: &str, genres: &[(i64, &str)]) {
        let mut details = RemoteMovieDetails::with_genres(
            id,
            genres
                .iter()
                .map(|(id, name)| RemoteGenre {
                    id: *id,
                    name: name.to_string(),
                })
                .collect(),
        );
        details.title = Some(title.to_string());
        self.movies.insert(id, details);
    }

    pub fn with_search_results(mut self, results: Vec<RemoteMovie>) -> Self {
        self.search_results = results;
        self
    }

    pub fn failing_search(mut self) -> Self {
        self.fail_search = true;
        self
    }

    pub fn failing_lookups(mut self) -> Self {
        self.fail_lookups = true;
        self
    }
}

fn not_found() -> RemoteError {
    RemoteError::Status {
        status: 404,
        message: "The resource you requested could not be found.".into(),
    }
}

#[async_trait]
impl MovieCatalog for StubCatalog {
    async fn search(&self, _query: &str) -> Result<Vec<RemoteMovie>, RemoteError> {
        if self.fail_search {
            return Err(RemoteError::Timeout);
        }
        Ok(self.search_results.clone())
    }

    async fn movie(&self, id: i64) -> Result<RemoteMovieDetails, RemoteError> {
        if self.fail_lookups {
            return Err(RemoteError::Timeout);
        }
        self.movies.get(&id).cloned().ok_or_else(not_found)
    }

    async fn recommendations(&self, id: i64) -> Result<Vec<RemoteMovie>, RemoteError> {
        match id {
            278 => Ok(vec![remote_movie(680, "Pulp Fiction"), remote_movie(13, "Forrest Gump")]),
            _ => Ok(vec![]),
        }
    }

    async fn discover_by_genre(&self, genre_id: i64) -> Result<Vec<RemoteMovie>, RemoteError> {
        Ok(vec![remote_movie(genre_id * 100, &format!("Genre {genre_id} pick"))])
    }

    async fn list(&self, list: MovieList) -> Result<Vec<RemoteMovie>, RemoteError> {
        Ok(vec![remote_movie(1, list.label())])
    }
}

/// Translator that always fails, so callers fall back to the original text.
pub struct FailingTranslator;

#[async_trait]
impl Translator for FailingTranslator {
    async fn translate(&self, _text: &str) -> Result<String, RemoteError> {
        Err(RemoteError::Timeout)
    }
}

pub fn app_with(state: AppState) -> Router {
    build_app(
        state
            .with_catalog(Arc::new(StubCatalog::new()))
            .with_translator(Arc::new(FailingTranslator)),
    )
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_as(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Sends one request and decodes the JSON body (`Value::Null` for non-JSON bodies).
pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}
