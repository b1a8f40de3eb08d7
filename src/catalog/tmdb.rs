use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::dto::{MovieList, Page, RemoteMovie, RemoteMovieDetails, StatusBody};
use super::{MovieCatalog, RemoteError};
use crate::config::TmdbConfig;

/// TMDB-backed [`MovieCatalog`].
#[derive(Clone)]
pub struct TmdbClient {
    http_client: HttpClient,
    api_key: String,
    base_url: String,
    language: String,
}

impl TmdbClient {
    /// `http_client` carries the per-call timeout.
    pub fn new(http_client: HttpClient, config: &TmdbConfig) -> Self {
        Self {
            http_client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, RemoteError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
            ])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<StatusBody>(&body)
                .map(|b| b.status_message)
                .unwrap_or(body);
            return Err(RemoteError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.json::<T>().await?;
        debug!(path, "tmdb call succeeded");
        Ok(body)
    }

    async fn get_page(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<RemoteMovie>, RemoteError> {
        let page: Page<RemoteMovie> = self.get(path, params).await?;
        Ok(page.results)
    }
}

#[async_trait]
impl MovieCatalog for TmdbClient {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<RemoteMovie>, RemoteError> {
        self.get_page("/search/movie", &[("query", query)]).await
    }

    #[instrument(skip(self))]
    async fn movie(&self, id: i64) -> Result<RemoteMovieDetails, RemoteError> {
        self.get(&format!("/movie/{}", id), &[]).await
    }

    #[instrument(skip(self))]
    async fn recommendations(&self, id: i64) -> Result<Vec<RemoteMovie>, RemoteError> {
        self.get_page(&format!("/movie/{}/recommendations", id), &[])
            .await
    }

    #[instrument(skip(self))]
    async fn discover_by_genre(&self, genre_id: i64) -> Result<Vec<RemoteMovie>, RemoteError> {
        let genre = genre_id.to_string();
        self.get_page(
            "/discover/movie",
            &[
                ("include_adult", "false"),
                ("include_video", "false"),
                ("page", "1"),
                ("sort_by", "popularity.desc"),
                ("with_genres", genre.as_str()),
            ],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn list(&self, list: MovieList) -> Result<Vec<RemoteMovie>, RemoteError> {
        self.get_page(list.path(), &[]).await
    }
}
