//! Best-effort text translation.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::catalog::RemoteError;
use crate::config::DeeplConfig;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String, RemoteError>;
}

/// Translates `text`, returning it unchanged when the translator fails.
pub async fn translate_or_original(translator: &dyn Translator, text: &str) -> String {
    if text.trim().is_empty() {
        return text.to_string();
    }
    match translator.translate(text).await {
        Ok(translated) => translated,
        Err(e) => {
            warn!(error = %e, "translation failed; keeping original text");
            text.to_string()
        }
    }
}

#[derive(Clone)]
pub struct DeeplClient {
    http_client: HttpClient,
    api_key: String,
    base_url: String,
    target_lang: String,
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    text: [&'a str; 1],
    target_lang: &'a str,
}

#[derive(Deserialize)]
struct TranslateResponse {
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
struct Translation {
    text: String,
}

impl DeeplClient {
    pub fn new(http_client: HttpClient, config: &DeeplConfig) -> Self {
        Self {
            http_client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            target_lang: config.target_lang.clone(),
        }
    }
}

#[async_trait]
impl Translator for DeeplClient {
    #[instrument(skip(self, text), fields(len = text.len()))]
    async fn translate(&self, text: &str) -> Result<String, RemoteError> {
        let response = self
            .http_client
            .post(format!("{}/translate", self.base_url))
            .header(
                reqwest::header::AUTHORIZATION,
                format!("DeepL-Auth-Key {}", self.api_key),
            )
            .json(&TranslateRequest {
                text: [text],
                target_lang: &self.target_lang,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body: TranslateResponse = response.json().await?;
        body.translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or_else(|| RemoteError::Decode("empty translations".into()))
    }
}
