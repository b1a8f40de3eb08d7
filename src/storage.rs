use anyhow::Context;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    presigning::PresigningConfig,
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use axum::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::config::StorageConfig;

/// How long a presigned profile image link stays valid.
pub const PFP_URL_TTL_SECS: u64 = 30 * 60;

#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String>;
}

#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
}

impl Storage {
    pub async fn new(config: &StorageConfig) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(Credentials::new(
                &config.access_key,
                &config.secret_key,
                None,
                None,
                "static",
            ))
            .endpoint_url(&config.endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&config.endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: config.bucket.clone(),
        })
    }
}

#[async_trait]
impl StorageClient for Storage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .context("s3 put_object")?;
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .context("s3 delete_object")?;
        Ok(())
    }

    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String> {
        let req = self.client.get_object().bucket(&self.bucket).key(key);
        let presigned = req
            .presigned(PresigningConfig::expires_in(
                std::time::Duration::from_secs(seconds),
            )?)
            .await
            .context("s3 presign_get")?;
        Ok(presigned.uri().to_string())
    }
}

/// Stand-in used by tests and when no object store is wired up.
#[derive(Clone, Default)]
pub struct FakeStorage;

#[async_trait]
impl StorageClient for FakeStorage {
    async fn put_object(&self, _k: &str, _b: Bytes, _ct: &str) -> anyhow::Result<()> {
        Ok(())
    }
    async fn delete_object(&self, _k: &str) -> anyhow::Result<()> {
        Ok(())
    }
    async fn presign_get(&self, k: &str, _s: u64) -> anyhow::Result<String> {
        Ok(format!("https://fake.local/{}", k))
    }
}

/// Presigned link for a stored profile image; the bare key when presigning fails.
pub async fn pfp_url(storage: &dyn StorageClient, key: String) -> String {
    match storage.presign_get(&key, PFP_URL_TTL_SECS).await {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(error = %e, key = %key, "presign profile image failed");
            key
        }
    }
}

/// Object key for a new profile image, e.g. `pfps/<uuid>.png`.
pub fn pfp_key(file_name: Option<&str>, content_type: &str) -> String {
    let ext = ext_from_mime(content_type)
        .or_else(|| file_name.and_then(ext_from_file_name))
        .unwrap_or("bin");
    format!("pfps/{}.{}", Uuid::new_v4(), ext)
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

fn ext_from_file_name(name: &str) -> Option<&'static str> {
    let (_, ext) = name.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("jpg"),
        "png" => Some("png"),
        "webp" => Some("webp"),
        "gif" => Some("gif"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[test]
    fn pfp_key_prefers_mime_then_file_name() {
        let key = pfp_key(Some("me.PNG"), "application/octet-stream");
        assert!(key.starts_with("pfps/"));
        assert!(key.ends_with(".png"));

        let key = pfp_key(Some("me.png"), "image/webp");
        assert!(key.ends_with(".webp"));

        let key = pfp_key(None, "text/plain");
        assert!(key.ends_with(".bin"));
    }

    #[tokio::test]
    async fn fake_storage_presigns_key() {
        let url = FakeStorage.presign_get("pfps/a.jpg", PFP_URL_TTL_SECS).await.unwrap();
        assert!(url.contains("pfps/a.jpg"));
    }

    #[tokio::test]
    async fn pfp_url_returns_presigned_link() {
        let url = pfp_url(&FakeStorage, "pfps/a.jpg".to_string()).await;
        assert_eq!(url, "https://fake.local/pfps/a.jpg");
    }
}
