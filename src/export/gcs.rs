// src/export/gcs.rs
//! Google Cloud Storage backend. Credentials come from the standard
//! application-default chain (GOOGLE_APPLICATION_CREDENTIALS, metadata server).

use anyhow::{Context, Result};
use google_cloud_storage::client::{Client, ClientConfig};
use google_cloud_storage::http::objects::upload::{Media, UploadObjectRequest, UploadType};
use google_cloud_storage::sign::{SignedURLMethod, SignedURLOptions};
use std::time::Duration;

use crate::export::store::ObjectStore;

pub struct GcsStore {
    client: Client,
    bucket: String,
}

impl GcsStore {
    pub async fn connect(bucket: &str) -> Result<Self> {
        let config = ClientConfig::default()
            .with_auth()
            .await
            .context("gcs: resolving credentials")?;
        tracing::info!(bucket, "gcs store ready");
        Ok(Self {
            client: Client::new(config),
            bucket: bucket.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl ObjectStore for GcsStore {
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let mut media = Media::new(path.to_string());
        media.content_type = content_type.to_string().into();
        let upload_type = UploadType::Simple(media);
        self.client
            .upload_object(
                &UploadObjectRequest {
                    bucket: self.bucket.clone(),
                    ..Default::default()
                },
                bytes,
                &upload_type,
            )
            .await
            .with_context(|| format!("gcs: uploading gs://{}/{}", self.bucket, path))?;
        Ok(())
    }

    async fn signed_url(&self, path: &str, ttl: Duration) -> Result<String> {
        let opts = SignedURLOptions {
            method: SignedURLMethod::GET,
            expires: ttl,
            ..Default::default()
        };
        self.client
            .signed_url(&self.bucket, path, None, None, opts)
            .await
            .with_context(|| format!("gcs: signing gs://{}/{}", self.bucket, path))
    }

    fn name(&self) -> &'static str {
        "gcs"
    }
}
