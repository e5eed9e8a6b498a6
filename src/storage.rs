use std::time::Duration;

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
use tracing::{debug, info};

use crate::config::StorageConfig;

/// Object storage holding uploaded resume documents.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
    /// Short-lived GET URL that makes the browser save the object as `filename`.
    async fn presign_download(
        &self,
        key: &str,
        filename: &str,
        ttl: Duration,
    ) -> anyhow::Result<String>;
}

#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    pub async fn new(cfg: &StorageConfig) -> anyhow::Result<Self> {
        let credentials =
            Credentials::new(&cfg.access_key, &cfg.secret_key, None, None, "jobassist-env");
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(credentials)
            .endpoint_url(&cfg.endpoint)
            .load()
            .await;

        // MinIO only supports path-style addressing
        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: cfg.bucket.clone(),
        })
    }

    /// Create the resume bucket when it does not exist yet.
    pub async fn ensure_bucket(&self) -> anyhow::Result<()> {
        if self.client.head_bucket().bucket(&self.bucket).send().await.is_ok() {
            debug!(bucket = %self.bucket, "resume bucket present");
            return Ok(());
        }
        self.client
            .create_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .with_context(|| format!("create bucket {}", self.bucket))?;
        info!(bucket = %self.bucket, "resume bucket created");
        Ok(())
    }
}

/// `attachment` disposition with the name quoted and stripped of quote characters.
fn attachment_disposition(filename: &str) -> String {
    let safe: String = filename.chars().filter(|c| *c != '"' && *c != '\\').collect();
    format!("attachment; filename=\"{safe}\"")
}

#[async_trait]
impl StorageClient for S3Storage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .with_context(|| format!("s3 put_object {}/{}", self.bucket, key))?;
        debug!(key, size, "resume object stored");
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("s3 delete_object {}/{}", self.bucket, key))?;
        Ok(())
    }

    async fn presign_download(
        &self,
        key: &str,
        filename: &str,
        ttl: Duration,
    ) -> anyhow::Result<String> {
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .response_content_disposition(attachment_disposition(filename))
            .presigned(PresigningConfig::expires_in(ttl)?)
            .await
            .with_context(|| format!("s3 presign {}/{}", self.bucket, key))?;
        Ok(presigned.uri().to_string())
    }
}

/// In-process storage used by the test suite. Records every object so tests
/// can assert on replacement and cleanup.
#[cfg(test)]
pub mod memory {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct MemoryStorage {
        objects: Mutex<HashMap<String, Bytes>>,
        fail_deletes: AtomicBool,
    }

    impl MemoryStorage {
        pub fn contains(&self, key: &str) -> bool {
            self.objects.lock().unwrap().contains_key(key)
        }

        pub fn len(&self) -> usize {
            self.objects.lock().unwrap().len()
        }

        pub fn fail_deletes(&self, fail: bool) {
            self.fail_deletes.store(fail, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl StorageClient for MemoryStorage {
        async fn put_object(&self, key: &str, body: Bytes, _ct: &str) -> anyhow::Result<()> {
            self.objects.lock().unwrap().insert(key.to_string(), body);
            Ok(())
        }

        async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
            if self.fail_deletes.load(Ordering::SeqCst) {
                anyhow::bail!("simulated delete failure for {key}");
            }
            self.objects.lock().unwrap().remove(key);
            Ok(())
        }

        async fn presign_download(
            &self,
            key: &str,
            filename: &str,
            ttl: Duration,
        ) -> anyhow::Result<String> {
            Ok(format!(
                "https://fake.local/{}?filename={}&expires={}",
                key,
                filename,
                ttl.as_secs()
            ))
        }
    }
}
