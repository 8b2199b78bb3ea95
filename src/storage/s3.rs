//! AWS S3 storage implementation.
//!
//! Slots map to object keys under `{bucket}/{prefix}/`.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;

use crate::error::{AppError, Result};
use crate::storage::SnapshotStorage;

/// S3-based snapshot storage.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3Storage {
    /// Create a new S3 storage instance.
    pub fn new(client: Client, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    /// Create S3 storage from environment configuration.
    pub async fn from_env() -> Result<Self> {
        let bucket = std::env::var("S3_BUCKET")
            .map_err(|_| AppError::config("S3_BUCKET is not set"))?;
        let prefix = std::env::var("S3_PREFIX").unwrap_or_else(|_| "deathlog".to_string());

        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = Client::new(&config);

        Ok(Self::new(client, bucket, prefix))
    }

    fn key(&self, slot: &str) -> String {
        object_key(&self.prefix, slot)
    }
}

/// Join prefix and slot without doubled or leading slashes.
fn object_key(prefix: &str, slot: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let slot = slot.trim_start_matches('/');
    if prefix.is_empty() {
        slot.to_string()
    } else {
        format!("{prefix}/{slot}")
    }
}

#[async_trait]
impl SnapshotStorage for S3Storage {
    async fn write_bytes(&self, slot: &str, bytes: &[u8]) -> Result<()> {
        let key = self.key(slot);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes.to_vec()))
            .content_type("application/json")
            .send()
            .await
            .map_err(|e| AppError::storage(format!("put s3://{}/{}: {}", self.bucket, key, e)))?;

        log::info!("Wrote {} bytes to s3://{}/{}", bytes.len(), self.bucket, key);
        Ok(())
    }

    async fn read_bytes(&self, slot: &str) -> Result<Option<Vec<u8>>> {
        let key = self.key(slot);
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| AppError::storage(format!("read s3://{}/{}: {}", self.bucket, key, e)))?;
                Ok(Some(bytes.into_bytes().to_vec()))
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    log::info!("No existing data at s3://{}/{}", self.bucket, key);
                    Ok(None)
                } else {
                    Err(AppError::storage(service_err))
                }
            }
        }
    }

    fn location(&self, slot: &str) -> String {
        format!("s3://{}/{}", self.bucket, self.key(slot))
    }
}
