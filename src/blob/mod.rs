//! Blob storage behind a trait so handlers never talk to S3 directly. The
//! production implementation is S3 (or any S3-compatible endpoint); tests use
//! the in-memory store.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use chrono::NaiveDate;
use tracing::debug;

use crate::config::S3Config;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under `key`, overwriting any existing object.
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        metadata: HashMap<String, String>,
    ) -> Result<()>;

    /// Fetches the object, or `Ok(None)` when the key does not exist.
    async fn download(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Removes the object; deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Object key for a generated paystub PDF. `paystub_id` is the caller-supplied
/// statement id, not the database row id.
#[must_use]
pub fn paystub_key(user_id: i32, pay_date: NaiveDate, paystub_id: &str) -> String {
    format!(
        "paystubs/{user_id}/{}_{paystub_id}.pdf",
        pay_date.format("%Y%m%d")
    )
}

/// Object key for a rendered employment-verification letter.
#[must_use]
pub fn verification_key(employee_id: i32, generated_on: NaiveDate, request_id: i32) -> String {
    format!(
        "verification-requests/{employee_id}/{}_{request_id}.pdf",
        generated_on.format("%Y%m%d")
    )
}

pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3BlobStore {
    /// Builds a client from the `[s3]` config section. Returns `Ok(None)` when
    /// the section is incomplete so the caller can run without blob storage.
    pub async fn from_config(config: &S3Config) -> Result<Option<Self>> {
        let (Some(bucket), Some(region)) = (config.bucket.clone(), config.region.clone()) else {
            return Ok(None);
        };

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region));

        if let (Some(access_key), Some(secret_key)) =
            (config.access_key_id.clone(), config.secret_access_key.clone())
        {
            loader = loader.credentials_provider(aws_sdk_s3::config::Credentials::new(
                access_key, secret_key, None, None, "corehr-config",
            ));
        }

        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        let client = aws_sdk_s3::Client::from_conf(builder.build());

        Ok(Some(Self { client, bucket }))
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        metadata: HashMap<String, String>,
    ) -> Result<()> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes));

        for (name, value) in metadata {
            request = request.metadata(name, value);
        }

        request
            .send()
            .await
            .with_context(|| format!("Failed to upload s3://{}/{key}", self.bucket))?;

        debug!(key, "uploaded blob");
        Ok(())
    }

    async fn download(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        let output = match response {
            Ok(output) => output,
            Err(err) => {
                if err
                    .as_service_error()
                    .is_some_and(aws_sdk_s3::operation::get_object::GetObjectError::is_no_such_key)
                {
                    return Ok(None);
                }
                return Err(err).with_context(|| {
                    format!("Failed to download s3://{}/{key}", self.bucket)
                });
            }
        };

        let bytes = output
            .body
            .collect()
            .await
            .context("Failed to read object body")?;

        Ok(Some(bytes.into_bytes().to_vec()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("Failed to delete s3://{}/{key}", self.bucket))?;
        Ok(())
    }
}

/// In-memory store for tests and local development without S3.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
        _metadata: HashMap<String, String>,
    ) -> Result<()> {
        self.objects.lock().unwrap().insert(key.to_string(), bytes);
        Ok(())
    }

    async fn download(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.objects.lock().unwrap().get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_layout_is_deterministic() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(paystub_key(12, date, "PS-7"), "paystubs/12/20240315_PS-7.pdf");
        assert_eq!(
            verification_key(4, date, 9),
            "verification-requests/4/20240315_9.pdf"
        );
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryBlobStore::new();
        store
            .upload("a/b.pdf", vec![1, 2, 3], "application/pdf", HashMap::new())
            .await
            .unwrap();
        assert_eq!(store.download("a/b.pdf").await.unwrap(), Some(vec![1, 2, 3]));

        store.delete("a/b.pdf").await.unwrap();
        assert_eq!(store.download("a/b.pdf").await.unwrap(), None);
        // deleting again is fine
        store.delete("a/b.pdf").await.unwrap();
    }
}
