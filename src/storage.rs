use anyhow::Context;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, defaults};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    Client,
    config::{Builder as S3ConfigBuilder, Region},
    presigning::PresigningConfig,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use std::time::Duration;

use crate::config::StorageConfig;

/// Object-store seam: uploads and deletes are external, not-undoable side
/// effects performed outside the record-level transaction boundary.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// The bucket objects are written to and presigned from.
    fn bucket(&self) -> &str;

    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;

    async fn remove_object(&self, key: &str) -> anyhow::Result<()>;

    /// Time-limited, credential-free GET URL for an object.
    async fn presign_get(&self, key: &str, expiry: Duration) -> anyhow::Result<String>;
}

/// S3-compatible implementation. Path-style addressing so MinIO and other
/// self-hosted endpoints work.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    pub async fn new(config: &StorageConfig) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(Credentials::new(
                config.access_key.clone(),
                config.secret_key.clone(),
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
impl ObjectStore for S3ObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

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

    async fn remove_object(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .context("s3 delete_object")?;
        Ok(())
    }

    async fn presign_get(&self, key: &str, expiry: Duration) -> anyhow::Result<String> {
        let request = self.client.get_object().bucket(&self.bucket).key(key);
        let presigned = request
            .presigned(PresigningConfig::expires_in(expiry)?)
            .await
            .context("s3 presign_get")?;
        Ok(presigned.uri().to_string())
    }
}
