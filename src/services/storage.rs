use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Stream a local file to the bucket with an exact content length and
    /// content type. The caller must hand over the file positioned at offset 0.
    async fn put_object(
        &self,
        key: &str,
        file: tokio::fs::File,
        size: i64,
        content_type: &str,
    ) -> Result<()>;

    async fn object_exists(&self, key: &str) -> Result<bool>;
}

pub struct S3StorageService {
    client: Client,
    bucket: String,
}

impl S3StorageService {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl StorageService for S3StorageService {
    async fn put_object(
        &self,
        key: &str,
        file: tokio::fs::File,
        size: i64,
        content_type: &str,
    ) -> Result<()> {
        let body = ByteStream::read_from().file(file).build().await?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .content_length(size)
            .send()
            .await?;

        Ok(())
    }

    async fn object_exists(&self, key: &str) -> Result<bool> {
        let res = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match res {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    Ok(false)
                } else {
                    Err(service_error.into())
                }
            }
        }
    }
}
