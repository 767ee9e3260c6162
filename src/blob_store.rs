//! Reading objects out of the S3 bucket. Everything lives under a configured base path, optionally
//! scoped to a user (`{base}{user}/{key}`).

use crate::error::{
    ClassboardError, ClassboardResult, ObjectNotUtf8Snafu, S3Snafu, WriteObjectSnafu,
};
use s3::{Bucket, error::S3Error};
use snafu::ResultExt;
use std::path::Path;

pub const DEFAULT_URL_EXPIRY_SECS: u32 = 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub last_modified: String,
}

#[derive(Debug)]
pub struct BlobStore {
    bucket: Box<Bucket>,
    base_path: String,
}

impl BlobStore {
    pub fn new(bucket: Box<Bucket>, base_path: String) -> Self {
        Self { bucket, base_path }
    }

    pub fn full_key(&self, key: &str, user_id: Option<&str>) -> String {
        match user_id {
            Some(user_id) => format!("{}{user_id}/{key}", self.base_path),
            None => format!("{}{key}", self.base_path),
        }
    }

    async fn get(&self, key: &str, user_id: Option<&str>) -> ClassboardResult<Vec<u8>> {
        let full_key = self.full_key(key, user_id);
        match self.bucket.get_object(&full_key).await {
            Ok(rsp) => Ok(rsp.bytes().to_vec()),
            Err(S3Error::HttpFailWithBody(404, _)) => {
                Err(ClassboardError::MissingObject { key: full_key })
            }
            Err(source) => {
                error!(?source, %full_key, "Error fetching object from S3");
                Err(ClassboardError::S3 { source })
            }
        }
    }

    pub async fn fetch_text(&self, key: &str, user_id: Option<&str>) -> ClassboardResult<String> {
        let bytes = self.get(key, user_id).await?;
        String::from_utf8(bytes).context(ObjectNotUtf8Snafu {
            key: self.full_key(key, user_id),
        })
    }

    pub async fn fetch_bytes(&self, key: &str, user_id: Option<&str>) -> ClassboardResult<Vec<u8>> {
        self.get(key, user_id).await
    }

    pub async fn list(
        &self,
        prefix: &str,
        user_id: Option<&str>,
    ) -> ClassboardResult<Vec<ObjectSummary>> {
        let full_prefix = self.full_key(prefix, user_id);
        let results = self
            .bucket
            .list(full_prefix.clone(), None)
            .await
            .inspect_err(|e| error!(?e, %full_prefix, "Error listing objects in S3"))
            .context(S3Snafu)?;

        Ok(results
            .into_iter()
            .flat_map(|result| result.contents)
            .map(|object| ObjectSummary {
                key: object.key,
                size: object.size,
                last_modified: object.last_modified,
            })
            .collect())
    }

    pub async fn presign_get(
        &self,
        key: &str,
        user_id: Option<&str>,
        expiry_secs: u32,
    ) -> ClassboardResult<String> {
        let full_key = self.full_key(key, user_id);
        self.bucket
            .presign_get(&full_key, expiry_secs, None)
            .await
            .inspect_err(|e| error!(?e, %full_key, "Error signing S3 url"))
            .context(S3Snafu)
    }

    pub async fn download_to(
        &self,
        key: &str,
        local_path: impl AsRef<Path>,
        user_id: Option<&str>,
    ) -> ClassboardResult<()> {
        let local_path = local_path.as_ref();
        let bytes = self.fetch_bytes(key, user_id).await?;
        tokio::fs::write(local_path, bytes)
            .await
            .context(WriteObjectSnafu { path: local_path })?;

        info!(?local_path, %key, "Downloaded object");
        Ok(())
    }
}
