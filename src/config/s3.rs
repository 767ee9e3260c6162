use crate::{
    config::{optional_var, required_var},
    error::{ClassboardResult, S3CredsSnafu, S3Snafu},
};
use s3::{Bucket, Region, creds::Credentials};
use secrecy::{ExposeSecret, SecretString};
use snafu::ResultExt;

#[derive(Debug)]
pub struct S3Config {
    pub bucket_name: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub base_path: String,
    access_key_id: SecretString,
    secret_access_key: SecretString,
}

impl S3Config {
    ///`Ok(None)` when no bucket is configured - the blob store is optional
    pub fn new() -> ClassboardResult<Option<Self>> {
        let Some(bucket_name) = optional_var("S3_BUCKET_NAME") else {
            return Ok(None);
        };

        Ok(Some(Self {
            bucket_name,
            region: required_var("S3_REGION")?,
            endpoint: optional_var("S3_ENDPOINT"),
            base_path: optional_var("S3_BASE_PATH").unwrap_or_default(),
            access_key_id: SecretString::from(required_var("AWS_ACCESS_KEY_ID")?),
            secret_access_key: SecretString::from(required_var("AWS_SECRET_ACCESS_KEY")?),
        }))
    }

    fn region(&self) -> Region {
        Region::Custom {
            region: self.region.clone(),
            endpoint: self
                .endpoint
                .clone()
                .unwrap_or_else(|| format!("https://s3.{}.amazonaws.com", self.region)),
        }
    }

    pub fn bucket(&self) -> ClassboardResult<Box<Bucket>> {
        let credentials = Credentials::new(
            Some(self.access_key_id.expose_secret()),
            Some(self.secret_access_key.expose_secret()),
            None,
            None,
            None,
        )
        .context(S3CredsSnafu)?;

        let bucket = Bucket::new(&self.bucket_name, self.region(), credentials).context(S3Snafu)?;
        Ok(if self.endpoint.is_some() {
            bucket.with_path_style()
        } else {
            bucket
        })
    }
}
