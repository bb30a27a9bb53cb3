use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    Client,
    config::{Region, http::HttpResponse},
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    primitives::ByteStream,
    types::{BucketLocationConstraint, CreateBucketConfiguration},
};

use super::{BucketStatus, ObjectError, ObjectErrorKind, ObjectStore};

/// S3 backend. Credentials come from the standard AWS provider chain
/// (environment, shared profile, instance metadata).
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub async fn connect(region: &str) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        tracing::debug!(%region, "initialized S3 client");
        Self { client: Client::new(&sdk_config) }
    }
}

fn classify(code: Option<&str>, status: Option<u16>) -> ObjectErrorKind {
    match code {
        Some("AccessDenied" | "AllAccessDisabled" | "InvalidAccessKeyId" | "SignatureDoesNotMatch") => {
            ObjectErrorKind::Denied
        }
        Some("NoSuchBucket") => ObjectErrorKind::NoSuchBucket,
        Some("BucketAlreadyOwnedByYou") => ObjectErrorKind::AlreadyOwned,
        Some(_) => ObjectErrorKind::Other,
        None => match status {
            Some(403) => ObjectErrorKind::Denied,
            Some(404) => ObjectErrorKind::NoSuchBucket,
            _ => ObjectErrorKind::Other,
        },
    }
}

fn classify_head(status: Option<u16>, not_found: bool, message: String) -> BucketStatus {
    if not_found || status == Some(404) {
        BucketStatus::NotFound
    } else {
        BucketStatus::Unknown(message)
    }
}

fn to_object_error<E>(err: &SdkError<E, HttpResponse>) -> ObjectError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let code = err.as_service_error().and_then(|e| e.code());
    let status = err.raw_response().map(|r| r.status().as_u16());
    ObjectError::new(classify(code, status), DisplayErrorContext(err).to_string())
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn head_bucket(&self, bucket: &str) -> BucketStatus {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => BucketStatus::Exists,
            Err(err) => {
                let not_found = err.as_service_error().is_some_and(|e| e.is_not_found());
                let status = err.raw_response().map(|r| r.status().as_u16());
                classify_head(status, not_found, DisplayErrorContext(&err).to_string())
            }
        }
    }

    async fn create_bucket(
        &self,
        bucket: &str,
        location_constraint: Option<&str>,
    ) -> Result<(), ObjectError> {
        let mut request = self.client.create_bucket().bucket(bucket);

        if let Some(region) = location_constraint {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        request.send().await.map(|_| ()).map_err(|e| to_object_error(&e))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ObjectError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| to_object_error(&e))
    }
}
