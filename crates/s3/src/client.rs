//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from osc-core.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
use aws_smithy_runtime_api::client::result::SdkError;
use aws_smithy_types::byte_stream::Length;
use aws_smithy_types::error::display::DisplayErrorContext;
use aws_smithy_types::error::metadata::ProvideErrorMetadata;

use osc_core::{
    Bucket, BucketPage, ObjectBody, ObjectKey, ObjectStore, PageToken, PutObject, RemoteError,
    Result, StoreConfig,
};

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
}

impl S3Client {
    /// Create a new S3 client
    ///
    /// Credentials come from the AWS default provider chain; `config` only
    /// overrides endpoint, region and addressing style.
    pub async fn new(config: &StoreConfig) -> Result<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = &config.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        tracing::debug!(
            endpoint = config.endpoint.as_deref().unwrap_or("default"),
            path_style = config.force_path_style,
            "Created S3 client"
        );

        Ok(Self::from_client(aws_sdk_s3::Client::from_conf(s3_config)))
    }

    /// Wrap an already configured SDK client
    pub fn from_client(inner: aws_sdk_s3::Client) -> Self {
        Self { inner }
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }
}

/// Map an SDK failure to the store-independent error type
pub(crate) fn remote_error<E>(error: SdkError<E, HttpResponse>) -> RemoteError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let message = DisplayErrorContext(&error).to_string();
    match &error {
        SdkError::ServiceError(service_err) => {
            let err = service_err.err();
            RemoteError::Service {
                code: err.code().map(str::to_string),
                message: err.message().map(str::to_string).unwrap_or(message),
            }
        }
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            RemoteError::Transport(message)
        }
        SdkError::ConstructionFailure(_) => RemoteError::Request(message),
        _ => RemoteError::Service {
            code: None,
            message,
        },
    }
}

fn bucket_from_sdk(bucket: &aws_sdk_s3::types::Bucket) -> Bucket {
    let mut info = Bucket::new(bucket.name().unwrap_or_default());
    if let Some(creation_date) = bucket.creation_date() {
        info.created = jiff::Timestamp::from_second(creation_date.secs()).ok();
    }
    info.region = bucket.bucket_region().map(str::to_string);
    info
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_buckets_page(
        &self,
        cursor: Option<PageToken>,
        page_size: Option<i32>,
    ) -> std::result::Result<BucketPage, RemoteError> {
        let mut request = self.inner.list_buckets();

        if let Some(token) = cursor {
            request = request.continuation_token(token.as_str());
        }
        if let Some(max) = page_size {
            request = request.max_buckets(max);
        }

        let response = request.send().await.map_err(remote_error)?;

        Ok(BucketPage {
            buckets: response.buckets().iter().map(bucket_from_sdk).collect(),
            next: response
                .continuation_token()
                .filter(|t| !t.is_empty())
                .map(PageToken::new),
        })
    }

    async fn put_object(&self, request: PutObject) -> std::result::Result<(), RemoteError> {
        let PutObject {
            key,
            body,
            content_type,
        } = request;

        let (body, size) = match body {
            ObjectBody::Bytes(data) => {
                let size = data.len() as i64;
                (ByteStream::from(data), size)
            }
            ObjectBody::File { path, len } => {
                let stream = ByteStream::read_from()
                    .path(&path)
                    .length(Length::Exact(len))
                    .build()
                    .await
                    .map_err(|e| {
                        RemoteError::Request(format!("cannot stream {}: {e}", path.display()))
                    })?;
                (stream, len as i64)
            }
        };

        let mut builder = self
            .inner
            .put_object()
            .bucket(&key.bucket)
            .key(&key.key)
            .content_length(size)
            .body(body);

        if let Some(ct) = content_type {
            builder = builder.content_type(ct);
        }

        let response = builder.send().await.map_err(remote_error)?;

        tracing::debug!(
            bucket = %key.bucket,
            key = %key.key,
            etag = response.e_tag().unwrap_or_default().trim_matches('"'),
            "Put object"
        );

        Ok(())
    }

    async fn head_object(&self, key: &ObjectKey) -> std::result::Result<bool, RemoteError> {
        match self
            .inner
            .head_object()
            .bucket(&key.bucket)
            .key(&key.key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.as_service_error().is_some_and(|se| se.is_not_found()) {
                    Ok(false)
                } else {
                    Err(remote_error(e))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::operation::list_buckets::ListBucketsError;
    use aws_smithy_types::DateTime;
    use aws_smithy_types::body::SdkBody;
    use aws_smithy_types::error::ErrorMetadata;

    fn service_error(status: u16, code: Option<&str>) -> SdkError<ListBucketsError, HttpResponse> {
        let mut meta = ErrorMetadata::builder().message("request rejected");
        if let Some(code) = code {
            meta = meta.code(code);
        }
        let raw = HttpResponse::new(status.try_into().unwrap(), SdkBody::empty());
        SdkError::service_error(ListBucketsError::generic(meta.build()), raw)
    }

    #[test]
    fn test_service_error_keeps_code() {
        let err = remote_error(service_error(403, Some("AccessDenied")));
        assert_eq!(
            err,
            RemoteError::Service {
                code: Some("AccessDenied".to_string()),
                message: "request rejected".to_string(),
            }
        );
        assert_eq!(osc_core::classify(&err).kind, osc_core::ErrorKind::AccessDenied);
    }

    #[test]
    fn test_service_error_without_code() {
        let err = remote_error(service_error(500, None));
        assert_eq!(err.code(), None);
        assert_eq!(osc_core::classify(&err).kind, osc_core::ErrorKind::Unknown);
    }

    #[test]
    fn test_timeout_is_transport() {
        let err: SdkError<ListBucketsError, HttpResponse> =
            SdkError::timeout_error("operation timed out");
        let mapped = remote_error(err);
        assert!(matches!(mapped, RemoteError::Transport(_)));
        assert_eq!(osc_core::classify(&mapped).kind, osc_core::ErrorKind::Transient);
    }

    #[test]
    fn test_construction_failure_is_request_error() {
        let err: SdkError<ListBucketsError, HttpResponse> =
            SdkError::construction_failure("missing bucket");
        assert!(matches!(remote_error(err), RemoteError::Request(_)));
    }

    #[test]
    fn test_bucket_conversion() {
        let sdk_bucket = aws_sdk_s3::types::Bucket::builder()
            .name("archive")
            .creation_date(DateTime::from_secs(1_700_000_000))
            .bucket_region("eu-west-1")
            .build();

        let bucket = bucket_from_sdk(&sdk_bucket);
        assert_eq!(bucket.name, "archive");
        assert_eq!(bucket.region.as_deref(), Some("eu-west-1"));
        assert_eq!(bucket.created.map(|t| t.as_second()), Some(1_700_000_000));
    }

    #[tokio::test]
    async fn test_client_construction_with_endpoint() {
        let config = StoreConfig {
            endpoint: Some("http://localhost:9000".to_string()),
            region: Some("us-east-1".to_string()),
            force_path_style: true,
        };
        let client = S3Client::new(&config).await.unwrap();
        assert_eq!(
            client.inner().config().region().map(|r| r.as_ref()),
            Some("us-east-1")
        );
    }
}
