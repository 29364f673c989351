//! Single-put upload with visibility confirmation
//!
//! An upload makes at most one put attempt. Local problems with the source are
//! reported before the store is contacted and store failures are classified.
//! A successful put is always followed by an existence check.

use std::fmt;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use humansize::{BINARY, format_size};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::classify::{ClassifiedError, ErrorKind, classify};
use crate::config::UploadConfig;
use crate::traits::ObjectStore;
use crate::types::{ObjectBody, ObjectKey, PutObject};
use crate::wait::{ExistenceWaiter, PollState, WaitConfig, WaitReport};

/// Where the object's bytes come from
pub enum ByteSource {
    /// Regular file on local disk
    Path(PathBuf),
    /// In-memory payload
    Bytes(Bytes),
    /// Stream of unknown length, buffered in memory before the put
    Reader(Box<dyn AsyncRead + Send + Unpin>),
}

impl fmt::Debug for ByteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => f.debug_tuple("Path").field(p).finish(),
            Self::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            Self::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

/// Everything needed for one upload
#[derive(Debug)]
pub struct UploadRequest {
    pub key: ObjectKey,
    pub source: ByteSource,
    /// Expected size, used for the limit check when the source length is unknown
    pub size_hint: Option<u64>,
    /// Overrides the content type guessed from the key
    pub content_type: Option<String>,
}

impl UploadRequest {
    pub fn new(key: ObjectKey, source: ByteSource) -> Self {
        Self {
            key,
            source,
            size_hint: None,
            content_type: None,
        }
    }

    pub fn with_size_hint(mut self, size: u64) -> Self {
        self.size_hint = Some(size);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Successful end states of an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The put succeeded and the object is visible
    Confirmed(WaitReport),
    /// The put succeeded but the object did not show up before the deadline
    TimedOut(WaitReport),
}

/// Drives a single upload against a store
pub struct Uploader<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    config: UploadConfig,
    wait: WaitConfig,
}

impl<'a, S: ObjectStore + ?Sized> Uploader<'a, S> {
    pub fn new(store: &'a S, config: UploadConfig, wait: WaitConfig) -> Self {
        Self {
            store,
            config,
            wait,
        }
    }

    pub async fn upload(&self, request: UploadRequest) -> Result<UploadOutcome, ClassifiedError> {
        let UploadRequest {
            key,
            source,
            size_hint,
            content_type,
        } = request;

        let content_type = content_type.or_else(|| guess_content_type(&key, &source));
        let body = open_source(source, size_hint, self.config.limit()).await?;

        tracing::debug!(%key, size = body.len(), content_type = ?content_type, "Uploading object");

        let put = PutObject {
            key: key.clone(),
            body,
            content_type,
        };

        if let Err(e) = self.store.put_object(put).await {
            let mut err = classify(&e);
            if err.kind == ErrorKind::ObjectTooLarge {
                err.message = too_large_message(self.config.limit(), &err.message);
                tracing::warn!(%key, "Object is too large for a single put");
            } else {
                tracing::warn!(%key, error = %err, "Upload failed");
            }
            return Err(err);
        }

        let report = ExistenceWaiter::new(self.store, self.wait).confirm(&key).await;
        Ok(match report.state {
            PollState::Confirmed => UploadOutcome::Confirmed(report),
            PollState::TimedOut | PollState::Pending => UploadOutcome::TimedOut(report),
        })
    }
}

/// Validate the source and turn it into a put body without touching the store
async fn open_source(
    source: ByteSource,
    size_hint: Option<u64>,
    limit: Option<u64>,
) -> Result<ObjectBody, ClassifiedError> {
    match source {
        ByteSource::Path(path) => {
            let file = tokio::fs::File::open(&path).await.map_err(|e| {
                ClassifiedError::local(
                    ErrorKind::Unknown,
                    format!("cannot open {}: {e}", path.display()),
                )
            })?;
            let meta = file.metadata().await.map_err(|e| {
                ClassifiedError::local(
                    ErrorKind::Unknown,
                    format!("cannot read metadata of {}: {e}", path.display()),
                )
            })?;
            if !meta.is_file() {
                return Err(ClassifiedError::local(
                    ErrorKind::Unknown,
                    format!("{} is not a regular file", path.display()),
                ));
            }
            check_limit(meta.len(), limit)?;
            Ok(ObjectBody::File {
                path,
                len: meta.len(),
            })
        }
        ByteSource::Bytes(bytes) => {
            check_limit(bytes.len() as u64, limit)?;
            Ok(ObjectBody::Bytes(bytes))
        }
        ByteSource::Reader(reader) => {
            if let Some(hint) = size_hint {
                check_limit(hint, limit)?;
            }

            let mut buf = Vec::with_capacity(size_hint.unwrap_or(0).min(8 * 1024 * 1024) as usize);
            let read = match limit {
                // One byte past the limit is enough to know it was exceeded.
                Some(max) => reader.take(max.saturating_add(1)).read_to_end(&mut buf).await,
                None => {
                    let mut reader = reader;
                    reader.read_to_end(&mut buf).await
                }
            };
            read.map_err(|e| {
                ClassifiedError::local(ErrorKind::Unknown, format!("cannot read input: {e}"))
            })?;

            check_limit(buf.len() as u64, limit)?;
            Ok(ObjectBody::Bytes(Bytes::from(buf)))
        }
    }
}

fn check_limit(len: u64, limit: Option<u64>) -> Result<(), ClassifiedError> {
    match limit {
        Some(max) if len > max => Err(ClassifiedError::local(
            ErrorKind::ObjectTooLarge,
            format!(
                "{} exceeds the single-put limit of {}; use multipart upload for larger objects",
                format_size(len, BINARY),
                format_size(max, BINARY)
            ),
        )),
        _ => Ok(()),
    }
}

fn too_large_message(limit: Option<u64>, upstream: &str) -> String {
    match limit {
        Some(max) => format!(
            "object exceeds the single-put size limit ({}); use multipart upload instead ({upstream})",
            format_size(max, BINARY)
        ),
        None => format!(
            "object exceeds the store's single-put size limit; use multipart upload instead ({upstream})"
        ),
    }
}

/// Guess from the object key first, then the source file name
fn guess_content_type(key: &ObjectKey, source: &ByteSource) -> Option<String> {
    let from_path = |p: &Path| mime_guess::from_path(p).first_raw().map(str::to_string);

    from_path(Path::new(&key.key)).or_else(|| match source {
        ByteSource::Path(p) => from_path(p),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use crate::traits::MockObjectStore;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    fn key(name: &str) -> ObjectKey {
        ObjectKey::new("uploads", name).unwrap()
    }

    fn wait() -> WaitConfig {
        WaitConfig::new(Duration::from_secs(60), Duration::from_secs(5)).unwrap()
    }

    fn limited(bytes: u64) -> UploadConfig {
        UploadConfig {
            single_put_limit: bytes,
        }
    }

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_unopenable_source_makes_no_remote_call() {
        let mut store = MockObjectStore::new();
        store.expect_put_object().times(0);
        store.expect_head_object().times(0);

        let request = UploadRequest::new(
            key("missing.txt"),
            ByteSource::Path(PathBuf::from("/nonexistent/osc/missing.txt")),
        );
        let err = Uploader::new(&store, UploadConfig::default(), wait())
            .upload(request)
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Unknown);
        assert!(err.is_local());
        assert!(err.message.contains("cannot open"));
    }

    #[tokio::test]
    async fn test_directory_source_rejected_locally() {
        let dir = TempDir::new().unwrap();
        let mut store = MockObjectStore::new();
        store.expect_put_object().times(0);

        let request = UploadRequest::new(key("dir"), ByteSource::Path(dir.path().to_path_buf()));
        let err = Uploader::new(&store, UploadConfig::default(), wait())
            .upload(request)
            .await
            .unwrap_err();

        assert!(err.is_local());
        assert!(err.message.contains("not a regular file"));
    }

    #[tokio::test]
    async fn test_file_over_configured_limit_fails_locally() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "big.bin", &[0u8; 10]);
        let mut store = MockObjectStore::new();
        store.expect_put_object().times(0);

        let err = Uploader::new(&store, limited(4), wait())
            .upload(UploadRequest::new(key("big.bin"), ByteSource::Path(path)))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::ObjectTooLarge);
        assert!(err.is_local());
        assert!(err.message.contains("multipart"));
    }

    #[tokio::test]
    async fn test_entity_too_large_skips_confirmation() {
        let mut store = MockObjectStore::new();
        store
            .expect_put_object()
            .times(1)
            .returning(|_| {
                Err(RemoteError::service(
                    "EntityTooLarge",
                    "Your proposed upload exceeds the maximum allowed size",
                ))
            });
        store.expect_head_object().times(0);

        let request =
            UploadRequest::new(key("a.bin"), ByteSource::Bytes(Bytes::from_static(b"data")));
        let err = Uploader::new(&store, UploadConfig::default(), wait())
            .upload(request)
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::ObjectTooLarge);
        assert!(!err.is_local());
        assert_eq!(err.code.as_deref(), Some("EntityTooLarge"));
        assert!(err.message.contains("5 GiB"));
        assert!(err.message.contains("multipart upload"));
    }

    #[tokio::test]
    async fn test_access_denied_is_reported() {
        let mut store = MockObjectStore::new();
        store
            .expect_put_object()
            .times(1)
            .returning(|_| Err(RemoteError::service("AccessDenied", "Access Denied")));
        store.expect_head_object().times(0);

        let request = UploadRequest::new(key("a.txt"), ByteSource::Bytes(Bytes::from_static(b"x")));
        let err = Uploader::new(&store, UploadConfig::default(), wait())
            .upload(request)
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::AccessDenied);
        assert_eq!(err.message, "Access Denied");
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmed_after_three_polls() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "report.csv", b"a,b\n1,2\n");

        let heads = Arc::new(AtomicU32::new(0));
        let counter = heads.clone();
        let expected_path = path.clone();

        let mut store = MockObjectStore::new();
        store
            .expect_put_object()
            .withf(move |req| {
                req.key.key == "reports/report.csv"
                    && req.content_type.as_deref() == Some("text/csv")
                    && req.body
                        == ObjectBody::File {
                            path: expected_path.clone(),
                            len: 8,
                        }
            })
            .times(1)
            .returning(|_| Ok(()));
        store.expect_head_object().returning(move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(n == 3)
        });

        let outcome = Uploader::new(&store, UploadConfig::default(), wait())
            .upload(UploadRequest::new(key("reports/report.csv"), ByteSource::Path(path)))
            .await
            .unwrap();

        match outcome {
            UploadOutcome::Confirmed(report) => assert_eq!(report.attempts, 3),
            other => panic!("expected Confirmed, got {other:?}"),
        }
        assert_eq!(heads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_visible_times_out() {
        let mut store = MockObjectStore::new();
        store.expect_put_object().times(1).returning(|_| Ok(()));
        store.expect_head_object().returning(|_| Ok(false));

        let request = UploadRequest::new(key("slow.txt"), ByteSource::Bytes(Bytes::from_static(b"x")));
        let outcome = Uploader::new(&store, UploadConfig::default(), wait())
            .upload(request)
            .await
            .unwrap();

        let UploadOutcome::TimedOut(report) = outcome else {
            panic!("expected TimedOut, got {outcome:?}");
        };
        assert!(report.elapsed >= Duration::from_secs(60));
        assert!(report.elapsed < Duration::from_secs(65));
    }

    #[tokio::test]
    async fn test_reader_is_buffered() {
        let mut store = MockObjectStore::new();
        store
            .expect_put_object()
            .withf(|req| {
                req.body == ObjectBody::Bytes(Bytes::from_static(b"hello"))
                    && req.content_type.as_deref() == Some("application/x-custom")
            })
            .times(1)
            .returning(|_| Ok(()));
        store.expect_head_object().times(1).returning(|_| Ok(true));

        let reader: Box<dyn AsyncRead + Send + Unpin> = Box::new(&b"hello"[..]);
        let request = UploadRequest::new(key("stdin"), ByteSource::Reader(reader))
            .with_content_type("application/x-custom");
        let outcome = Uploader::new(&store, UploadConfig::default(), wait())
            .upload(request)
            .await
            .unwrap();
        assert!(matches!(outcome, UploadOutcome::Confirmed(r) if r.attempts == 1));
    }

    #[tokio::test]
    async fn test_reader_over_limit_fails_locally() {
        let mut store = MockObjectStore::new();
        store.expect_put_object().times(0);

        let reader: Box<dyn AsyncRead + Send + Unpin> = Box::new(&b"0123456789"[..]);
        let err = Uploader::new(&store, limited(5), wait())
            .upload(UploadRequest::new(key("stdin"), ByteSource::Reader(reader)))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ObjectTooLarge);
        assert!(err.is_local());

        let reader: Box<dyn AsyncRead + Send + Unpin> = Box::new(&b"abc"[..]);
        let request = UploadRequest::new(key("stdin"), ByteSource::Reader(reader)).with_size_hint(100);
        let err = Uploader::new(&store, limited(5), wait())
            .upload(request)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ObjectTooLarge);
    }

    #[test]
    fn test_guess_content_type() {
        let bytes = ByteSource::Bytes(Bytes::new());
        assert_eq!(
            guess_content_type(&key("index.html"), &bytes).as_deref(),
            Some("text/html")
        );
        assert_eq!(guess_content_type(&key("blob"), &bytes), None);

        let file = ByteSource::Path(PathBuf::from("/tmp/photo.png"));
        assert_eq!(
            guess_content_type(&key("blob"), &file).as_deref(),
            Some("image/png")
        );
    }
}
