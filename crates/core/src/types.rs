//! Domain types shared by the store trait and the client components

use std::fmt;
use std::path::PathBuf;

use bytes::Bytes;
use jiff::Timestamp;
use serde::Serialize;

use crate::error::{Error, Result};

/// A top-level container observed in the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    /// Bucket name, unique in the store namespace
    pub name: String,

    /// Creation time as reported by the store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<Timestamp>,

    /// Region the bucket lives in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl Bucket {
    /// Create a bucket entry with no metadata
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created: None,
            region: None,
        }
    }
}

/// Address of a single object: `(bucket, key)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    pub bucket: String,
    pub key: String,
}

impl ObjectKey {
    /// Build a key, rejecting empty bucket or key names
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Result<Self> {
        let bucket = bucket.into();
        let key = key.into();

        if bucket.is_empty() {
            return Err(Error::InvalidPath("bucket name cannot be empty".to_string()));
        }
        if bucket.contains('/') {
            return Err(Error::InvalidPath(format!(
                "bucket name cannot contain '/': {bucket}"
            )));
        }
        if key.is_empty() {
            return Err(Error::InvalidPath("object key cannot be empty".to_string()));
        }

        Ok(Self { bucket, key })
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Opaque continuation cursor handed out by the store
///
/// The value is never logged; `Debug` prints a placeholder.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PageToken(String);

impl PageToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PageToken(..)")
    }
}

/// One page of a bucket listing
#[derive(Debug, Clone, Default)]
pub struct BucketPage {
    pub buckets: Vec<Bucket>,
    /// Present when the store has more pages
    pub next: Option<PageToken>,
}

impl BucketPage {
    /// Whether the store signalled more pages after this one
    pub fn has_more(&self) -> bool {
        self.next.is_some()
    }
}

/// Body of a single put, after the source has been opened and validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectBody {
    /// Fully buffered payload
    Bytes(Bytes),
    /// Regular file streamed from disk, with its length at validation time
    File { path: PathBuf, len: u64 },
}

impl ObjectBody {
    pub fn len(&self) -> u64 {
        match self {
            Self::Bytes(b) => b.len() as u64,
            Self::File { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Arguments for [`ObjectStore::put_object`](crate::ObjectStore::put_object)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObject {
    pub key: ObjectKey,
    pub body: ObjectBody,
    pub content_type: Option<String>,
}
