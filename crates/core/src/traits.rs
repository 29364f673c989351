//! Store capability trait
//!
//! The client never talks to a concrete SDK. Backends implement
//! [`ObjectStore`] and the components in this crate drive them, which lets
//! tests substitute a mock for the network.

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::types::{BucketPage, ObjectKey, PageToken, PutObject};

/// The three remote operations the client depends on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch one page of buckets, starting after `cursor` (`None` = first page)
    async fn list_buckets_page(
        &self,
        cursor: Option<PageToken>,
        page_size: Option<i32>,
    ) -> Result<BucketPage, RemoteError>;

    /// Create or overwrite an object with a single put
    async fn put_object(&self, request: PutObject) -> Result<(), RemoteError>;

    /// Check whether an object is visible
    ///
    /// A missing object is `Ok(false)`, not an error.
    async fn head_object(&self, key: &ObjectKey) -> Result<bool, RemoteError>;
}
