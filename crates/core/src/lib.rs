//! osc-core: Core library for the osc object store client
//!
//! This crate provides:
//! - The `ObjectStore` capability trait (list page, put, head)
//! - Classification of remote failures into a closed taxonomy
//! - Cursor-driven bucket listing
//! - Single-put uploads with existence confirmation
//! - Configuration management
//!
//! Nothing here depends on a specific S3 SDK; `osc-s3` supplies the real backend.

pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod pagination;
pub mod traits;
pub mod types;
pub mod upload;
pub mod wait;

pub use classify::{ClassifiedError, ErrorKind, ErrorOrigin, classify};
pub use client::{ClientOptions, ObjectStoreClient};
pub use config::{Config, ConfigManager, StoreConfig, UploadConfig};
pub use error::{Error, RemoteError, Result};
pub use pagination::{BucketPages, ListOutcome, list_all};
pub use traits::ObjectStore;
pub use types::{Bucket, BucketPage, ObjectBody, ObjectKey, PageToken, PutObject};
pub use upload::{ByteSource, UploadOutcome, UploadRequest, Uploader};
pub use wait::{ExistenceWaiter, PollState, WaitConfig, WaitReport};
