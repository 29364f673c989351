//! osc-s3: S3 SDK adapter for osc
//!
//! Implements the `ObjectStore` trait from osc-core on top of aws-sdk-s3.
//! Remote failures are converted to `RemoteError` here so that the core can
//! classify them without knowing about the SDK.

mod client;

pub use client::S3Client;
