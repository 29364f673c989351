//! Composition root
//!
//! [`ObjectStoreClient`] owns the store handle and hands a borrow of it to
//! each component per call. It keeps no other state between calls, so one
//! client can serve concurrent uploads.

use crate::classify::ClassifiedError;
use crate::config::{Config, UploadConfig};
use crate::error::Result;
use crate::pagination::{ListOutcome, list_all};
use crate::traits::ObjectStore;
use crate::upload::{UploadOutcome, UploadRequest, Uploader};
use crate::wait::WaitConfig;

/// Options shared by every call made through a client
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    pub page_size: Option<i32>,
    pub upload: UploadConfig,
    /// Polling used to confirm each upload
    pub wait: WaitConfig,
}

impl ClientOptions {
    /// Build options from a loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            page_size: config.list.page_size,
            upload: config.upload.clone(),
            wait: config.wait.to_wait_config()?,
        })
    }
}

/// Public entry point: list buckets and upload objects
pub struct ObjectStoreClient<S: ObjectStore> {
    store: S,
    options: ClientOptions,
}

impl<S: ObjectStore> ObjectStoreClient<S> {
    pub fn new(store: S, options: ClientOptions) -> Self {
        Self { store, options }
    }

    /// List every bucket, stopping at the first failed page
    pub async fn list_buckets(&self) -> ListOutcome {
        list_all(&self.store, self.options.page_size).await
    }

    /// Upload one object and confirm it is visible
    pub async fn upload_object(
        &self,
        request: UploadRequest,
    ) -> std::result::Result<UploadOutcome, ClassifiedError> {
        Uploader::new(&self.store, self.options.upload.clone(), self.options.wait)
            .upload(request)
            .await
    }
}
