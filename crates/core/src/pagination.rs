//! Cursor-driven bucket listing
//!
//! Pages are fetched strictly one after another. A failed page ends the scan:
//! it is never retried, and everything gathered so far is returned next to the
//! classified error.

use std::collections::HashSet;

use futures::Stream;
use serde::Serialize;

use crate::classify::{ClassifiedError, ErrorKind, ErrorOrigin, classify};
use crate::traits::ObjectStore;
use crate::types::{Bucket, PageToken};

/// Result of a full bucket scan
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListOutcome {
    /// Buckets in the order the store returned them
    pub buckets: Vec<Bucket>,
    /// Set when a page request failed and truncated the scan
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ClassifiedError>,
}

impl ListOutcome {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug)]
enum ScanState {
    /// Next request uses this cursor (`None` = first page)
    Ready(Option<PageToken>),
    /// The last page was accepted but its cursor cannot be followed
    Stalled(ClassifiedError),
    Done,
}

/// One-shot iterator over bucket pages
///
/// Once it yields `None` (or an error) it is exhausted; start a new
/// scan with [`BucketPages::new`] to list again.
pub struct BucketPages<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    page_size: Option<i32>,
    state: ScanState,
    pages_fetched: usize,
    /// Cursors already sent to the store
    seen: HashSet<PageToken>,
}

impl<'a, S: ObjectStore + ?Sized> BucketPages<'a, S> {
    pub fn new(store: &'a S, page_size: Option<i32>) -> Self {
        Self {
            store,
            page_size,
            state: ScanState::Ready(None),
            pages_fetched: 0,
            seen: HashSet::new(),
        }
    }

    /// Number of successful page fetches so far
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Fetch the next page
    ///
    /// Returns `None` when the store reported no further pages or after an
    /// error has been yielded.
    pub async fn next_page(&mut self) -> Option<Result<Vec<Bucket>, ClassifiedError>> {
        let cursor = match std::mem::replace(&mut self.state, ScanState::Done) {
            ScanState::Ready(cursor) => cursor,
            ScanState::Stalled(err) => return Some(Err(err)),
            ScanState::Done => return None,
        };

        let page_number = self.pages_fetched + 1;
        if let Some(token) = &cursor {
            self.seen.insert(token.clone());
        }
        let page = match self
            .store
            .list_buckets_page(cursor, self.page_size)
            .await
        {
            Ok(page) => page,
            Err(e) => {
                let err = classify(&e);
                tracing::debug!(page = page_number, kind = %err.kind, "Bucket page request failed");
                return Some(Err(err));
            }
        };

        self.pages_fetched = page_number;
        tracing::debug!(
            page = page_number,
            items = page.buckets.len(),
            more = page.has_more(),
            "Fetched bucket page"
        );

        self.state = match page.next {
            Some(next) if self.seen.contains(&next) => ScanState::Stalled(ClassifiedError {
                kind: ErrorKind::Unknown,
                message: format!(
                    "store returned an already used continuation token after page {page_number}"
                ),
                code: None,
                origin: ErrorOrigin::Remote,
            }),
            Some(next) => ScanState::Ready(Some(next)),
            None => ScanState::Done,
        };

        Some(Ok(page.buckets))
    }

    /// Turn the iterator into a stream of pages
    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<Bucket>, ClassifiedError>> + 'a {
        futures::stream::unfold(self, |mut pages| async move {
            pages.next_page().await.map(|item| (item, pages))
        })
    }
}

/// Drive a listing to completion or to the first failed page
pub async fn list_all<S: ObjectStore + ?Sized>(store: &S, page_size: Option<i32>) -> ListOutcome {
    let mut pages = BucketPages::new(store, page_size);
    let mut outcome = ListOutcome::default();

    while let Some(page) = pages.next_page().await {
        match page {
            Ok(buckets) => outcome.buckets.extend(buckets),
            Err(err) => {
                if err.kind == ErrorKind::AccessDenied {
                    tracing::warn!("No permission to list buckets for this account");
                } else {
                    tracing::warn!(error = %err, "Bucket listing stopped early");
                }
                outcome.error = Some(err);
                break;
            }
        }
    }

    tracing::debug!(
        pages = pages.pages_fetched(),
        buckets = outcome.buckets.len(),
        complete = outcome.is_complete(),
        "Bucket listing finished"
    );

    outcome
}
