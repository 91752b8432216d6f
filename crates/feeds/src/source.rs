//! The listing source seam consumed by the poller.

use crate::FetchResult;
use apartment_core::Listing;
use async_trait::async_trait;

/// Something that can produce the current set of listings for a fixed filter.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch every listing matching the filter in a single call.
    ///
    /// Order is the order returned by the remote API.
    async fn fetch(&self) -> FetchResult<Vec<Listing>>;
}
