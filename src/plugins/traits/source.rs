use async_trait::async_trait;
use url::Url;

use crate::models::RawListing;
use crate::utils::error::Result;

/// A marketplace query endpoint. Every implementation returns the same
/// `RawListing` shape, newest first, whether it reads JSON or markup.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Source tag, also the prefix of seen-store keys.
    fn name(&self) -> &str;

    /// Base for resolving relative listing URLs.
    fn base_url(&self) -> Option<Url>;

    /// One page of listings for `term`.
    ///
    /// Fails with `SourceUnavailable` or `SourceBlocked`; records that cannot
    /// be decoded are skipped rather than failing the batch.
    async fn fetch(&self, term: &str) -> Result<Vec<RawListing>>;
}
