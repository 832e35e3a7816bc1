use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

/// A provider that turns a search query into a directory of image files.
///
/// Implementations write up to `limit` files directly into `dest`, which is a
/// fresh directory owned exclusively by the calling request. Returns the
/// number of files actually written; zero is a valid outcome (the caller
/// decides whether that is an error).
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch_into(&self, query: &str, limit: usize, dest: &Path) -> Result<usize>;
}
