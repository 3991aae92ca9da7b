//! Row-set source abstractions

use anyhow::Result;
use async_trait::async_trait;

/// One tab of the backing sheet: an ordered sequence of raw rows, header
/// included, every cell still untyped text.
pub type RawRows = Vec<Vec<String>>;

#[async_trait]
pub trait RecordProvider: Send + Sync {
    /// Fetches every row of the named tab.
    async fn fetch_rows(&self, tab: &str) -> Result<RawRows>;

    /// Lists the titles of all tabs in the backing sheet.
    async fn list_tabs(&self) -> Result<Vec<String>>;
}
