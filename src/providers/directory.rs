use crate::config::DirectoryConfig;
use crate::core::identity::{IdentityProvider, SubscriberProfile};
use crate::core::records::{RawRows, RecordProvider};
use anyhow::{Result, bail};
use async_trait::async_trait;
use tracing::debug;

/// Identity directory backed by the contact tabs of the same sheet. The
/// seller contacts map a number to a display name, the stockist contacts map
/// it to that stockist's ledger tab.
pub struct SheetDirectory<'a> {
    config: DirectoryConfig,
    records: &'a dyn RecordProvider,
}

impl<'a> SheetDirectory<'a> {
    pub fn new(config: DirectoryConfig, records: &'a dyn RecordProvider) -> Self {
        SheetDirectory { config, records }
    }

    /// Contact numbers are stored inconsistently, sometimes with the dialing
    /// prefix. Column 0 is the number, column 1 the name, header skipped.
    fn find_name(&self, contacts: &RawRows, mobile: &str) -> Option<String> {
        let prefixed = format!("{}{}", self.config.dialing_prefix, mobile);
        contacts
            .iter()
            .skip(1)
            .find(|row| {
                row.first()
                    .is_some_and(|cell| cell.trim() == mobile || cell.trim() == prefixed)
            })
            .and_then(|row| row.get(1))
            .map(|name| name.trim().to_string())
    }
}

#[async_trait]
impl IdentityProvider for SheetDirectory<'_> {
    async fn lookup(&self, mobile: &str) -> Result<SubscriberProfile> {
        let sellers = self
            .records
            .fetch_rows(&self.config.seller_contacts_tab)
            .await?;
        let stockists = self
            .records
            .fetch_rows(&self.config.stockist_contacts_tab)
            .await?;

        let profile = SubscriberProfile {
            seller_name: self.find_name(&sellers, mobile),
            stockist_tab: self.find_name(&stockists, mobile),
        };
        debug!(?profile, "Resolved subscriber profile");

        if profile.roles().is_empty() {
            bail!("Mobile number {mobile} not found in the contact directory");
        }
        Ok(profile)
    }
}
