//! Subscriber identity and role resolution abstractions

use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Seller,
    Stockist,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Role::Seller => "seller",
                Role::Stockist => "stockist",
            }
        )
    }
}

/// What the contact directory knows about one subscriber number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscriberProfile {
    /// Display name from the seller contacts, when the number sells.
    pub seller_name: Option<String>,
    /// Ledger tab name from the stockist contacts, when the number stocks.
    pub stockist_tab: Option<String>,
}

impl SubscriberProfile {
    pub fn roles(&self) -> Vec<Role> {
        let mut roles = Vec::new();
        if self.seller_name.is_some() {
            roles.push(Role::Seller);
        }
        if self.stockist_tab.is_some() {
            roles.push(Role::Stockist);
        }
        roles
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles().contains(&role)
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves a subscriber number to its role profile. A number present in
    /// no contact tab is an error, distinct from a subscriber with an empty
    /// ledger.
    async fn lookup(&self, mobile: &str) -> Result<SubscriberProfile>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_follow_profile_fields() {
        let nobody = SubscriberProfile::default();
        assert!(nobody.roles().is_empty());

        let both = SubscriberProfile {
            seller_name: Some("Alok".to_string()),
            stockist_tab: Some("Alok Traders".to_string()),
        };
        assert_eq!(both.roles(), vec![Role::Seller, Role::Stockist]);
        assert!(both.has_role(Role::Seller));
        assert!(both.has_role(Role::Stockist));

        let seller_only = SubscriberProfile {
            seller_name: Some("Alok".to_string()),
            stockist_tab: None,
        };
        assert!(!seller_only.has_role(Role::Stockist));
    }
}
