//! Core ledger engine and collaborator abstractions

pub mod cache;
pub mod classify;
pub mod dates;
pub mod identity;
pub mod interest;
pub mod log;
pub mod margin;
pub mod numeric;
pub mod records;
pub mod rental;
pub mod row;
pub mod summary;

// Re-export main types for cleaner imports
pub use identity::{IdentityProvider, Role, SubscriberProfile};
pub use margin::AllocationPolicy;
pub use records::{RawRows, RecordProvider};
pub use row::{RowSchema, SellerSchema, TransactionRow};
pub use summary::{AccrualRates, LedgerEngine, SellerSummary, StockistSummary};
