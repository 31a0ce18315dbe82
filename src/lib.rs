//! InsurTrack - personal insurance policy tracker
//!
//! This library provides:
//! - The policy record model and editable drafts
//! - Local persistence of the policy collection
//! - Portfolio statistics (annual premium, upcoming renewals)
//! - JSON backup export/import and CSV listing export
//! - iCalendar renewal reminders
//! - AI coverage analysis and contract document extraction

pub mod policy;
pub mod storage;
pub mod store;
pub mod stats;
pub mod backup;
pub mod calendar;
pub mod ai;
pub mod config;

// Re-export commonly used types
pub use policy::{InsurancePolicy, PolicyDraft, PolicyStatus, PolicyType, PremiumFrequency};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{ContractDocument, PolicyStore, StoreError};
pub use stats::{compute_stats, PortfolioStats};
pub use config::Config;
