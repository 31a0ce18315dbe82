//! Policy data structures, editable drafts, and collection loading

mod data;
mod draft;
pub mod loader;

pub use data::{
    sample_policies, InsurancePolicy, ParseEnumError, PolicyStatus, PolicyType, PremiumFrequency,
};
pub use draft::{DraftError, PolicyDraft};
pub use loader::{encode_policies, encode_policies_pretty, load_policies_from_str};
