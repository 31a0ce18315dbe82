//! Editable policy fields used to create and update records

use super::{InsurancePolicy, PolicyStatus, PolicyType, PremiumFrequency};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DraftError {
    #[error("missing required field: {0}")]
    Missing(&'static str),
    #[error("premium must be a non-negative amount, got {0}")]
    InvalidPremium(f64),
}

/// A partially filled policy form
///
/// Every field is optional so the same shape serves new-policy input, edits,
/// and pre-fill from an analyzed contract document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDraft {
    pub provider: Option<String>,
    pub policy_number: Option<String>,
    pub policy_type: Option<PolicyType>,
    pub premium: Option<f64>,
    pub premium_frequency: Option<PremiumFrequency>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<PolicyStatus>,
    pub coverage_details: Option<String>,
    pub license_plate: Option<String>,
    pub address: Option<String>,
    pub insured_person_name: Option<String>,
}

fn check_premium(premium: f64) -> Result<f64, DraftError> {
    if premium.is_finite() && premium >= 0.0 {
        Ok(premium)
    } else {
        Err(DraftError::InvalidPremium(premium))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl PolicyDraft {
    pub fn is_empty(&self) -> bool {
        *self == PolicyDraft::default()
    }

    /// Build a new policy, requiring every non-optional field
    ///
    /// Status defaults to Active when the draft leaves it unset.
    pub fn into_policy(self, id: impl Into<String>) -> Result<InsurancePolicy, DraftError> {
        let provider = non_blank(self.provider).ok_or(DraftError::Missing("provider"))?;
        let policy_number =
            non_blank(self.policy_number).ok_or(DraftError::Missing("policyNumber"))?;
        let policy_type = self.policy_type.ok_or(DraftError::Missing("type"))?;
        let premium = check_premium(self.premium.ok_or(DraftError::Missing("premium"))?)?;
        let premium_frequency = self
            .premium_frequency
            .ok_or(DraftError::Missing("premiumFrequency"))?;
        let start_date = self.start_date.ok_or(DraftError::Missing("startDate"))?;
        let end_date = self.end_date.ok_or(DraftError::Missing("endDate"))?;

        let mut policy = InsurancePolicy::new(
            id,
            provider,
            policy_number,
            policy_type,
            premium,
            premium_frequency,
            start_date,
            end_date,
            self.status.unwrap_or(PolicyStatus::Active),
        );
        policy.coverage_details = non_blank(self.coverage_details);
        policy.license_plate = non_blank(self.license_plate);
        policy.address = non_blank(self.address);
        policy.insured_person_name = non_blank(self.insured_person_name);

        Ok(policy)
    }

    /// Overwrite the fields this draft carries; `id` is never touched
    ///
    /// An empty string for an optional text field clears it.
    pub fn apply_to(self, policy: &mut InsurancePolicy) -> Result<(), DraftError> {
        if let Some(premium) = self.premium {
            policy.premium = check_premium(premium)?;
        }
        if let Some(provider) = non_blank(self.provider) {
            policy.provider = provider;
        }
        if let Some(number) = non_blank(self.policy_number) {
            policy.policy_number = number;
        }
        if let Some(policy_type) = self.policy_type {
            policy.policy_type = policy_type;
        }
        if let Some(freq) = self.premium_frequency {
            policy.premium_frequency = freq;
        }
        if let Some(start) = self.start_date {
            policy.start_date = start;
        }
        if let Some(end) = self.end_date {
            policy.end_date = end;
        }
        if let Some(status) = self.status {
            policy.status = status;
        }
        if let Some(details) = self.coverage_details {
            policy.coverage_details = non_blank(Some(details));
        }
        if let Some(plate) = self.license_plate {
            policy.license_plate = non_blank(Some(plate));
        }
        if let Some(address) = self.address {
            policy.address = non_blank(Some(address));
        }
        if let Some(name) = self.insured_person_name {
            policy.insured_person_name = non_blank(Some(name));
        }
        Ok(())
    }

    /// Fill fields still unset from another draft (e.g. an extraction result)
    pub fn fill_missing_from(&mut self, other: PolicyDraft) {
        fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
            if slot.is_none() {
                *slot = value;
            }
        }

        fill(&mut self.provider, other.provider);
        fill(&mut self.policy_number, other.policy_number);
        fill(&mut self.policy_type, other.policy_type);
        fill(&mut self.premium, other.premium);
        fill(&mut self.premium_frequency, other.premium_frequency);
        fill(&mut self.start_date, other.start_date);
        fill(&mut self.end_date, other.end_date);
        fill(&mut self.status, other.status);
        fill(&mut self.coverage_details, other.coverage_details);
        fill(&mut self.license_plate, other.license_plate);
        fill(&mut self.address, other.address);
        fill(&mut self.insured_person_name, other.insured_person_name);
    }
}

impl From<&InsurancePolicy> for PolicyDraft {
    fn from(policy: &InsurancePolicy) -> Self {
        Self {
            provider: Some(policy.provider.clone()),
            policy_number: Some(policy.policy_number.clone()),
            policy_type: Some(policy.policy_type),
            premium: Some(policy.premium),
            premium_frequency: Some(policy.premium_frequency.clone()),
            start_date: Some(policy.start_date),
            end_date: Some(policy.end_date),
            status: Some(policy.status),
            coverage_details: policy.coverage_details.clone(),
            license_plate: policy.license_plate.clone(),
            address: policy.address.clone(),
            insured_person_name: policy.insured_person_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::sample_policies;

    fn complete_draft() -> PolicyDraft {
        PolicyDraft {
            provider: Some("State Farm".into()),
            policy_number: Some("LIF-001".into()),
            policy_type: Some(PolicyType::Life),
            premium: Some(35.5),
            premium_frequency: Some(PremiumFrequency::Monthly),
            start_date: NaiveDate::from_ymd_opt(2024, 2, 1),
            end_date: NaiveDate::from_ymd_opt(2044, 2, 1),
            insured_person_name: Some("Sam Doe".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_into_policy_defaults_status() {
        let policy = complete_draft().into_policy("abc").unwrap();
        assert_eq!(policy.id, "abc");
        assert_eq!(policy.status, PolicyStatus::Active);
        assert_eq!(policy.insured_person_name.as_deref(), Some("Sam Doe"));
        assert_eq!(policy.license_plate, None);
    }

    #[test]
    fn test_into_policy_names_missing_field() {
        let mut draft = complete_draft();
        draft.end_date = None;
        assert_eq!(draft.into_policy("x"), Err(DraftError::Missing("endDate")));

        let mut draft = complete_draft();
        draft.provider = Some("   ".into());
        assert_eq!(draft.into_policy("x"), Err(DraftError::Missing("provider")));
    }

    #[test]
    fn test_negative_premium_rejected() {
        let mut draft = complete_draft();
        draft.premium = Some(-1.0);
        assert_eq!(draft.into_policy("x"), Err(DraftError::InvalidPremium(-1.0)));
    }

    #[test]
    fn test_apply_keeps_id_and_clears_blank_text() {
        let mut policy = sample_policies().remove(0);
        policy.license_plate = Some("OLD".into());

        let edit = PolicyDraft {
            premium: Some(99.0),
            status: Some(PolicyStatus::Expired),
            license_plate: Some(String::new()),
            ..Default::default()
        };
        edit.apply_to(&mut policy).unwrap();

        assert_eq!(policy.id, "1");
        assert_eq!(policy.premium, 99.0);
        assert_eq!(policy.status, PolicyStatus::Expired);
        assert_eq!(policy.license_plate, None);
        assert_eq!(policy.provider, "Geico");
    }

    #[test]
    fn test_fill_missing_prefers_existing_values() {
        let mut draft = PolicyDraft {
            provider: Some("Typed by user".into()),
            ..Default::default()
        };
        draft.fill_missing_from(complete_draft());
        assert_eq!(draft.provider.as_deref(), Some("Typed by user"));
        assert_eq!(draft.policy_number.as_deref(), Some("LIF-001"));
        assert_eq!(draft.premium, Some(35.5));
    }

    #[test]
    fn test_draft_from_policy_round_trips() {
        let original = sample_policies().remove(2);
        let rebuilt = PolicyDraft::from(&original).into_policy("3").unwrap();
        assert_eq!(rebuilt, original);
    }
}
