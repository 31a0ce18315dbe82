//! Policy data structures matching the persisted record format

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when a string does not name a member of a closed enumeration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?} (expected one of: {expected})")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
    expected: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str, expected: &[&str]) -> Self {
        Self {
            kind,
            value: value.to_string(),
            expected: expected.join(", "),
        }
    }
}

/// Line of insurance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PolicyType {
    Auto,
    Health,
    Home,
    Life,
    Pet,
    Other,
}

impl PolicyType {
    pub const ALL: [PolicyType; 6] = [
        PolicyType::Auto,
        PolicyType::Health,
        PolicyType::Home,
        PolicyType::Life,
        PolicyType::Pet,
        PolicyType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyType::Auto => "Auto",
            PolicyType::Health => "Health",
            PolicyType::Home => "Home",
            PolicyType::Life => "Life",
            PolicyType::Pet => "Pet",
            PolicyType::Other => "Other",
        }
    }
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for PolicyType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PolicyType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<&str> = PolicyType::ALL.iter().map(|t| t.as_str()).collect();
                ParseEnumError::new("policy type", s, &names)
            })
    }
}

/// Lifecycle status of a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyStatus {
    Active,
    Expired,
    Cancelled,
}

impl PolicyStatus {
    pub const ALL: [PolicyStatus; 3] = [
        PolicyStatus::Active,
        PolicyStatus::Expired,
        PolicyStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyStatus::Active => "Active",
            PolicyStatus::Expired => "Expired",
            PolicyStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for PolicyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for PolicyStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PolicyStatus::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<&str> = PolicyStatus::ALL.iter().map(|st| st.as_str()).collect();
                ParseEnumError::new("policy status", s, &names)
            })
    }
}

/// How often the premium is billed
///
/// Stored records may carry a frequency outside the known set. Those are kept
/// verbatim in `Unrecognized` so they survive a load/save cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PremiumFrequency {
    Monthly,
    Quarterly,
    SemiAnnually,
    Annually,
    Unrecognized(String),
}

impl PremiumFrequency {
    pub const KNOWN: [PremiumFrequency; 4] = [
        PremiumFrequency::Monthly,
        PremiumFrequency::Quarterly,
        PremiumFrequency::SemiAnnually,
        PremiumFrequency::Annually,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            PremiumFrequency::Monthly => "Monthly",
            PremiumFrequency::Quarterly => "Quarterly",
            PremiumFrequency::SemiAnnually => "Semi-Annually",
            PremiumFrequency::Annually => "Annually",
            PremiumFrequency::Unrecognized(raw) => raw,
        }
    }

    /// Number of payments per year (0 for an unrecognized frequency)
    pub fn annualization_factor(&self) -> f64 {
        match self {
            PremiumFrequency::Monthly => 12.0,
            PremiumFrequency::Quarterly => 4.0,
            PremiumFrequency::SemiAnnually => 2.0,
            PremiumFrequency::Annually => 1.0,
            PremiumFrequency::Unrecognized(_) => 0.0,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, PremiumFrequency::Unrecognized(_))
    }
}

impl From<String> for PremiumFrequency {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Monthly" => PremiumFrequency::Monthly,
            "Quarterly" => PremiumFrequency::Quarterly,
            "Semi-Annually" => PremiumFrequency::SemiAnnually,
            "Annually" => PremiumFrequency::Annually,
            _ => PremiumFrequency::Unrecognized(raw),
        }
    }
}

impl From<PremiumFrequency> for String {
    fn from(freq: PremiumFrequency) -> Self {
        match freq {
            PremiumFrequency::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for PremiumFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Strict parse for user input; only the four billing frequencies are accepted
impl FromStr for PremiumFrequency {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace(' ', "-");
        PremiumFrequency::KNOWN
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| {
                let names: Vec<&str> = PremiumFrequency::KNOWN.iter().map(|f| f.as_str()).collect();
                ParseEnumError::new("premium frequency", s, &names)
            })
    }
}

/// A single tracked insurance policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsurancePolicy {
    /// Stable identifier, fixed at creation
    pub id: String,

    pub provider: String,

    pub policy_number: String,

    #[serde(rename = "type")]
    pub policy_type: PolicyType,

    /// Premium per billing period
    pub premium: f64,

    pub premium_frequency: PremiumFrequency,

    pub start_date: NaiveDate,

    /// Expiry date; not checked against `start_date`
    pub end_date: NaiveDate,

    pub status: PolicyStatus,

    /// Free-text notes carried by early records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage_details: Option<String>,

    // Type-correlated fields. Which ones apply is a display convention only.

    /// Auto
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,

    /// Home
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Health and Life
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insured_person_name: Option<String>,

    // Attached contract

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_file_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_mime_type: Option<String>,

    /// Base64 encoded document bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_data: Option<String>,
}

impl InsurancePolicy {
    /// Create a policy with the required fields and no optional attributes
    pub fn new(
        id: impl Into<String>,
        provider: impl Into<String>,
        policy_number: impl Into<String>,
        policy_type: PolicyType,
        premium: f64,
        premium_frequency: PremiumFrequency,
        start_date: NaiveDate,
        end_date: NaiveDate,
        status: PolicyStatus,
    ) -> Self {
        Self {
            id: id.into(),
            provider: provider.into(),
            policy_number: policy_number.into(),
            policy_type,
            premium,
            premium_frequency,
            start_date,
            end_date,
            status,
            coverage_details: None,
            license_plate: None,
            address: None,
            insured_person_name: None,
            contract_file_name: None,
            contract_mime_type: None,
            contract_data: None,
        }
    }

    /// Premium normalized to a yearly amount
    pub fn annual_premium(&self) -> f64 {
        self.premium * self.premium_frequency.annualization_factor()
    }

    pub fn is_active(&self) -> bool {
        self.status == PolicyStatus::Active
    }

    pub fn has_contract(&self) -> bool {
        self.contract_data.is_some()
    }

    /// The optional attribute conventionally shown for this policy's type
    pub fn type_detail(&self) -> Option<(&'static str, &str)> {
        match self.policy_type {
            PolicyType::Auto => self.license_plate.as_deref().map(|v| ("License plate", v)),
            PolicyType::Home => self.address.as_deref().map(|v| ("Address", v)),
            PolicyType::Health | PolicyType::Life => {
                self.insured_person_name.as_deref().map(|v| ("Insured person", v))
            }
            PolicyType::Pet | PolicyType::Other => None,
        }
    }
}

/// Collection shown to a first-time user
pub fn sample_policies() -> Vec<InsurancePolicy> {
    let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();
    vec![
        InsurancePolicy::new(
            "1",
            "Geico",
            "AUT123456",
            PolicyType::Auto,
            120.0,
            PremiumFrequency::Monthly,
            date(2023, 1, 15),
            date(2024, 1, 15),
            PolicyStatus::Active,
        ),
        InsurancePolicy::new(
            "2",
            "Blue Cross",
            "HLT987654",
            PolicyType::Health,
            450.0,
            PremiumFrequency::Monthly,
            date(2023, 6, 1),
            date(2024, 5, 31),
            PolicyStatus::Active,
        ),
        InsurancePolicy::new(
            "3",
            "Lemonade",
            "HOM654321",
            PolicyType::Home,
            800.0,
            PremiumFrequency::Annually,
            date(2023, 8, 20),
            date(2024, 8, 19),
            PolicyStatus::Active,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annualization_factors() {
        assert_eq!(PremiumFrequency::Monthly.annualization_factor(), 12.0);
        assert_eq!(PremiumFrequency::Quarterly.annualization_factor(), 4.0);
        assert_eq!(PremiumFrequency::SemiAnnually.annualization_factor(), 2.0);
        assert_eq!(PremiumFrequency::Annually.annualization_factor(), 1.0);
        assert_eq!(
            PremiumFrequency::Unrecognized("Weekly".into()).annualization_factor(),
            0.0
        );
    }

    #[test]
    fn test_wire_names() {
        let policy = &sample_policies()[0];
        let value = serde_json::to_value(policy).unwrap();
        assert_eq!(value["type"], "Auto");
        assert_eq!(value["policyNumber"], "AUT123456");
        assert_eq!(value["premiumFrequency"], "Monthly");
        assert_eq!(value["startDate"], "2023-01-15");
        assert!(value.get("licensePlate").is_none());

        let semi = serde_json::to_value(PremiumFrequency::SemiAnnually).unwrap();
        assert_eq!(semi, "Semi-Annually");
    }

    #[test]
    fn test_unrecognized_frequency_survives() {
        let json = r#"{"id":"x","provider":"P","policyNumber":"N","type":"Pet",
            "premium":10,"premiumFrequency":"Weekly","startDate":"2024-01-01",
            "endDate":"2025-01-01","status":"Active"}"#;
        let policy: InsurancePolicy = serde_json::from_str(json).unwrap();
        assert_eq!(policy.premium_frequency, PremiumFrequency::Unrecognized("Weekly".into()));
        assert!(!policy.premium_frequency.is_recognized());
        assert!(PremiumFrequency::Quarterly.is_recognized());
        assert_eq!(policy.annual_premium(), 0.0);

        let back = serde_json::to_value(&policy).unwrap();
        assert_eq!(back["premiumFrequency"], "Weekly");
    }

    #[test]
    fn test_user_input_parsing() {
        assert_eq!("semi annually".parse::<PremiumFrequency>().unwrap(), PremiumFrequency::SemiAnnually);
        assert_eq!("home".parse::<PolicyType>().unwrap(), PolicyType::Home);
        assert_eq!("CANCELLED".parse::<PolicyStatus>().unwrap(), PolicyStatus::Cancelled);
        assert!("Weekly".parse::<PremiumFrequency>().is_err());
        assert!("Boat".parse::<PolicyType>().is_err());
    }

    #[test]
    fn test_type_detail_follows_type() {
        let mut policy = sample_policies().remove(0);
        assert_eq!(policy.type_detail(), None);
        policy.license_plate = Some("7ABC123".into());
        assert_eq!(policy.type_detail(), Some(("License plate", "7ABC123")));

        // Not enforced by the model, only ignored for display
        policy.address = Some("1 Main St".into());
        assert_eq!(policy.type_detail(), Some(("License plate", "7ABC123")));
    }

    #[test]
    fn test_has_contract_follows_payload() {
        let mut policy = sample_policies().remove(2);
        assert!(!policy.has_contract());

        // A name alone does not count as an attachment
        policy.contract_file_name = Some("deed.pdf".into());
        assert!(!policy.has_contract());

        policy.contract_data = Some("JVBERg==".into());
        assert!(policy.has_contract());
    }
}
