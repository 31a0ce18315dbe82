//! Decode and encode policy collections in their JSON array form

use super::InsurancePolicy;

/// Decode a JSON array of policies
pub fn load_policies_from_str(text: &str) -> Result<Vec<InsurancePolicy>, serde_json::Error> {
    serde_json::from_str(text)
}

/// Compact encoding used for the persisted collection
pub fn encode_policies(policies: &[InsurancePolicy]) -> Result<String, serde_json::Error> {
    serde_json::to_string(policies)
}

/// Indented encoding used for user-facing backups
pub fn encode_policies_pretty(policies: &[InsurancePolicy]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(policies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::sample_policies;

    #[test]
    fn test_legacy_record_loads_with_optionals_absent() {
        let legacy = r#"[{"id":"2024-01-01T10:00:00.000Z","provider":"Geico",
            "policyNumber":"AUT1","type":"Auto","premium":120,
            "premiumFrequency":"Monthly","startDate":"2023-01-15",
            "endDate":"2024-01-15","status":"Active"}]"#;
        let policies = load_policies_from_str(legacy).unwrap();
        assert_eq!(policies.len(), 1);

        let p = &policies[0];
        assert_eq!(p.id, "2024-01-01T10:00:00.000Z");
        assert_eq!(p.license_plate, None);
        assert_eq!(p.address, None);
        assert_eq!(p.insured_person_name, None);
        assert_eq!(p.contract_file_name, None);
        assert_eq!(p.contract_data, None);
    }

    #[test]
    fn test_compact_encoding_round_trips() {
        let text = encode_policies(&sample_policies()).unwrap();
        assert!(!text.contains('\n'));
        let policies = load_policies_from_str(&text).expect("Failed to load policies");
        assert_eq!(policies.len(), 3);
        assert_eq!(policies[2].provider, "Lemonade");
    }

    #[test]
    fn test_pretty_encoding_is_indented() {
        let text = encode_policies_pretty(&sample_policies()).unwrap();
        assert!(text.starts_with("[\n  {"));
        assert_eq!(load_policies_from_str(&text).unwrap(), sample_policies());
    }
}
