//! Structured extraction of policy details from a contract document

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;
use thiserror::Error;

use super::backend::{GenerateRequest, GenerativeModel};
use crate::policy::{PolicyDraft, PolicyType, PremiumFrequency};
use chrono::NaiveDate;

pub const EXTRACTION_INSTRUCTION: &str = "Analyze this insurance policy document and extract the \
following details. If a field is not present in the document, omit it. Dates must be formatted \
as YYYY-MM-DD. The premium is the amount charged per billing period, as a plain number without \
currency symbols.";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("a document and its media type are required")]
    MissingInput,
    #[error("Failed to analyze the document. Please try again or enter the details manually.")]
    Failed,
}

/// Values the model should fill, each optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_number: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub policy_type: Option<PolicyType>,
    #[serde(default, deserialize_with = "lenient_amount", skip_serializing_if = "Option::is_none")]
    pub premium: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub premium_frequency: Option<PremiumFrequency>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insured_person_name: Option<String>,
}

/// Parse a string field, treating blanks and unparseable values as absent
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.trim().parse().ok()))
}

/// Accept an amount as a JSON number or as numeric text such as `"$1,200.50"`
fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(f64),
        Text(String),
    }

    let raw: Option<Amount> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(Amount::Number(n)) => Some(n),
        Some(Amount::Text(text)) => {
            let cleaned: String = text
                .chars()
                .filter(|c| !matches!(c, '$' | ',' | ' '))
                .collect();
            cleaned.parse().ok()
        }
        None => None,
    })
}

impl ExtractedPolicy {
    pub fn is_empty(&self) -> bool {
        *self == ExtractedPolicy::default()
    }
}

impl From<ExtractedPolicy> for PolicyDraft {
    fn from(found: ExtractedPolicy) -> Self {
        let text = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        PolicyDraft {
            provider: text(found.provider),
            policy_number: text(found.policy_number),
            policy_type: found.policy_type,
            premium: found.premium.filter(|p| p.is_finite() && *p >= 0.0),
            premium_frequency: found.premium_frequency,
            start_date: found.start_date,
            end_date: found.end_date,
            status: None,
            coverage_details: None,
            license_plate: text(found.license_plate),
            address: text(found.address),
            insured_person_name: text(found.insured_person_name),
        }
    }
}

/// Response schema listing every field the model may return
pub fn extraction_schema() -> Value {
    let types: Vec<&str> = PolicyType::ALL.iter().map(|t| t.as_str()).collect();
    let frequencies: Vec<&str> = PremiumFrequency::KNOWN.iter().map(|f| f.as_str()).collect();

    json!({
        "type": "OBJECT",
        "properties": {
            "provider": {"type": "STRING", "description": "Name of the insurance company"},
            "policyNumber": {"type": "STRING", "description": "Policy or contract number"},
            "policyType": {"type": "STRING", "enum": types, "description": "Line of insurance"},
            "premium": {"type": "NUMBER", "description": "Premium amount per billing period"},
            "premiumFrequency": {"type": "STRING", "enum": frequencies, "description": "How often the premium is billed"},
            "startDate": {"type": "STRING", "format": "date", "description": "Coverage start date, YYYY-MM-DD"},
            "endDate": {"type": "STRING", "format": "date", "description": "Coverage end date, YYYY-MM-DD"},
            "licensePlate": {"type": "STRING", "description": "Vehicle license plate, auto policies only"},
            "address": {"type": "STRING", "description": "Insured property address, home policies only"},
            "insuredPersonName": {"type": "STRING", "description": "Insured person, health and life policies only"}
        }
    })
}

/// Ask the model to read policy details out of a document
///
/// Non-image media types are allowed through with a warning; the model
/// decides whether it can read them.
pub async fn extract_policy_details<M>(
    model: &M,
    bytes: &[u8],
    mime_type: &str,
) -> Result<ExtractedPolicy, ExtractionError>
where
    M: GenerativeModel + ?Sized,
{
    let mime_type = mime_type.trim();
    if bytes.is_empty() || mime_type.is_empty() {
        return Err(ExtractionError::MissingInput);
    }
    if !mime_type.starts_with("image/") {
        log::warn!("Document type {} is not an image; extraction may not work", mime_type);
    }

    let request = GenerateRequest::text(EXTRACTION_INSTRUCTION)
        .with_document(mime_type, bytes)
        .with_json_schema(extraction_schema());

    log::info!("Requesting document extraction ({} bytes, {}) from {}", bytes.len(), mime_type, model.model_name());
    let text = model.generate(request).await.map_err(|e| {
        log::error!("Error analyzing document: {}", e);
        ExtractionError::Failed
    })?;

    serde_json::from_str(text.trim()).map_err(|e| {
        log::error!("Error parsing extraction response: {}", e);
        ExtractionError::Failed
    })
}

/// Best-effort media type from a file extension
pub fn guess_mime_type(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MockModel, Part};

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G'];

    #[tokio::test]
    async fn test_missing_input_is_an_error() {
        let model = MockModel::with_response("{}");
        assert!(matches!(
            extract_policy_details(&model, &[], "image/png").await,
            Err(ExtractionError::MissingInput)
        ));
        assert!(matches!(
            extract_policy_details(&model, PNG, "  ").await,
            Err(ExtractionError::MissingInput)
        ));
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_parses_structured_response() {
        let model = MockModel::with_response(
            r#"{"provider":"Geico","policyNumber":"AUT-9","policyType":"Auto","premium":132.5,
                "premiumFrequency":"Monthly","startDate":"2025-01-15","endDate":"2026-01-15",
                "licensePlate":"7ABC123"}"#,
        );
        let found = extract_policy_details(&model, PNG, "image/png").await.unwrap();

        assert_eq!(found.provider.as_deref(), Some("Geico"));
        assert_eq!(found.policy_type, Some(PolicyType::Auto));
        assert_eq!(found.premium, Some(132.5));
        assert_eq!(found.premium_frequency, Some(PremiumFrequency::Monthly));
        assert_eq!(found.end_date, NaiveDate::from_ymd_opt(2026, 1, 15));
        assert_eq!(found.address, None);
    }

    #[tokio::test]
    async fn test_request_carries_document_and_schema() {
        let model = MockModel::with_response("{}");
        extract_policy_details(&model, PNG, "image/png").await.unwrap();

        let request = model.last_request().unwrap();
        assert!(matches!(&request.parts[0], Part::InlineData { mime_type, .. } if mime_type == "image/png"));
        assert_eq!(request.prompt_text(), EXTRACTION_INSTRUCTION);

        let schema = request.response_schema.unwrap();
        assert_eq!(schema["properties"]["policyType"]["enum"][4], "Pet");
        assert_eq!(schema["properties"]["premiumFrequency"]["enum"][2], "Semi-Annually");
    }

    #[tokio::test]
    async fn test_non_image_proceeds() {
        let model = MockModel::with_response(r#"{"provider":"Aetna"}"#);
        let found = extract_policy_details(&model, b"%PDF-1.7", "application/pdf").await.unwrap();
        assert_eq!(found.provider.as_deref(), Some("Aetna"));
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failures_are_generic() {
        let model = MockModel::failing();
        let err = extract_policy_details(&model, PNG, "image/png").await.unwrap_err();
        assert!(matches!(err, ExtractionError::Failed));

        let model = MockModel::with_response("Sorry, I cannot read this image.");
        let err = extract_policy_details(&model, PNG, "image/png").await.unwrap_err();
        assert!(matches!(err, ExtractionError::Failed));
    }

    #[test]
    fn test_odd_values_become_absent() {
        let found: ExtractedPolicy = serde_json::from_str(
            r#"{"policyType":"Boat","premiumFrequency":"Weekly","startDate":"","endDate":null}"#,
        )
        .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_converts_to_draft() {
        let found = ExtractedPolicy {
            provider: Some("  ".into()),
            policy_number: Some("H-1".into()),
            premium: Some(-5.0),
            ..Default::default()
        };
        let draft = PolicyDraft::from(found);
        assert_eq!(draft.provider, None);
        assert_eq!(draft.policy_number.as_deref(), Some("H-1"));
        assert_eq!(draft.premium, None);
        assert_eq!(draft.status, None);
    }

    #[test]
    fn test_mime_guess() {
        assert_eq!(guess_mime_type("card.JPG"), "image/jpeg");
        assert_eq!(guess_mime_type("contract.pdf"), "application/pdf");
        assert_eq!(guess_mime_type("noext"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_premium_given_as_text() {
        let model = MockModel::with_response(r#"{"provider":"Geico","premium":"132.50"}"#);
        let found = extract_policy_details(&model, PNG, "image/png").await.unwrap();
        assert_eq!(found.premium, Some(132.5));

        let found: ExtractedPolicy =
            serde_json::from_str(r#"{"premium":"$1,200.00"}"#).unwrap();
        assert_eq!(found.premium, Some(1200.0));

        let found: ExtractedPolicy = serde_json::from_str(r#"{"premium":"about forty"}"#).unwrap();
        assert_eq!(found.premium, None);

        let found: ExtractedPolicy = serde_json::from_str(r#"{"premium":null}"#).unwrap();
        assert_eq!(found.premium, None);
    }
}
