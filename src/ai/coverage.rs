//! Narrative analysis of a user's insurance portfolio

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

use super::backend::{GenerateRequest, GenerativeModel};
use crate::policy::InsurancePolicy;

/// Returned without calling the model when there is nothing to analyze
pub const NO_POLICIES_MESSAGE: &str =
    "No policies available to analyze. Please add your insurance policies first.";

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("An error occurred while analyzing your coverage. Please ensure your API key is configured correctly and try again.")]
    Failed,
    #[error("failed to encode policies for analysis: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Fields that identify a record or carry attachment payloads; not sent
const OMITTED_FIELDS: [&str; 3] = ["id", "contractData", "contractMimeType"];

fn policies_for_prompt(policies: &[InsurancePolicy]) -> Result<String, serde_json::Error> {
    let mut value = serde_json::to_value(policies)?;
    if let Value::Array(items) = &mut value {
        for item in items.iter_mut() {
            if let Value::Object(fields) = item {
                for key in OMITTED_FIELDS {
                    fields.remove(key);
                }
            }
        }
    }
    serde_json::to_string_pretty(&value)
}

/// Prompt sent to the model for a non-empty collection
pub fn build_prompt(policies: &[InsurancePolicy]) -> Result<String, serde_json::Error> {
    let listing = policies_for_prompt(policies)?;
    Ok(format!(
        "Based on the following list of insurance policies, provide a concise analysis for the policyholder.

Policies:
{listing}

Your analysis should include:
1. **Overall Summary:** A brief overview of the total number of policies and the total calculated annual premium.
2. **Potential Gaps:** Identify any common types of insurance that are missing (e.g., life, disability, renters/homeowners) and briefly explain their importance.
3. **Coverage Observations:** Point out any potential areas for review, such as policies nearing their expiration date or opportunities to bundle policies for discounts.
4. **Actionable Suggestions:** Provide 2-3 clear, actionable tips for the user to improve their insurance portfolio.

Format your response as clean markdown, using headings and bullet points for readability.
"
    ))
}

/// Ask the model for a coverage analysis of `policies`
///
/// An empty collection short-circuits to [`NO_POLICIES_MESSAGE`]. Any model
/// failure is logged and reported as the generic [`AnalysisError::Failed`].
pub async fn analyze_coverage<M>(model: &M, policies: &[InsurancePolicy]) -> Result<String, AnalysisError>
where
    M: GenerativeModel + ?Sized,
{
    if policies.is_empty() {
        return Ok(NO_POLICIES_MESSAGE.to_string());
    }

    let prompt = build_prompt(policies)?;
    log::info!("Requesting coverage analysis of {} policies from {}", policies.len(), model.model_name());

    match model.generate(GenerateRequest::text(prompt)).await {
        Ok(text) => Ok(text),
        Err(e) => {
            log::error!("Error analyzing coverage: {}", e);
            Err(AnalysisError::Failed)
        }
    }
}

fn bold_pattern() -> &'static Regex {
    static BOLD: OnceLock<Regex> = OnceLock::new();
    BOLD.get_or_init(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern is a valid regex"))
}

/// Convert analysis text to display markup: newlines become `<br />` and
/// `**bold**` becomes `<strong>bold</strong>`.
pub fn render_markup(text: &str) -> String {
    let with_breaks = text.replace('\n', "<br />");
    bold_pattern()
        .replace_all(&with_breaks, "<strong>$1</strong>")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockModel;
    use crate::policy::sample_policies;

    #[tokio::test]
    async fn test_empty_collection_skips_the_model() {
        let model = MockModel::with_response("should not be used");
        let text = analyze_coverage(&model, &[]).await.unwrap();
        assert_eq!(text, NO_POLICIES_MESSAGE);
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_returns_model_text() {
        let model = MockModel::with_response("## Summary\nYou have **3** policies.");
        let text = analyze_coverage(&model, &sample_policies()).await.unwrap();
        assert_eq!(text, "## Summary\nYou have **3** policies.");
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_generic() {
        let model = MockModel::failing();
        let err = analyze_coverage(&model, &sample_policies()).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Failed));
        assert!(!err.to_string().contains("401"));
        assert!(err.to_string().contains("API key"));
    }

    #[tokio::test]
    async fn test_prompt_omits_ids_and_attachments() {
        let mut policies = sample_policies();
        policies[0].contract_file_name = Some("auto.png".into());
        policies[0].contract_mime_type = Some("image/png".into());
        policies[0].contract_data = Some("QUJDREVGRw==".into());

        let model = MockModel::with_response("ok");
        analyze_coverage(&model, &policies).await.unwrap();
        let prompt = model.last_request().unwrap().prompt_text();

        assert!(prompt.contains("\"provider\": \"Geico\""));
        assert!(prompt.contains("\"premiumFrequency\": \"Monthly\""));
        assert!(prompt.contains("auto.png"));
        assert!(!prompt.contains("\"id\""));
        assert!(!prompt.contains("QUJDREVGRw=="));
        assert!(prompt.contains("**Potential Gaps:**"));
    }

    #[test]
    fn test_markup_converts_bold_and_newlines() {
        assert_eq!(
            render_markup("**Overall Summary:** fine\n- a **b** c"),
            "<strong>Overall Summary:</strong> fine<br />- a <strong>b</strong> c"
        );
        assert_eq!(render_markup("no markers"), "no markers");
    }
}
