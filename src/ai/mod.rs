//! Hosted-model integrations: coverage analysis and document extraction
//!
//! - `backend`: the `GenerativeModel` trait and request types
//! - `gemini`: REST client for the Gemini API
//! - `mock`: canned-response model for tests

pub mod backend;
pub mod coverage;
pub mod extraction;
pub mod gemini;
pub mod mock;

pub use backend::{AiError, GenerateRequest, GenerativeModel, Part};
pub use coverage::{analyze_coverage, render_markup, AnalysisError, NO_POLICIES_MESSAGE};
pub use extraction::{extract_policy_details, guess_mime_type, ExtractedPolicy, ExtractionError};
pub use gemini::GeminiClient;
pub use mock::MockModel;
