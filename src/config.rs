//! Runtime configuration

use crate::ai::gemini::{GeminiClient, DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::storage::FileStore;
use std::path::PathBuf;

/// Default directory for persisted data, relative to the working directory
pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory holding the persisted collection
    pub data_dir: PathBuf,
    /// Credential for the hosted model; calls fail without it
    pub api_key: Option<String>,
    /// Model used for analysis and extraction
    pub model: String,
    /// Base URL of the model API
    pub api_base: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl Config {
    pub fn file_store(&self) -> FileStore {
        FileStore::new(&self.data_dir)
    }

    pub fn model_client(&self) -> GeminiClient {
        GeminiClient::new(&self.api_base, &self.model, self.api_key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::GenerativeModel;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.model, "gemini-2.5-flash");
        assert!(config.api_base.starts_with("https://generativelanguage.googleapis.com"));
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn test_builds_collaborators() {
        let config = Config {
            data_dir: PathBuf::from("/tmp/insurtrack-test"),
            model: "gemini-custom".into(),
            ..Config::default()
        };
        assert_eq!(config.file_store().dir(), PathBuf::from("/tmp/insurtrack-test").as_path());
        assert_eq!(config.model_client().model_name(), "gemini-custom");
    }
}
