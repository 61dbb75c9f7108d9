//! Credential lookup for providers

use std::collections::HashMap;
use tunesift_common::config::is_valid_key;

/// Supplies API keys by provider name
///
/// A missing key is not an error; providers that need one degrade to
/// `Unauthorized` outcomes.
pub trait CredentialProvider: Send + Sync {
    fn get_key(&self, provider: &str) -> Option<String>;
}

/// Keys resolved up front from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    keys: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key; blank or absent keys are ignored
    pub fn with_key(mut self, provider: impl Into<String>, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| is_valid_key(k)) {
            self.keys.insert(provider.into(), key);
        }
        self
    }
}

impl CredentialProvider for StaticCredentials {
    fn get_key(&self, provider: &str) -> Option<String> {
        self.keys.get(provider).cloned()
    }
}
