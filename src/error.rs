//! Error types for the Reya plugin

use crate::models::ResourceKind;
use thiserror::Error;

/// Result type alias for plugin operations
pub type Result<T> = std::result::Result<T, PluginError>;

#[derive(Error, Debug)]
pub enum PluginError {

    // =============================
    // Core Errors
    // =============================

    /// Remote API unreachable or answered outside the 2xx range.
    #[error("Upstream fetch failed for {resource} (status: {status:?}): {message}")]
    UpstreamFetch {
        resource: ResourceKind,
        status: Option<u16>,
        message: String,
    },

    #[error("Classification error: {0}")]
    Classification(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Completion error: {0}")]
    Completion(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PluginError {
    pub fn upstream(resource: ResourceKind, status: Option<u16>, message: impl Into<String>) -> Self {
        PluginError::UpstreamFetch {
            resource,
            status,
            message: message.into(),
        }
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, PluginError::UpstreamFetch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_display_carries_resource_and_status() {
        let err = PluginError::upstream(ResourceKind::Prices, Some(503), "service unavailable");
        let text = err.to_string();

        assert!(err.is_upstream());
        assert!(text.contains("prices"));
        assert!(text.contains("503"));
    }

    #[test]
    fn test_other_variants_are_not_upstream() {
        assert!(!PluginError::Classification("bad json".into()).is_upstream());
        assert!(!PluginError::Configuration("bad url".into()).is_upstream());
    }
}
