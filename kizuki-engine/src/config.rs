//! Engine configuration.

use serde::{Deserialize, Serialize};

use practicum::types::ProgramConfig;

/// Configuration for one engine session.
///
/// The program block (slogan, focus keywords) used to be process-global in
/// the original dashboard; here it is an explicit object owned by the
/// session and passed into prompt assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Shared program context included in analysis prompts
    pub program: ProgramConfig,
    /// Default AI provider name
    pub provider: String,
    /// Provider tried when the default is rate limited
    pub fallback_provider: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: ProgramConfig::default(),
            provider: "gemini".to_string(),
            fallback_provider: None,
        }
    }
}

impl EngineConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.provider, "gemini");
        assert!(config.fallback_provider.is_none());
        assert!(!config.program.slogan.is_empty());
    }

    #[test]
    fn yaml_round_trip() {
        let mut config = EngineConfig::default();
        config.fallback_provider = Some("groq".to_string());

        let yaml = config.to_yaml().unwrap();
        let parsed = EngineConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.fallback_provider.as_deref(), Some("groq"));
    }
}
