//! Programmatic configuration builder for integration tests

use mediagen_config::{
    Config, FallbackTarget, GenerationConfig, GenerationProviderConfig, GenerationProviderType, PollingConfig,
    ServerConfig,
};
use secrecy::SecretString;

/// Builder for constructing test configurations
///
/// Polling defaults to a zero interval so many cycles run without real delays
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with minimal defaults
    pub fn new() -> Self {
        Self {
            config: Config {
                server: ServerConfig::default(),
                generation: GenerationConfig {
                    providers: indexmap::IndexMap::default(),
                    polling: PollingConfig {
                        interval_seconds: 0,
                        max_attempts: 60,
                        staleness_minutes: 30,
                    },
                },
            },
        }
    }

    /// Add a `DashScope`-style provider pointed at a mock backend
    pub fn with_dashscope_provider(mut self, name: &str, base_url: &str) -> Self {
        self.config.generation.providers.insert(
            name.to_owned(),
            GenerationProviderConfig {
                provider_type: GenerationProviderType::Dashscope,
                api_key: Some(SecretString::from("test-key")),
                base_url: Some(base_url.parse().expect("valid URL")),
                image_sizes: vec!["1024*1024".to_owned(), "1280*720".to_owned()],
                video_resolutions: vec!["1280*720".to_owned()],
                fallbacks: Vec::new(),
            },
        );
        self
    }

    /// Set the fallback sequence for a provider
    pub fn with_fallbacks(mut self, provider: &str, fallbacks: Vec<FallbackTarget>) -> Self {
        self.config
            .generation
            .providers
            .get_mut(provider)
            .expect("provider must be added first")
            .fallbacks = fallbacks;
        self
    }

    /// Set the poll attempt budget
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.config.generation.polling.max_attempts = max_attempts;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
