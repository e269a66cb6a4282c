use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let expanded = crate::env::expand_env(&raw)
            .map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if no providers are configured or a provider's
    /// settings are unusable
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.generation.providers.is_empty() {
            anyhow::bail!("at least one generation provider must be configured");
        }

        for (name, provider) in &self.generation.providers {
            if provider.image_sizes.is_empty() && provider.video_resolutions.is_empty() {
                anyhow::bail!("provider '{name}' must declare at least one supported size or resolution");
            }

            for fallback in &provider.fallbacks {
                if fallback.model.trim().is_empty() {
                    anyhow::bail!("provider '{name}' has a fallback with an empty model");
                }
            }
        }

        let polling = &self.generation.polling;
        if polling.max_attempts == 0 {
            anyhow::bail!("generation.polling.max_attempts must be greater than 0");
        }
        if polling.staleness_minutes == 0 {
            anyhow::bail!("generation.polling.staleness_minutes must be greater than 0");
        }

        Ok(())
    }
}
