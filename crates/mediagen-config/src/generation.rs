use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Top-level generation configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    /// Generation provider configurations keyed by name
    #[serde(default)]
    pub providers: IndexMap<String, GenerationProviderConfig>,
    /// Polling behavior shared by all providers
    #[serde(default)]
    pub polling: PollingConfig,
}

/// Configuration for a single generation provider
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationProviderConfig {
    /// Provider type
    #[serde(rename = "type")]
    pub provider_type: GenerationProviderType,
    /// API key
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Supported image sizes (width*height strings)
    #[serde(default = "default_image_sizes")]
    pub image_sizes: Vec<String>,
    /// Supported video resolutions (width*height strings)
    #[serde(default = "default_video_resolutions")]
    pub video_resolutions: Vec<String>,
    /// Alternate (model, endpoint) pairs tried in order when the primary
    /// model is rejected as not provisioned
    #[serde(default)]
    pub fallbacks: Vec<FallbackTarget>,
}

/// One alternate submission target in the fallback sequence
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FallbackTarget {
    /// Model identifier to substitute
    pub model: String,
    /// Endpoint path override (defaults to the primary synthesis path)
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Supported generation providers
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationProviderType {
    /// `DashScope`-style asynchronous synthesis API
    Dashscope,
}

/// Poll loop timing bounds
///
/// The in-process loop is bounded by attempt count; handles resumed from
/// the task store are additionally bounded by a wall-clock staleness window.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollingConfig {
    /// Seconds between status checks
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
    /// Maximum status checks before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Minutes after submission beyond which a persisted task is stale
    #[serde(default = "default_staleness_minutes")]
    pub staleness_minutes: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval_seconds(),
            max_attempts: default_max_attempts(),
            staleness_minutes: default_staleness_minutes(),
        }
    }
}

fn default_interval_seconds() -> u64 {
    5
}

fn default_max_attempts() -> u32 {
    60
}

fn default_staleness_minutes() -> u64 {
    30
}

fn default_image_sizes() -> Vec<String> {
    ["1024*1024", "720*1280", "1280*720", "768*1152"]
        .map(str::to_owned)
        .to_vec()
}

fn default_video_resolutions() -> Vec<String> {
    ["1280*720", "720*1280", "960*960"].map(str::to_owned).to_vec()
}
