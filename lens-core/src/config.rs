//! Pipeline configuration.
//!
//! Built once at startup (defaults or environment) and handed to the clients
//! and the orchestrator. Nothing in the crate reads ambient global state.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_VISION_URL: &str = "https://vision.googleapis.com/v1/images:annotate";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// Default per-request HTTP timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Default maximum retry attempts for transient upstream errors.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Entries older than this are treated as absent.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Redacts a secret in `Debug` output.
fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "[UNSET]"
    } else {
        "[REDACTED]"
    }
}

fn env_duration_secs(name: &'static str) -> Result<Option<Duration>, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(None),
    }
}

/// Shared HTTP behaviour of every upstream client.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retry attempts for transient errors.
    pub max_retries: u32,
    /// Initial retry interval.
    pub initial_interval: Duration,
    /// Maximum retry interval.
    pub max_interval: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_HTTP_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            initial_interval: Duration::from_millis(200),
            max_interval: Duration::from_secs(2),
        }
    }
}

/// Vision annotation endpoint.
#[derive(Clone)]
pub struct VisionConfig {
    pub api_url: String,
    pub api_key: String,
    /// `maxResults` of the LANDMARK_DETECTION feature.
    pub max_landmarks: u32,
    /// `maxResults` of the WEB_DETECTION feature.
    pub max_web_entities: u32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_VISION_URL.to_string(),
            api_key: String::new(),
            max_landmarks: 3,
            max_web_entities: 3,
        }
    }
}

impl std::fmt::Debug for VisionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("max_landmarks", &self.max_landmarks)
            .field("max_web_entities", &self.max_web_entities)
            .finish()
    }
}

/// Generative-text endpoint used for landmark descriptions.
#[derive(Clone)]
pub struct GeminiConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
}

impl GeminiConfig {
    /// Full `generateContent` URL for the configured model.
    pub fn generate_url(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_key: String::new(),
        }
    }
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

/// Custom image-search endpoint used for historic photos and events.
#[derive(Clone)]
pub struct SearchConfig {
    pub api_url: String,
    pub api_key: String,
    /// Search engine id (`cx`).
    pub engine_id: String,
    /// Appended to the landmark name for historic photo queries.
    pub historic_query_suffix: String,
    /// Appended to the landmark name for event queries.
    pub events_query_suffix: String,
    /// `num` for historic photo queries.
    pub max_photos: u32,
    /// `num` for event queries.
    pub max_events: u32,
    /// Optional `rights` filter, e.g. `cc_publicdomain|cc_attribute|cc_sharealike`.
    pub rights: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_SEARCH_URL.to_string(),
            api_key: String::new(),
            engine_id: String::new(),
            historic_query_suffix: "historic photo".to_string(),
            events_query_suffix: "events".to_string(),
            max_photos: 10,
            max_events: 5,
            rights: None,
        }
    }
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("engine_id", &self.engine_id)
            .field("historic_query_suffix", &self.historic_query_suffix)
            .field("events_query_suffix", &self.events_query_suffix)
            .field("max_photos", &self.max_photos)
            .field("max_events", &self.max_events)
            .field("rights", &self.rights)
            .finish()
    }
}

/// Local result cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory for the file-backed store. `None` keeps entries in memory.
    pub dir: Option<PathBuf>,
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            ttl: DEFAULT_CACHE_TTL,
        }
    }
}

/// Orchestrator policy knobs.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Below this score a subject identified only by web entities is flagged
    /// as low confidence.
    pub low_confidence_threshold: f32,
    /// Upper bound on each enrichment call, independent of HTTP retries.
    pub enrichment_timeout: Duration,
    /// Maximum number of web entities kept in the result.
    pub max_result_web_entities: usize,
    /// Run a generic historic-photo search alongside the vision call, used
    /// when the subject-specific search comes back empty.
    pub prefetch_generic_photos: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            low_confidence_threshold: 0.8,
            enrichment_timeout: Duration::from_secs(20),
            max_result_web_entities: 4,
            prefetch_generic_photos: false,
        }
    }
}

/// Complete configuration of the analysis pipeline.
#[derive(Debug, Clone, Default)]
pub struct LensConfig {
    pub http: HttpConfig,
    pub vision: VisionConfig,
    pub gemini: GeminiConfig,
    pub search: SearchConfig,
    pub cache: CacheConfig,
    pub orchestrator: OrchestratorConfig,
}

impl LensConfig {
    /// Load configuration from environment variables.
    ///
    /// Required: `GOOGLE_VISION_API_KEY`.
    /// Optional: `GEMINI_API_KEY`, `SEARCH_API_KEY` (defaults to the vision
    /// key), `SEARCH_ENGINE_ID`, `VISION_API_URL`, `GEMINI_API_URL`,
    /// `GEMINI_MODEL`, `SEARCH_API_URL`, `SEARCH_RIGHTS`, `LENS_CACHE_DIR`,
    /// `LENS_CACHE_TTL_SECS`, `LENS_HTTP_TIMEOUT_SECS`,
    /// `LENS_PREFETCH_GENERIC_PHOTOS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        config.vision.api_key = std::env::var("GOOGLE_VISION_API_KEY")
            .map_err(|_| ConfigError::Missing("GOOGLE_VISION_API_KEY"))?;
        if let Ok(url) = std::env::var("VISION_API_URL") {
            config.vision.api_url = url;
        }

        config.gemini.api_key = std::env::var("GEMINI_API_KEY").unwrap_or_default();
        if let Ok(url) = std::env::var("GEMINI_API_URL") {
            config.gemini.base_url = url;
        }
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            config.gemini.model = model;
        }

        // The same Google key covers vision and custom search unless overridden.
        config.search.api_key =
            std::env::var("SEARCH_API_KEY").unwrap_or_else(|_| config.vision.api_key.clone());
        config.search.engine_id = std::env::var("SEARCH_ENGINE_ID").unwrap_or_default();
        if let Ok(url) = std::env::var("SEARCH_API_URL") {
            config.search.api_url = url;
        }
        config.search.rights = std::env::var("SEARCH_RIGHTS")
            .ok()
            .filter(|r| !r.trim().is_empty());

        config.cache.dir = std::env::var("LENS_CACHE_DIR").ok().map(PathBuf::from);
        if let Some(ttl) = env_duration_secs("LENS_CACHE_TTL_SECS")? {
            config.cache.ttl = ttl;
        }
        if let Some(timeout) = env_duration_secs("LENS_HTTP_TIMEOUT_SECS")? {
            config.http.timeout = timeout;
        }

        config.orchestrator.prefetch_generic_photos = std::env::var("LENS_PREFETCH_GENERIC_PHOTOS")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        if config.gemini.api_key.is_empty() {
            tracing::warn!("GEMINI_API_KEY not set, landmark descriptions will be empty");
        }
        if config.search.engine_id.is_empty() {
            tracing::warn!("SEARCH_ENGINE_ID not set, photo and event searches will fail");
        }

        Ok(config)
    }
}
