//! Analysis orchestration.
//!
//! One [`Orchestrator::analyze`] call takes an image through
//! `Idle -> Hashing -> CacheCheck -> {CacheHitFastPath | FullAnalysis} -> Done`.
//!
//! On a cache hit the cached result is returned without touching the
//! network and a [`BackgroundRefresh`] re-runs the full analysis to update
//! the cache. Full analysis makes one vision call, merges its candidates,
//! then enriches the primary subject with a description, historic photos
//! and events concurrently. Only an unreadable image or a vision failure
//! fails the call; every enrichment degrades to an empty value.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, instrument, warn, Instrument};

use crate::cache::AnalysisCache;
use crate::clients::{
    Describer, GeminiDescriber, GoogleImageSearch, GoogleVisionClient, ImageSearch, VisionClient,
    VisionImage,
};
use crate::config::{LensConfig, OrchestratorConfig};
use crate::error::{ConfigError, Result, VisionApiError};
use crate::image::{load, ContentHash, ImageHandle, LoadedImage};
use crate::merge::{has_landmark_annotation, merge_candidates};
use crate::model::{EnrichedResult, HistoricPhoto, LandmarkEvent};

/// Per-request pipeline state, logged at every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisState {
    Idle,
    Hashing,
    CacheCheck,
    CacheHitFastPath,
    FullAnalysis,
    Done,
}

impl std::fmt::Display for AnalysisState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Hashing => "hashing",
            Self::CacheCheck => "cache_check",
            Self::CacheHitFastPath => "cache_hit_fast_path",
            Self::FullAnalysis => "full_analysis",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

fn transition(state: &mut AnalysisState, next: AnalysisState) {
    debug!(from = %state, to = %next, "Analysis state transition");
    *state = next;
}

/// Where an [`Analysis`] result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultOrigin {
    Cache,
    Fresh,
}

/// Receives the result of a background refresh.
///
/// Not called when the refresh was cancelled before it finished.
pub trait RefreshListener: Send + Sync {
    fn on_refresh(&self, hash: &ContentHash, result: &EnrichedResult);
}

/// Handle to a detached cache refresh.
///
/// Dropping the handle detaches the task; it still runs to completion.
#[derive(Debug)]
pub struct BackgroundRefresh {
    handle: JoinHandle<()>,
    token: CancellationToken,
}

impl BackgroundRefresh {
    /// Suppress the listener notification. The cache write still happens.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the refresh to finish.
    pub async fn wait(self) {
        if let Err(e) = self.handle.await {
            warn!(error = %e, "Background refresh task aborted");
        }
    }
}

/// Outcome of one `analyze` call.
#[derive(Debug)]
pub struct Analysis {
    pub result: EnrichedResult,
    pub origin: ResultOrigin,
    /// Present on a cache hit.
    pub refresh: Option<BackgroundRefresh>,
}

/// Drives hashing, caching, detection and enrichment.
#[derive(Clone)]
pub struct Orchestrator {
    vision: Arc<dyn VisionClient>,
    describer: Arc<dyn Describer>,
    search: Arc<dyn ImageSearch>,
    cache: AnalysisCache,
    config: OrchestratorConfig,
    shutdown: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        vision: Arc<dyn VisionClient>,
        describer: Arc<dyn Describer>,
        search: Arc<dyn ImageSearch>,
        cache: AnalysisCache,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            vision,
            describer,
            search,
            cache,
            config,
            shutdown: CancellationToken::new(),
        }
    }

    /// Wire the Google clients and the cache described by `config`.
    #[instrument(level = "debug", skip_all)]
    pub fn from_config(config: &LensConfig) -> std::result::Result<Self, ConfigError> {
        let vision = GoogleVisionClient::new(config.vision.clone(), config.http.clone())
            .map_err(|e| ConfigError::Init {
                component: "vision client",
                message: e.to_string(),
            })?;
        let describer = GeminiDescriber::new(config.gemini.clone(), config.http.clone())
            .map_err(|e| ConfigError::Init {
                component: "gemini describer",
                message: e.to_string(),
            })?;
        let search = GoogleImageSearch::new(config.search.clone(), config.http.clone())
            .map_err(|e| ConfigError::Init {
                component: "image search",
                message: e.to_string(),
            })?;
        let cache = AnalysisCache::from_config(&config.cache).map_err(|e| ConfigError::Init {
            component: "analysis cache",
            message: e.to_string(),
        })?;

        info!("Analysis orchestrator initialized");
        Ok(Self::new(
            Arc::new(vision),
            Arc::new(describer),
            Arc::new(search),
            cache,
            config.orchestrator.clone(),
        ))
    }

    pub fn vision(&self) -> &Arc<dyn VisionClient> {
        &self.vision
    }

    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    /// Cancel every outstanding refresh. Running tasks finish their cache
    /// write but no longer notify listeners.
    pub fn shutdown(&self) {
        info!("Cancelling background refreshes");
        self.shutdown.cancel();
    }

    /// Analyze an image, serving from cache when possible.
    pub async fn analyze(&self, image: &ImageHandle) -> Result<Analysis> {
        self.run(image, None).await
    }

    /// Like [`analyze`](Self::analyze), notifying `listener` when a
    /// background refresh completes.
    pub async fn analyze_with_listener(
        &self,
        image: &ImageHandle,
        listener: Arc<dyn RefreshListener>,
    ) -> Result<Analysis> {
        self.run(image, Some(listener)).await
    }

    #[instrument(level = "debug", skip_all)]
    async fn run(
        &self,
        image: &ImageHandle,
        listener: Option<Arc<dyn RefreshListener>>,
    ) -> Result<Analysis> {
        let mut state = AnalysisState::Idle;

        transition(&mut state, AnalysisState::Hashing);
        let loaded = load(image).await;

        if let Ok(loaded) = &loaded {
            transition(&mut state, AnalysisState::CacheCheck);
            if let Some(cached) = self.cache.get(&loaded.hash).await {
                transition(&mut state, AnalysisState::CacheHitFastPath);
                let refresh = self.spawn_refresh(loaded.clone(), listener);
                transition(&mut state, AnalysisState::Done);
                return Ok(Analysis {
                    result: cached,
                    origin: ResultOrigin::Cache,
                    refresh: Some(refresh),
                });
            }
        }

        transition(&mut state, AnalysisState::FullAnalysis);
        let loaded = loaded?;
        let result = self.full_analysis(&loaded).await?;

        transition(&mut state, AnalysisState::Done);
        Ok(Analysis {
            result,
            origin: ResultOrigin::Fresh,
            refresh: None,
        })
    }

    fn spawn_refresh(
        &self,
        loaded: LoadedImage,
        listener: Option<Arc<dyn RefreshListener>>,
    ) -> BackgroundRefresh {
        let token = self.shutdown.child_token();
        let task_token = token.clone();
        let this = self.clone();
        let span = info_span!("background_refresh", hash = %loaded.hash);

        let handle = tokio::spawn(
            async move {
                match this.full_analysis(&loaded).await {
                    Ok(result) => {
                        if task_token.is_cancelled() {
                            debug!("Refresh cancelled, listener not notified");
                            return;
                        }
                        if let Some(listener) = listener {
                            listener.on_refresh(&loaded.hash, &result);
                        }
                        debug!("Background refresh completed");
                    }
                    Err(e) => warn!(error = %e, "Background refresh failed"),
                }
            }
            .instrument(span),
        );

        BackgroundRefresh { handle, token }
    }

    /// Detect, merge, enrich and cache.
    #[instrument(level = "debug", skip_all, fields(hash = %loaded.hash))]
    async fn full_analysis(
        &self,
        loaded: &LoadedImage,
    ) -> std::result::Result<EnrichedResult, VisionApiError> {
        let image = VisionImage::Content(loaded.to_base64());

        let (detections, generic_photos) = tokio::join!(
            self.vision.detect_landmarks_and_entities(&image),
            self.prefetch_generic_photos(),
        );
        let detections = detections?;

        let mut web_entities = detections.web_entity_candidates();
        let landmarks = merge_candidates(detections.landmark_candidates(), &web_entities);
        web_entities.truncate(self.config.max_result_web_entities);

        let mut result = EnrichedResult {
            landmarks,
            web_entities,
            ..Default::default()
        };

        match result.primary_subject().cloned() {
            None => debug!("No candidates detected, skipping enrichment"),
            Some(primary) => {
                if !has_landmark_annotation(&result.landmarks)
                    && primary.confidence < self.config.low_confidence_threshold
                {
                    info!(
                        subject = %primary.name,
                        confidence = primary.confidence,
                        "Subject identified only by web entities with low confidence"
                    );
                    result.low_confidence = true;
                }

                let (description, photos, events) = tokio::join!(
                    self.describe(&primary.name),
                    self.historic_photos(&primary.name, generic_photos),
                    self.landmark_events(&primary.name),
                );
                result.description = description;
                result.historic_photos = photos;
                result.landmark_events = events;
            }
        }

        self.cache.put(&loaded.hash, &result).await;
        Ok(result)
    }

    /// Run `fut` within the enrichment budget; `None` on timeout.
    async fn within_budget<T>(&self, what: &'static str, fut: impl Future<Output = T>) -> Option<T> {
        match tokio::time::timeout(self.config.enrichment_timeout, fut).await {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(
                    enrichment = what,
                    budget_ms = self.config.enrichment_timeout.as_millis() as u64,
                    "Enrichment call timed out"
                );
                None
            }
        }
    }

    async fn prefetch_generic_photos(&self) -> Option<Vec<HistoricPhoto>> {
        if !self.config.prefetch_generic_photos {
            return None;
        }
        match self
            .within_budget("generic_photos", self.search.search_historic_photos(""))
            .await?
        {
            Ok(photos) => Some(photos),
            Err(e) => {
                warn!(error = %e, "Generic historic photo search failed");
                None
            }
        }
    }

    async fn describe(&self, name: &str) -> Option<String> {
        self.within_budget("description", self.describer.describe_landmark(name))
            .await
            .flatten()
    }

    async fn historic_photos(
        &self,
        name: &str,
        fallback: Option<Vec<HistoricPhoto>>,
    ) -> Vec<HistoricPhoto> {
        match self
            .within_budget("historic_photos", self.search.search_historic_photos(name))
            .await
        {
            Some(Ok(photos)) => photos,
            Some(Err(e)) => {
                warn!(error = %e, subject = %name, "Historic photo search failed");
                fallback.unwrap_or_default()
            }
            None => fallback.unwrap_or_default(),
        }
    }

    async fn landmark_events(&self, name: &str) -> Vec<LandmarkEvent> {
        match self
            .within_budget("events", self.search.search_landmark_events(name))
            .await
        {
            Some(Ok(events)) => events,
            Some(Err(e)) => {
                warn!(error = %e, subject = %name, "Landmark event search failed");
                Vec::new()
            }
            None => Vec::new(),
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
