//! Lens Core - landmark recognition pipeline with a content-hash result cache
//!
//! This crate turns an image into an enriched landmark analysis: what the
//! picture shows, a short historical description, historic photos of the
//! place and related events.
//!
//! # Features
//!
//! - One combined landmark + web-entity detection call per image
//! - Deterministic merge and ranking of landmark candidates
//! - Concurrent, individually bounded enrichment (description, photos, events)
//! - SHA-256 keyed result cache with a 24 h TTL and background refresh
//! - Mock upstream clients for offline use and testing
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use lens_core::{
//!     AnalysisCache, ImageHandle, MockDescriber, MockImageSearch, MockVision, Orchestrator,
//!     OrchestratorConfig, DEFAULT_CACHE_TTL,
//! };
//!
//! # async fn example() -> lens_core::Result<()> {
//! let orchestrator = Orchestrator::new(
//!     Arc::new(MockVision::default()),
//!     Arc::new(MockDescriber::default()),
//!     Arc::new(MockImageSearch::default()),
//!     AnalysisCache::in_memory(DEFAULT_CACHE_TTL),
//!     OrchestratorConfig::default(),
//! );
//!
//! let analysis = orchestrator
//!     .analyze(&ImageHandle::from_path("eiffel.jpg"))
//!     .await?;
//! if let Some(subject) = analysis.result.primary_subject() {
//!     println!("{} ({:.0}%)", subject.name, subject.confidence * 100.0);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod clients;
pub mod config;
pub mod error;
pub mod image;
pub mod merge;
pub mod model;
pub mod orchestrator;
pub mod title;

// Re-export main types for convenience
pub use cache::{cache_key, AnalysisCache, FileStore, KeyValueStore, MemoryStore, CACHE_KEY_PREFIX};
pub use clients::{
    AnnotationLocation, Describer, GeminiDescriber, GoogleImageSearch, GoogleVisionClient,
    ImageSearch, LandmarkAnnotation, MockDescriber, MockImageSearch, MockVision, VisionClient,
    VisionDetections, VisionImage, WebEntity,
};
pub use config::{
    CacheConfig, GeminiConfig, HttpConfig, LensConfig, OrchestratorConfig, SearchConfig,
    VisionConfig, DEFAULT_CACHE_TTL,
};
pub use error::{
    truncate_message, AnalysisError, CacheIoError, ConfigError, HashError, Result,
    SearchApiError, VisionApiError,
};
pub use image::{hash, ContentHash, ImageHandle};
pub use merge::merge_candidates;
pub use model::{
    CandidateSource, EnrichedResult, Hemisphere, HistoricPhoto, LandmarkCandidate,
    LandmarkEvent, LatLng, WebEntityCandidate,
};
pub use orchestrator::{
    Analysis, AnalysisState, BackgroundRefresh, Orchestrator, RefreshListener, ResultOrigin,
};
pub use title::clean_title;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// End to end: analyze a file, persist to disk, serve the second call from cache.
    #[tokio::test]
    async fn test_full_analysis_workflow_with_file_cache() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let image_path = dir.path().join("tower.jpg");
        std::fs::write(&image_path, b"pretend jpeg bytes").expect("Failed to write image");

        let cache_config = CacheConfig {
            dir: Some(dir.path().join("cache")),
            ..Default::default()
        };
        let cache = AnalysisCache::from_config(&cache_config).expect("Failed to open cache");

        let vision = Arc::new(MockVision::new(VisionDetections {
            landmarks: vec![LandmarkAnnotation {
                description: "Tower Bridge".into(),
                score: 0.88,
                ..Default::default()
            }],
            web_entities: vec![WebEntity {
                description: "tower bridge".into(),
                score: 0.91,
                ..Default::default()
            }],
        }));
        let orchestrator = Orchestrator::new(
            vision.clone(),
            Arc::new(MockDescriber::new(Some("Opened in 1894.".into()))),
            Arc::new(MockImageSearch::default()),
            cache,
            OrchestratorConfig::default(),
        );
        let image = ImageHandle::from_path(&image_path);

        // Step 1: Fresh analysis goes to the vision service
        let first = orchestrator.analyze(&image).await.expect("First analysis failed");
        assert_eq!(first.origin, ResultOrigin::Fresh);
        let subject = first.result.primary_subject().expect("No subject");
        assert_eq!(subject.name, "Tower Bridge");
        assert!(subject.web_entity_match);
        assert!((subject.confidence - 0.91).abs() < f32::EPSILON);
        assert!(first.result.historic_photos.is_empty(), "No photos found");

        // Step 2: Same bytes are served from the on-disk cache
        let second = orchestrator.analyze(&image).await.expect("Second analysis failed");
        assert_eq!(second.origin, ResultOrigin::Cache);
        assert_eq!(second.result, first.result);

        second.refresh.expect("Refresh should be scheduled").wait().await;
        assert_eq!(vision.calls(), 2);

        // Step 3: A different cache instance over the same directory sees the entry
        let reopened = AnalysisCache::from_config(&cache_config).expect("Failed to reopen cache");
        let hash = hash(&image).await.expect("Failed to hash image");
        assert!(reopened.get(&hash).await.is_some());
    }
}
