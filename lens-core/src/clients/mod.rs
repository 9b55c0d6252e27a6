//! Upstream services used by the analysis pipeline.
//!
//! Three capabilities, each behind a trait so the orchestrator can run
//! against real Google endpoints or the in-process mocks:
//!
//! - [`VisionClient`] - landmark and web-entity detection (required)
//! - [`Describer`] - short generated description of a landmark (optional)
//! - [`ImageSearch`] - historic photos and events for a landmark (optional)
//!
//! All implementations must be thread-safe (`Send + Sync`).

mod gemini;
mod http_client;
mod mock;
mod search;
mod vision;

pub use gemini::{description_prompt, GeminiDescriber};
pub use http_client::{is_transient_error, is_transient_status, HttpFailure, UpstreamHttpClient};
pub use mock::{MockDescriber, MockImageSearch, MockVision};
pub use search::GoogleImageSearch;
pub use vision::GoogleVisionClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{SearchApiError, VisionApiError};
use crate::model::{HistoricPhoto, LandmarkCandidate, LandmarkEvent, LatLng, WebEntityCandidate};

/// Image payload of a detection request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisionImage {
    /// Base64-encoded image bytes.
    Content(String),
    /// Publicly reachable image URI fetched by the vision service.
    Uri(String),
}

/// Landmark annotation as returned by the vision service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandmarkAnnotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mid: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<AnnotationLocation>,
}

impl LandmarkAnnotation {
    /// First reported position, if any.
    pub fn position(&self) -> Option<LatLng> {
        self.locations.iter().find_map(|l| l.lat_lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationLocation {
    #[serde(default)]
    pub lat_lng: Option<LatLng>,
}

/// Web entity as returned by the vision service.
///
/// Scores are relevance weights and are not bounded to `[0, 1]` upstream.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub score: f32,
}

/// Raw output of one detection call, in upstream order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisionDetections {
    pub landmarks: Vec<LandmarkAnnotation>,
    pub web_entities: Vec<WebEntity>,
}

impl VisionDetections {
    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty() && self.web_entities.is_empty()
    }

    /// Landmark candidates in upstream order; unnamed annotations are dropped.
    pub fn landmark_candidates(&self) -> Vec<LandmarkCandidate> {
        self.landmarks
            .iter()
            .filter_map(|a| LandmarkCandidate::from_landmark(&a.description, a.score, a.position()))
            .collect()
    }

    /// Web-entity candidates in upstream order; unnamed entities are dropped.
    pub fn web_entity_candidates(&self) -> Vec<WebEntityCandidate> {
        self.web_entities
            .iter()
            .filter_map(|e| WebEntityCandidate::new(&e.description, e.score))
            .collect()
    }
}

/// Landmark and web-entity detection.
#[async_trait]
pub trait VisionClient: Send + Sync {
    async fn detect_landmarks_and_entities(
        &self,
        image: &VisionImage,
    ) -> Result<VisionDetections, VisionApiError>;
}

/// Generated text about a landmark.
///
/// Never fails: any upstream problem yields `None`.
#[async_trait]
pub trait Describer: Send + Sync {
    async fn describe_landmark(&self, name: &str) -> Option<String>;
}

/// Image search for enrichment.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    /// Historic photos of `subject`. An empty subject runs the generic
    /// historic-photo query. Zero results is an error.
    async fn search_historic_photos(&self, subject: &str)
        -> Result<Vec<HistoricPhoto>, SearchApiError>;

    /// Event items for the landmark `name`, kept as raw upstream objects.
    async fn search_landmark_events(&self, name: &str)
        -> Result<Vec<LandmarkEvent>, SearchApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_skip_blank_names() {
        let detections = VisionDetections {
            landmarks: vec![
                LandmarkAnnotation {
                    description: "Eiffel Tower".into(),
                    score: 0.93,
                    ..Default::default()
                },
                LandmarkAnnotation {
                    description: "   ".into(),
                    score: 0.5,
                    ..Default::default()
                },
            ],
            web_entities: vec![
                WebEntity {
                    description: String::new(),
                    score: 0.7,
                    ..Default::default()
                },
                WebEntity {
                    description: "Paris".into(),
                    score: 0.6,
                    ..Default::default()
                },
            ],
        };

        let landmarks = detections.landmark_candidates();
        assert_eq!(landmarks.len(), 1);
        assert_eq!(landmarks[0].name, "Eiffel Tower");

        let entities = detections.web_entity_candidates();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name, "Paris");
    }

    #[test]
    fn test_annotation_position_and_missing_fields() {
        let annotation: LandmarkAnnotation = serde_json::from_value(serde_json::json!({
            "mid": "/m/02j81",
            "description": "Eiffel Tower",
            "score": 0.93,
            "locations": [{ "latLng": { "latitude": 48.858461, "longitude": 2.294351 } }]
        }))
        .unwrap();
        let position = annotation.position().unwrap();
        assert_eq!(position.latitude, 48.858461);

        let bare: WebEntity = serde_json::from_value(serde_json::json!({ "entityId": "/m/05qtj" }))
            .unwrap();
        assert_eq!(bare.description, "");
        assert_eq!(bare.score, 0.0);
    }

    #[test]
    fn test_empty_detections() {
        assert!(VisionDetections::default().is_empty());
    }
}
