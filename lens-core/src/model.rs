//! Analysis result types.
//!
//! Everything here is serialized into the local cache, so field names follow
//! the camelCase layout the results screen reads.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Clamp an upstream confidence score into `[0, 1]`.
///
/// Out-of-range values are logged; NaN becomes 0.
pub fn normalize_confidence(raw: f32) -> f32 {
    if raw.is_nan() {
        warn!(score = raw, "Upstream confidence is NaN, using 0");
        return 0.0;
    }
    if !(0.0..=1.0).contains(&raw) {
        warn!(score = raw, "Upstream confidence outside [0, 1], clamping");
    }
    raw.clamp(0.0, 1.0)
}

/// Geographic position reported with a landmark annotation.
///
/// Upstream omits zero-valued coordinates, hence the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

/// Coarse location derived from the latitude sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Hemisphere {
    NorthernHemisphere,
    SouthernHemisphere,
    #[default]
    Unknown,
}

impl Hemisphere {
    pub fn from_position(position: Option<&LatLng>) -> Self {
        match position {
            Some(p) if p.latitude >= 0.0 => Self::NorthernHemisphere,
            Some(_) => Self::SouthernHemisphere,
            None => Self::Unknown,
        }
    }
}

impl std::fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NorthernHemisphere => write!(f, "Northern Hemisphere"),
            Self::SouthernHemisphere => write!(f, "Southern Hemisphere"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Which detector produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CandidateSource {
    Landmark,
    WebEntity,
}

/// One entry of the ranked landmark list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandmarkCandidate {
    pub name: String,
    pub country: Hemisphere,
    pub position: Option<LatLng>,
    pub confidence: f32,
    pub source: CandidateSource,
    pub web_entity_match: bool,
}

impl LandmarkCandidate {
    /// Candidate from a landmark annotation. Returns `None` for a blank name.
    pub fn from_landmark(name: &str, score: f32, position: Option<LatLng>) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            country: Hemisphere::from_position(position.as_ref()),
            position,
            confidence: normalize_confidence(score),
            source: CandidateSource::Landmark,
            web_entity_match: false,
        })
    }

    /// Candidate for a web entity that matched no landmark.
    pub fn from_web_entity(entity: &WebEntityCandidate) -> Self {
        Self {
            name: entity.name.clone(),
            country: Hemisphere::Unknown,
            position: None,
            confidence: entity.confidence,
            source: CandidateSource::WebEntity,
            web_entity_match: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebEntityCandidate {
    pub name: String,
    pub confidence: f32,
}

impl WebEntityCandidate {
    /// Returns `None` for a blank name.
    pub fn new(name: &str, score: f32) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            confidence: normalize_confidence(score),
        })
    }
}

/// Historic image of the landmark found by image search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricPhoto {
    pub url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub context_link: String,
}

/// Raw image-search item for an event at the landmark.
///
/// Kept as the upstream JSON object; the accessors read the fields the
/// results screen renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkEvent(pub serde_json::Value);

impl LandmarkEvent {
    pub fn title(&self) -> Option<&str> {
        self.0.get("title").and_then(|v| v.as_str())
    }

    pub fn thumbnail_link(&self) -> Option<&str> {
        self.0
            .get("image")
            .and_then(|image| image.get("thumbnailLink"))
            .and_then(|v| v.as_str())
    }

    pub fn display_link(&self) -> Option<&str> {
        self.0.get("displayLink").and_then(|v| v.as_str())
    }
}

/// Full output of one analysis.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedResult {
    /// Ranked candidates, see [`crate::merge::merge_candidates`].
    pub landmarks: Vec<LandmarkCandidate>,
    pub web_entities: Vec<WebEntityCandidate>,
    pub historic_photos: Vec<HistoricPhoto>,
    pub landmark_events: Vec<LandmarkEvent>,
    pub description: Option<String>,
    /// Set when only web entities identified the subject and the best of
    /// them scored below the confidence threshold.
    #[serde(default)]
    pub low_confidence: bool,
}

impl EnrichedResult {
    /// The top-ranked candidate used to drive enrichment queries.
    pub fn primary_subject(&self) -> Option<&LandmarkCandidate> {
        self.landmarks.first()
    }
}
