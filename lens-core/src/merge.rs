//! Cross-referencing of landmark detections with web-entity detections.
//!
//! The two detectors run independently and often name the same place
//! differently ("Eiffel Tower" vs "Tour Eiffel, Paris"). Merging unions them
//! into one ranked list:
//!
//! 1. landmark candidates keep their order and position data;
//! 2. a web entity whose name contains, or is contained in, a landmark name
//!    (case-insensitive) boosts that landmark's confidence and marks it as
//!    corroborated;
//! 3. unmatched web entities are appended as positionless candidates;
//! 4. corroborated candidates rank first, then by descending confidence.
//!    Equal confidences keep insertion order.

use std::cmp::Ordering;

use crate::model::{CandidateSource, LandmarkCandidate, WebEntityCandidate};

/// Merge landmark and web-entity candidates into a ranked list.
///
/// Pure and deterministic: the same inputs always produce the same output.
pub fn merge_candidates(
    landmarks: Vec<LandmarkCandidate>,
    web_entities: &[WebEntityCandidate],
) -> Vec<LandmarkCandidate> {
    let landmark_count = landmarks.len();
    let mut merged = landmarks;

    for entity in web_entities {
        let matched = merged[..landmark_count]
            .iter()
            .position(|candidate| names_match(&candidate.name, &entity.name));

        match matched {
            Some(idx) => {
                let candidate = &mut merged[idx];
                candidate.confidence = candidate.confidence.max(entity.confidence);
                candidate.web_entity_match = true;
            }
            None => merged.push(LandmarkCandidate::from_web_entity(entity)),
        }
    }

    // Vec::sort_by is stable.
    merged.sort_by(rank_order);
    merged
}

/// Whether any candidate came from the landmark detector.
pub fn has_landmark_annotation(candidates: &[LandmarkCandidate]) -> bool {
    candidates
        .iter()
        .any(|c| c.source == CandidateSource::Landmark)
}

fn rank_order(a: &LandmarkCandidate, b: &LandmarkCandidate) -> Ordering {
    b.web_entity_match
        .cmp(&a.web_entity_match)
        .then_with(|| b.confidence.total_cmp(&a.confidence))
}

/// Case-insensitive containment in either direction. Blank names never match.
fn names_match(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}
