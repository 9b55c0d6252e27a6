//! Image analysis handlers
//!
//! Handles POST /analyze (full pipeline on an uploaded image) and
//! POST /analyze-image (landmark detection proxy for a remote image).

use axum::{
    extract::{Multipart, State},
    Json,
};
use lens_core::{
    EnrichedResult, ImageHandle, LandmarkAnnotation, ResultOrigin, VisionClient, VisionImage,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::multipart::MultipartFields;
use crate::state::AppState;
use crate::validation::validate_image_uri;

/// Response for a full analysis
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    /// Whether the result was served from the cache or computed now
    pub origin: ResultOrigin,
    #[serde(flatten)]
    pub result: EnrichedResult,
}

/// Request body for the detection proxy
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeImageRequest {
    pub image_uri: String,
}

/// Analyze an uploaded image
///
/// Accepts multipart/form-data with:
/// - **file** (required): the image to analyze
///
/// Returns the ranked landmark candidates, web entities, description,
/// historic photos and events. A cached result is returned immediately and
/// refreshed in the background.
#[instrument(level = "debug", skip_all)]
pub async fn analyze_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let file = MultipartFields::parse(&mut multipart, state.max_file_size)
        .await?
        .require_file()?;

    info!(
        size = file.data.len(),
        file_name = file.file_name.as_deref().unwrap_or("-"),
        "Analyzing uploaded image"
    );

    let analysis = state
        .orchestrator
        .analyze(&ImageHandle::from_bytes(file.data))
        .await?;

    // Dropping the refresh handle detaches the task.
    Ok(Json(AnalyzeResponse {
        origin: analysis.origin,
        result: analysis.result,
    }))
}

/// Detect landmarks in a remote image
///
/// Accepts JSON `{"imageUri": "..."}` and returns the vision service's
/// landmark annotations unchanged.
#[instrument(level = "debug", skip_all)]
pub async fn analyze_image_handler(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeImageRequest>,
) -> Result<Json<Vec<LandmarkAnnotation>>, ApiError> {
    validate_image_uri(&request.image_uri)?;

    let detections = state
        .orchestrator
        .vision()
        .detect_landmarks_and_entities(&VisionImage::Uri(request.image_uri.trim().to_string()))
        .await?;

    Ok(Json(detections.landmarks))
}
