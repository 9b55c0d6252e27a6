//! Google Cloud Vision client.
//!
//! One `images:annotate` call per image, requesting LANDMARK_DETECTION and
//! WEB_DETECTION together.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::http_client::UpstreamHttpClient;
use super::{LandmarkAnnotation, VisionClient, VisionDetections, VisionImage, WebEntity};
use crate::config::{HttpConfig, VisionConfig};
use crate::error::{truncate_message, VisionApiError};

const SERVICE: &str = "vision";

#[derive(Debug, Serialize)]
struct AnnotateRequest<'a> {
    requests: [AnnotateImageRequest<'a>; 1],
}

#[derive(Debug, Serialize)]
struct AnnotateImageRequest<'a> {
    image: RequestImage<'a>,
    features: [Feature; 2],
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestImage<'a> {
    Content { content: &'a str },
    Source { source: ImageSource<'a> },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageSource<'a> {
    image_uri: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    max_results: u32,
}

#[derive(Debug, Default, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    landmark_annotations: Vec<LandmarkAnnotation>,
    #[serde(default)]
    web_detection: Option<WebDetection>,
    #[serde(default)]
    error: Option<UpstreamStatus>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebDetection {
    #[serde(default)]
    web_entities: Vec<WebEntity>,
}

#[derive(Debug, Default, Deserialize)]
struct UpstreamStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

impl<'a> AnnotateRequest<'a> {
    fn new(image: &'a VisionImage, config: &VisionConfig) -> Self {
        let image = match image {
            VisionImage::Content(content) => RequestImage::Content { content },
            VisionImage::Uri(uri) => RequestImage::Source {
                source: ImageSource { image_uri: uri },
            },
        };
        Self {
            requests: [AnnotateImageRequest {
                image,
                features: [
                    Feature {
                        kind: "LANDMARK_DETECTION",
                        max_results: config.max_landmarks,
                    },
                    Feature {
                        kind: "WEB_DETECTION",
                        max_results: config.max_web_entities,
                    },
                ],
            }],
        }
    }
}

/// Turn the batch response into detections, surfacing a per-image error.
fn into_detections(response: AnnotateResponse) -> Result<VisionDetections, VisionApiError> {
    let Some(first) = response.responses.into_iter().next() else {
        debug!("Vision response contained no per-image result");
        return Ok(VisionDetections::default());
    };

    if let Some(status) = first.error.filter(|s| s.code != 0 || !s.message.is_empty()) {
        return Err(VisionApiError::Upstream(truncate_message(&status.message)));
    }

    Ok(VisionDetections {
        landmarks: first.landmark_annotations,
        web_entities: first
            .web_detection
            .map(|w| w.web_entities)
            .unwrap_or_default(),
    })
}

/// Vision client backed by the Google Cloud Vision REST API.
pub struct GoogleVisionClient {
    http: UpstreamHttpClient,
    config: VisionConfig,
}

impl GoogleVisionClient {
    #[instrument(level = "debug", skip_all, fields(api_url = %config.api_url))]
    pub fn new(config: VisionConfig, http: HttpConfig) -> Result<Self, VisionApiError> {
        if config.api_key.is_empty() {
            return Err(VisionApiError::Client("vision API key is empty".into()));
        }
        let http = UpstreamHttpClient::new(http).map_err(|e| VisionApiError::Client(e.to_string()))?;
        info!("Vision client created");
        Ok(Self { http, config })
    }
}

#[async_trait]
impl VisionClient for GoogleVisionClient {
    #[instrument(level = "debug", skip_all, fields(
        by_uri = matches!(image, VisionImage::Uri(_))
    ))]
    async fn detect_landmarks_and_entities(
        &self,
        image: &VisionImage,
    ) -> Result<VisionDetections, VisionApiError> {
        let body = AnnotateRequest::new(image, &self.config);

        let response: AnnotateResponse = self
            .http
            .send_json(SERVICE, |client| {
                client
                    .post(&self.config.api_url)
                    .query(&[("key", self.config.api_key.as_str())])
                    .json(&body)
            })
            .await?;

        let detections = into_detections(response).inspect_err(|e| {
            warn!(error = %e, "Vision API reported an error for the image");
        })?;
        debug!(
            landmarks = detections.landmarks.len(),
            web_entities = detections.web_entities.len(),
            "Vision detection completed"
        );
        Ok(detections)
    }
}
