//! Landmark descriptions from the Gemini `generateContent` endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::http_client::{HttpFailure, UpstreamHttpClient};
use super::Describer;
use crate::config::{GeminiConfig, HttpConfig};

const SERVICE: &str = "gemini";

/// Prompt sent for a landmark name.
pub fn description_prompt(name: &str) -> String {
    format!(
        "Provide a brief historical overview and 2-3 interesting facts about {name} in 3-5 sentences. Output a standard format text."
    )
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first part of the first candidate, if non-blank.
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

/// Describer backed by a Gemini model.
pub struct GeminiDescriber {
    http: UpstreamHttpClient,
    config: GeminiConfig,
}

impl GeminiDescriber {
    #[instrument(level = "debug", skip_all, fields(model = %config.model))]
    pub fn new(config: GeminiConfig, http: HttpConfig) -> Result<Self, HttpFailure> {
        let http = UpstreamHttpClient::new(http)?;
        info!("Gemini describer created");
        Ok(Self { http, config })
    }
}

#[async_trait]
impl Describer for GeminiDescriber {
    #[instrument(level = "debug", skip(self))]
    async fn describe_landmark(&self, name: &str) -> Option<String> {
        if self.config.api_key.is_empty() {
            debug!("Gemini API key not configured, skipping description");
            return None;
        }

        let prompt = description_prompt(name);
        let body = GenerateRequest {
            contents: [Content {
                parts: [RequestPart { text: &prompt }],
            }],
        };
        let url = self.config.generate_url();

        let response: GenerateResponse = match self
            .http
            .send_json(SERVICE, |client| {
                client
                    .post(&url)
                    .query(&[("key", self.config.api_key.as_str())])
                    .json(&body)
            })
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Landmark description failed");
                return None;
            }
        };

        let text = response.first_text();
        if text.is_none() {
            warn!("Gemini response contained no text");
        }
        text
    }
}
