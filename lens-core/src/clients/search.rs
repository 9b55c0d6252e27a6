//! Google Custom Search (image mode) client.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::http_client::{HttpFailure, UpstreamHttpClient};
use super::ImageSearch;
use crate::config::{HttpConfig, SearchConfig};
use crate::error::SearchApiError;
use crate::model::{HistoricPhoto, LandmarkEvent};
use crate::title::clean_title;

const SERVICE: &str = "search";

/// Upstream caps `num` at 10.
const MAX_PAGE_SIZE: u32 = 10;

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhotoItem {
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    image: PhotoImage,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhotoImage {
    #[serde(default)]
    thumbnail_link: String,
    #[serde(default)]
    context_link: String,
}

impl From<PhotoItem> for HistoricPhoto {
    fn from(item: PhotoItem) -> Self {
        Self {
            url: item.link,
            thumbnail_url: item.image.thumbnail_link,
            title: clean_title(&item.title),
            context_link: item.image.context_link,
        }
    }
}

/// Map raw items to photos, skipping any without a link.
fn photos_from_items(items: Vec<serde_json::Value>) -> Vec<HistoricPhoto> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<PhotoItem>(item) {
            Ok(photo) => Some(photo.into()),
            Err(e) => {
                warn!(error = %e, "Skipping malformed image search item");
                None
            }
        })
        .collect()
}

/// Join a subject and a query suffix, tolerating an empty subject.
fn build_query(subject: &str, suffix: &str) -> String {
    format!("{} {}", subject.trim(), suffix.trim())
        .trim()
        .to_string()
}

/// Image search backed by a Programmable Search Engine.
pub struct GoogleImageSearch {
    http: UpstreamHttpClient,
    config: SearchConfig,
}

impl GoogleImageSearch {
    #[instrument(level = "debug", skip_all, fields(api_url = %config.api_url))]
    pub fn new(config: SearchConfig, http: HttpConfig) -> Result<Self, HttpFailure> {
        let http = UpstreamHttpClient::new(http)?;
        info!("Image search client created");
        Ok(Self { http, config })
    }

    async fn search(&self, query: &str, num: u32) -> Result<Vec<serde_json::Value>, SearchApiError> {
        if self.config.engine_id.is_empty() {
            return Err(SearchApiError::Client("search engine id is not configured".into()));
        }

        let num = num.clamp(1, MAX_PAGE_SIZE).to_string();
        let mut params: Vec<(&str, &str)> = vec![
            ("key", self.config.api_key.as_str()),
            ("cx", self.config.engine_id.as_str()),
            ("q", query),
            ("searchType", "image"),
            ("num", num.as_str()),
            ("imgType", "photo"),
        ];
        if let Some(rights) = &self.config.rights {
            params.push(("rights", rights.as_str()));
        }

        let response: SearchResponse = self
            .http
            .send_json(SERVICE, |client| {
                client.get(&self.config.api_url).query(&params)
            })
            .await?;

        debug!(items = response.items.len(), "Image search completed");
        Ok(response.items)
    }
}

#[async_trait]
impl ImageSearch for GoogleImageSearch {
    #[instrument(level = "debug", skip(self))]
    async fn search_historic_photos(
        &self,
        subject: &str,
    ) -> Result<Vec<HistoricPhoto>, SearchApiError> {
        let query = build_query(subject, &self.config.historic_query_suffix);
        let items = self.search(&query, self.config.max_photos).await?;
        let photos = photos_from_items(items);
        if photos.is_empty() {
            return Err(SearchApiError::NoResults(query));
        }
        Ok(photos)
    }

    #[instrument(level = "debug", skip(self))]
    async fn search_landmark_events(
        &self,
        name: &str,
    ) -> Result<Vec<LandmarkEvent>, SearchApiError> {
        let query = build_query(name, &self.config.events_query_suffix);
        let items = self.search(&query, self.config.max_events).await?;
        Ok(items.into_iter().map(LandmarkEvent).collect())
    }
}
