//! In-process upstream mocks.
//!
//! Deterministic stand-ins for the Google services, used by tests and for
//! running the server without credentials. Each mock counts its calls and
//! can be given an artificial latency.
//! WARNING: Do not use in production - responses are canned!

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use super::{Describer, ImageSearch, VisionClient, VisionDetections, VisionImage};
use crate::error::{SearchApiError, VisionApiError};
use crate::model::{HistoricPhoto, LandmarkEvent};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn simulate_latency(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Mock vision client returning canned detections or a canned failure.
pub struct MockVision {
    response: Mutex<Result<VisionDetections, String>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockVision {
    pub fn new(detections: VisionDetections) -> Self {
        Self {
            response: Mutex::new(Ok(detections)),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every call fails with [`VisionApiError::Upstream`] carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Mutex::new(Err(message.into())),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Replace the canned detections for subsequent calls.
    pub fn set_detections(&self, detections: VisionDetections) {
        *lock(&self.response) = Ok(detections);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockVision {
    fn default() -> Self {
        Self::new(VisionDetections::default())
    }
}

#[async_trait]
impl VisionClient for MockVision {
    async fn detect_landmarks_and_entities(
        &self,
        _image: &VisionImage,
    ) -> Result<VisionDetections, VisionApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        simulate_latency(self.delay).await;
        let response = lock(&self.response).clone();
        response.map_err(VisionApiError::Upstream)
    }
}

/// Mock describer returning a fixed description.
pub struct MockDescriber {
    description: Option<String>,
    delay: Duration,
    names: Mutex<Vec<String>>,
}

impl MockDescriber {
    pub fn new(description: Option<String>) -> Self {
        Self {
            description,
            delay: Duration::ZERO,
            names: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        lock(&self.names).len()
    }

    /// Landmark names requested so far, in call order.
    pub fn requested_names(&self) -> Vec<String> {
        lock(&self.names).clone()
    }
}

impl Default for MockDescriber {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl Describer for MockDescriber {
    async fn describe_landmark(&self, name: &str) -> Option<String> {
        lock(&self.names).push(name.to_string());
        simulate_latency(self.delay).await;
        self.description.clone()
    }
}

/// Mock image search with canned photos and events.
///
/// An empty photo list behaves like the real service: the search fails
/// with [`SearchApiError::NoResults`].
pub struct MockImageSearch {
    photos: Result<Vec<HistoricPhoto>, String>,
    generic_photos: Option<Vec<HistoricPhoto>>,
    events: Result<Vec<LandmarkEvent>, String>,
    delay: Duration,
    photo_queries: Mutex<Vec<String>>,
    event_queries: Mutex<Vec<String>>,
}

impl MockImageSearch {
    pub fn new(photos: Vec<HistoricPhoto>, events: Vec<LandmarkEvent>) -> Self {
        Self {
            photos: Ok(photos),
            generic_photos: None,
            events: Ok(events),
            delay: Duration::ZERO,
            photo_queries: Mutex::new(Vec::new()),
            event_queries: Mutex::new(Vec::new()),
        }
    }

    /// Both searches fail with [`SearchApiError::Request`] carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            photos: Err(message.clone()),
            events: Err(message),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Answer the generic (empty subject) photo query with `photos`,
    /// independently of the subject-specific response.
    pub fn with_generic_photos(mut self, photos: Vec<HistoricPhoto>) -> Self {
        self.generic_photos = Some(photos);
        self
    }

    /// Subjects passed to the photo search, in call order.
    pub fn photo_queries(&self) -> Vec<String> {
        lock(&self.photo_queries).clone()
    }

    /// Names passed to the event search, in call order.
    pub fn event_queries(&self) -> Vec<String> {
        lock(&self.event_queries).clone()
    }

    pub fn calls(&self) -> usize {
        lock(&self.photo_queries).len() + lock(&self.event_queries).len()
    }
}

impl Default for MockImageSearch {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

#[async_trait]
impl ImageSearch for MockImageSearch {
    async fn search_historic_photos(
        &self,
        subject: &str,
    ) -> Result<Vec<HistoricPhoto>, SearchApiError> {
        lock(&self.photo_queries).push(subject.to_string());
        simulate_latency(self.delay).await;
        let photos = match &self.generic_photos {
            Some(generic) if subject.is_empty() => Ok(generic),
            _ => self.photos.as_ref(),
        };
        match photos {
            Ok(photos) if photos.is_empty() => Err(SearchApiError::NoResults(subject.to_string())),
            Ok(photos) => Ok(photos.clone()),
            Err(message) => Err(SearchApiError::Request(message.clone())),
        }
    }

    async fn search_landmark_events(
        &self,
        name: &str,
    ) -> Result<Vec<LandmarkEvent>, SearchApiError> {
        lock(&self.event_queries).push(name.to_string());
        simulate_latency(self.delay).await;
        self.events
            .clone()
            .map_err(SearchApiError::Request)
    }
}
