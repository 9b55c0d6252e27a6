//! Lens Server - REST API for landmark image analysis
//!
//! Exposes lens-core functionality via HTTP endpoints:
//! - POST /analyze - Full analysis of an uploaded image
//! - POST /analyze-image - Landmark detection for a remote image

use std::{net::SocketAddr, sync::Arc};

use lens_core::{
    AnalysisCache, AnnotationLocation, HistoricPhoto, LandmarkAnnotation, LatLng, LensConfig,
    MockDescriber, MockImageSearch, MockVision, Orchestrator, OrchestratorConfig,
    VisionDetections, WebEntity, DEFAULT_CACHE_TTL,
};
use lens_server::{create_router_with_config, AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Canned pipeline for running without Google credentials.
fn mock_orchestrator() -> Orchestrator {
    let detections = VisionDetections {
        landmarks: vec![LandmarkAnnotation {
            mid: Some("/m/02j81".into()),
            description: "Eiffel Tower".into(),
            score: 0.92,
            locations: vec![AnnotationLocation {
                lat_lng: Some(LatLng {
                    latitude: 48.858_461,
                    longitude: 2.294_351,
                }),
            }],
        }],
        web_entities: vec![WebEntity {
            entity_id: Some("/m/02j81".into()),
            description: "Eiffel Tower".into(),
            score: 1.2,
        }],
    };
    let photos = vec![HistoricPhoto {
        url: "https://upload.wikimedia.org/eiffel_1889.jpg".into(),
        thumbnail_url: "https://upload.wikimedia.org/eiffel_1889_thumb.jpg".into(),
        title: "Eiffel Tower under construction, 1888".into(),
        context_link: "https://commons.wikimedia.org/".into(),
    }];

    Orchestrator::new(
        Arc::new(MockVision::new(detections)),
        Arc::new(MockDescriber::new(Some(
            "Wrought-iron lattice tower on the Champ de Mars in Paris.".into(),
        ))),
        Arc::new(MockImageSearch::new(photos, Vec::new())),
        AnalysisCache::in_memory(DEFAULT_CACHE_TTL),
        OrchestratorConfig::default(),
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,lens_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    let orchestrator = if config.mock_upstream {
        tracing::warn!("LENS_MOCK_UPSTREAM set: serving canned upstream responses");
        mock_orchestrator()
    } else {
        Orchestrator::from_config(&LensConfig::from_env()?)?
    };

    let state = AppState::new(orchestrator.clone(), &config);
    let app = create_router_with_config(state, &config);

    let addr = config.socket_addr();
    tracing::info!(%addr, version = env!("CARGO_PKG_VERSION"), "Lens server listening");
    tracing::info!("  POST /analyze       - Analyze image (multipart: file)");
    tracing::info!("  POST /analyze-image - Detect landmarks (json: imageUri)");
    tracing::info!("  GET  /health        - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        tracing::info!("Shutdown signal received");
        orchestrator.shutdown();
    })
    .await?;

    Ok(())
}
