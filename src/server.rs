//! HTTP Server - serves the city dataset and rendered scenes
//!
//! Endpoints:
//! - GET /api/city                 → dataset JSON
//! - GET /api/layout?strategy=     → placements JSON
//! - GET /api/stats                → statistics JSON
//! - GET /api/scene.svg?...        → rendered scene as SVG
//!
//! Everything else is served from the web directory.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::config::Config;
use crate::layout::{CityLayout, LayoutStrategy};
use crate::model::CityData;
use crate::panels::CityStats;
use crate::render::RenderOptions;
use crate::session::Session;
use crate::svg::to_svg;
use crate::view::CanvasSize;
use crate::{log_error, log_request};

const DEFAULT_WIDTH: f64 = 1280.0;
const DEFAULT_HEIGHT: f64 = 800.0;
const MIN_CANVAS: f64 = 64.0;
const MAX_CANVAS: f64 = 8192.0;

/// Read-only state shared across requests; each request builds its own session
#[derive(Clone)]
pub struct AppState {
    pub data: Arc<CityData>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(data: CityData, config: Config) -> Self {
        Self {
            data: Arc::new(data),
            config: Arc::new(config),
        }
    }

    fn session(&self, strategy: Option<LayoutStrategy>, options: RenderOptions, canvas: CanvasSize) -> Session {
        let mut session = Session::new((*self.config).clone());
        if let Some(strategy) = strategy {
            session.set_strategy(strategy);
        }
        session.set_options(options);
        session.resize(canvas);
        session.load(Arc::clone(&self.data));
        session
    }
}

pub fn router(state: AppState, web_dir: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/city", get(get_city))
        .route("/layout", get(get_layout))
        .route("/stats", get(get_stats))
        .route("/scene.svg", get(get_scene))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .fallback_service(ServeDir::new(web_dir))
        .layer(cors)
}

/// Start the HTTP server
pub async fn serve(state: AppState, port: u16, web_dir: &str) -> anyhow::Result<()> {
    tracing::info!("Initializing HTTP server on port {}", port);
    if !std::path::Path::new(web_dir).is_dir() {
        tracing::warn!("Web directory {} not found, only the API will be served", web_dir);
    }

    let classes = state.data.class_count();
    let app = router(state, web_dir);

    let addr = format!("0.0.0.0:{}", port);
    tracing::info!("Starting server on http://localhost:{}", port);
    tracing::info!("  API: http://localhost:{}/api/scene.svg", port);
    tracing::info!("  Web: http://localhost:{}/", port);
    tracing::info!("  Classes loaded: {}", classes);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server bound to {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// GET /api/city - the dataset as loaded
async fn get_city(State(state): State<AppState>) -> impl IntoResponse {
    log_request!("GET", "/api/city");
    match serde_json::to_string(state.data.as_ref()) {
        Ok(body) => Ok(([(header::CONTENT_TYPE, "application/json")], body)),
        Err(e) => {
            log_error!(e, path = "/api/city");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LayoutQuery {
    pub strategy: Option<LayoutStrategy>,
}

/// GET /api/layout - placements for the requested strategy
async fn get_layout(State(state): State<AppState>, Query(params): Query<LayoutQuery>) -> Json<CityLayout> {
    let strategy = params.strategy.unwrap_or(state.config.render.strategy);
    log_request!("GET", "/api/layout", strategy = %strategy);
    let layout = CityLayout::compute(&state.data, strategy, &state.config.layout);
    tracing::debug!("Layout computed: {} buildings", layout.building_count());
    Json(layout)
}

/// GET /api/stats - dataset-wide statistics
async fn get_stats(State(state): State<AppState>) -> Json<CityStats> {
    log_request!("GET", "/api/stats");
    Json(CityStats::compute(
        &state.data,
        state.config.render.recent_days,
        Utc::now(),
    ))
}

/// Scene parameters; anything omitted falls back to the config
#[derive(Debug, Default, Deserialize)]
pub struct SceneQuery {
    pub strategy: Option<LayoutStrategy>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub frequency: Option<bool>,
    pub age: Option<bool>,
    pub glow: Option<bool>,
    pub colorblind: Option<bool>,
}

impl SceneQuery {
    fn canvas(&self) -> CanvasSize {
        let clamp = |v: Option<f64>, default: f64| {
            v.filter(|v| v.is_finite())
                .unwrap_or(default)
                .clamp(MIN_CANVAS, MAX_CANVAS)
        };
        CanvasSize::new(clamp(self.width, DEFAULT_WIDTH), clamp(self.height, DEFAULT_HEIGHT))
    }

    fn options(&self, base: RenderOptions) -> RenderOptions {
        let mut options = base;
        options.colors.frequency = self.frequency.unwrap_or(options.colors.frequency);
        options.colors.age = self.age.unwrap_or(options.colors.age);
        options.colors.color_blind = self.colorblind.unwrap_or(options.colors.color_blind);
        options.glow = self.glow.unwrap_or(options.glow);
        options
    }
}

/// GET /api/scene.svg - the city rendered and fitted to the requested canvas
async fn get_scene(State(state): State<AppState>, Query(params): Query<SceneQuery>) -> impl IntoResponse {
    log_request!("GET", "/api/scene.svg", query = ?params);
    let canvas = params.canvas();
    let options = params.options(state.config.render.options());
    let mut session = state.session(params.strategy, options, canvas);
    let svg = to_svg(session.render(), canvas);
    tracing::debug!("Scene rendered: {} bytes", svg.len());
    ([(header::CONTENT_TYPE, "image/svg+xml")], svg)
}
