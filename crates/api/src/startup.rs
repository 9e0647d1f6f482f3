use crate::{
    index_handler, precipitation, routes, stations, temperature_between, temperature_from, tobs,
    ClimateAccess, ClimateData, ErrorBody, TemperatureObservation, TemperatureSummary,
    TrailingWindow,
};
use axum::{
    body::Body,
    extract::Request,
    middleware::{self, Next},
    response::IntoResponse,
    routing::get,
    Router,
};
use climate_core::check_dataset;
use hyper::{header::ACCEPT, Method};
use log::info;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

#[derive(Clone)]
pub struct AppState {
    pub climate_db: Arc<dyn ClimateData>,
    pub window: TrailingWindow,
    pub most_active_station: String,
    /// Reject malformed `yyyy-mm-dd` path dates with 400 instead of querying with them
    pub strict_dates: bool,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::climate::climate_routes::precipitation,
        routes::climate::climate_routes::stations,
        routes::climate::climate_routes::tobs,
        routes::climate::climate_routes::temperature_from,
        routes::climate::climate_routes::temperature_between,
    ),
    components(
        schemas(
            TemperatureObservation,
            TemperatureSummary,
            ErrorBody
        )
    ),
    tags(
        (name = "climate api", description = "a read-only RESTful api over daily precipitation and temperature observations")
    )
)]
struct ApiDoc;

pub fn build_app_state(
    database: &str,
    window: TrailingWindow,
    most_active_station: String,
    strict_dates: bool,
) -> AppState {
    // Missing data is reported per request as 503, not at startup
    check_dataset(database);

    AppState {
        climate_db: Arc::new(ClimateAccess::new(database)),
        window,
        most_active_station,
        strict_dates,
    }
}

pub fn app(app_state: AppState) -> Router {
    let api_docs = ApiDoc::openapi();
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([ACCEPT])
        .allow_origin(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/api/v1.0/precipitation", get(precipitation))
        .route("/api/v1.0/stations", get(stations))
        .route("/api/v1.0/tobs", get(tobs))
        .route("/api/v1.0/{start}", get(temperature_from))
        .route("/api/v1.0/{start}/{end}", get(temperature_between))
        .with_state(Arc::new(app_state))
        .layer(middleware::from_fn(log_request))
        .merge(Scalar::with_url("/docs", api_docs))
        .layer(cors)
}

async fn log_request(request: Request<Body>, next: Next) -> impl IntoResponse {
    let now = time::OffsetDateTime::now_utc();
    let method = request.method().clone();
    let path = request
        .uri()
        .path_and_query()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_default();
    info!(target: "http_request", "new request, {} {}", method, path);

    let response = next.run(request).await;
    let response_time = time::OffsetDateTime::now_utc() - now;
    info!(target: "http_response", "response, {} {}, code: {}, time: {}", method, path, response.status().as_str(), response_time);

    response
}
