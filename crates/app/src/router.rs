use axum::{
    extract::State,
    http::{header, Method, StatusCode, Uri},
    middleware,
    response::IntoResponse,
    routing::{get, MethodRouter},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use csp_core::RootMessage;

use crate::problem::ProblemResponse;
use crate::telemetry;

/// Methods served by every route in the table; `HEAD` comes free with `GET`.
const READ_ONLY_METHODS: &str = "GET,HEAD";

pub const DOCS_PATH: &str = "/docs";
pub const OPENAPI_PATH: &str = "/openapi.json";

/// Public API description. Business handlers are listed in `paths`;
/// operational routes stay out of it.
#[derive(OpenApi)]
#[openapi(info(title = "Customer Service Platform"), paths(root))]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    metrics: PrometheusHandle,
}

impl AppState {
    pub fn new(metrics: PrometheusHandle) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> &PrometheusHandle {
        &self.metrics
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", read_only(get(root)))
        .route("/healthz", read_only(get(healthz)))
        .route("/metrics", read_only(get(metrics)))
        .merge(SwaggerUi::new(DOCS_PATH).url(OPENAPI_PATH, ApiDoc::openapi()))
        .fallback(not_found)
        .layer(middleware::from_fn(telemetry::track_requests))
        .with_state(state)
}

fn read_only(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.fallback(method_not_allowed)
}

/// Root
#[utoipa::path(
    get,
    path = "/",
    operation_id = "root__get",
    responses(
        (status = 200, description = "Successful Response", body = RootMessage)
    )
)]
async fn root() -> Json<RootMessage> {
    Json(RootMessage::greeting())
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        telemetry::render_metrics(state.metrics()),
    )
}

async fn not_found(uri: Uri) -> ProblemResponse {
    ProblemResponse::not_found(uri.path())
}

async fn method_not_allowed(method: Method, uri: Uri) -> ProblemResponse {
    ProblemResponse::method_not_allowed(method.as_str(), uri.path(), READ_ONLY_METHODS)
}
