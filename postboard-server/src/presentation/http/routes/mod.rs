use std::path::PathBuf;

use axum::Router;
use axum::routing::get;
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::infrastructure::settings::Settings;
use crate::presentation::AppState;
use crate::presentation::http::openapi::ApiDoc;

pub(crate) mod posts;

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub(crate) struct RouterConfig {
    pub(crate) json_body_limit_bytes: usize,
    pub(crate) upload_body_limit_bytes: usize,
    pub(crate) upload_dir: PathBuf,
}

impl From<&Settings> for RouterConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            json_body_limit_bytes: settings.http_request_body_limit_bytes,
            upload_body_limit_bytes: settings
                .max_file_upload_bytes
                .saturating_add(MULTIPART_OVERHEAD_BYTES),
            upload_dir: settings.file_upload_path.clone(),
        }
    }
}

pub(crate) fn router(state: AppState, config: &RouterConfig) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api/v1/posts", posts::router(state.clone(), config))
        .nest_service("/uploads", ServeDir::new(&config.upload_dir))
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

async fn healthz() -> &'static str {
    "ok"
}
