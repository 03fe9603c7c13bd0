use std::sync::Arc;

use anyhow::Result;
use tracing::info;

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;
mod server;

use application::post_service::PostService;
use data::repositories::postgres::post_repository::PostgresPostRepository;
use data::repositories::postgres::user_repository::PostgresUserRepository;
use infrastructure::database::Database;
use infrastructure::file_storage::LocalFileSink;
use infrastructure::jwt::JwtService;
use infrastructure::logging::init_logging;
use infrastructure::settings::Settings;
use presentation::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;

    init_logging(&settings.log_level)?;

    let database = Database::connect(&settings).await?;
    database.run_migrations().await?;

    let post_service = PostService::new(
        Arc::new(PostgresPostRepository::new(database.pool())),
        Arc::new(PostgresUserRepository::new(database.pool())),
        Arc::new(LocalFileSink::new(settings.file_upload_path.clone())),
        settings.max_file_upload_bytes,
    );
    let jwt = JwtService::new(&settings.jwt_secret);
    let state = AppState::new(Arc::new(post_service), Arc::new(jwt));

    let served = server::run_http(&settings, state).await;

    database.close().await;
    info!("database pool closed");
    served
}
