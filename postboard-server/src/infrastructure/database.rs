use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::infrastructure::settings::Settings;

const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Owned handle to the post store. Created once at startup and closed on shutdown.
#[derive(Debug, Clone)]
pub(crate) struct Database {
    pool: PgPool,
}

impl Database {
    pub(crate) async fn connect(settings: &Settings) -> Result<Self> {
        let mut attempt = 0;
        let pool = loop {
            attempt += 1;
            match PgPoolOptions::new()
                .max_connections(settings.database_max_connections)
                .acquire_timeout(Duration::from_secs(3))
                .connect(&settings.database_url)
                .await
            {
                Ok(pool) => break pool,
                Err(err) if attempt < settings.database_connect_retries => {
                    warn!(
                        attempt,
                        error = %err,
                        "database not ready, retrying in {}s",
                        CONNECT_RETRY_DELAY.as_secs()
                    );
                    tokio::time::sleep(CONNECT_RETRY_DELAY).await;
                }
                Err(err) => {
                    return Err(err).with_context(|| {
                        format!("failed to connect to database after {attempt} attempts")
                    });
                }
            }
        };

        info!("database connected");
        Ok(Self { pool })
    }

    pub(crate) async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("failed to run database migrations")?;
        info!("migrations applied");
        Ok(())
    }

    pub(crate) fn pool(&self) -> PgPool {
        self.pool.clone()
    }

    pub(crate) async fn close(&self) {
        self.pool.close().await;
        info!("database connections closed");
    }
}
