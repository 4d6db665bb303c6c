pub mod devices;
pub mod error;
pub mod news;
pub mod run_log;

pub use devices::DeviceStore;
pub use error::{Result, StoreError};
pub use news::{InsertNews, NewsStore};
pub use run_log::{RunLog, RunUpdate};

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Open a connection pool against the configured Postgres database.
pub async fn connect(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Run the embedded SQL migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
