// Database connection and migration management

use crate::storage::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres, Row};
use tracing::{error, info, warn};

pub type DatabasePool = Pool<Postgres>;

pub struct Database;

impl Database {
    // create a new db connection pool
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<DatabasePool> {
        info!("Connecting to metadata store");

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!("Metadata store connected");
        Ok(pool)
    }

    // Run database migrations
    pub async fn migrate(pool: &DatabasePool) -> Result<()> {
        info!("Running migrations ...");

        let initial_schema = include_str!("../../migrations/001_initial.sql");

        let mut tx = pool.begin().await?;

        // split by semicolon, drop comment lines, execute each statement
        for chunk in initial_schema.split(';') {
            let statement = chunk
                .lines()
                .filter(|line| !line.trim_start().starts_with("--"))
                .collect::<Vec<_>>()
                .join("\n");
            let statement = statement.trim();
            if !statement.is_empty() {
                sqlx::query(statement).execute(&mut *tx).await.map_err(|e| {
                    error!("Failed to run migration statement: {}", statement);
                    e
                })?;
            }
        }
        tx.commit().await?;

        info!("Database migration complete");
        Ok(())
    }

    // check db health
    pub async fn health_check(pool: &DatabasePool) -> bool {
        match sqlx::query("SELECT 1 as health_check").fetch_one(pool).await {
            Ok(row) => {
                let result: i32 = row.get("health_check");
                result == 1
            }
            Err(e) => {
                warn!("Database health check failed: {}", e);
                false
            }
        }
    }
}
