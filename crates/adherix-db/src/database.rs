//! Database connection handling.

use std::sync::Arc;

use tokio_postgres::{Client, NoTls};
use tracing::{error, info};

use adherix_common::error::{AdherixError, Result};

use crate::schema;

/// Shared connection to PostgreSQL.
pub struct Database {
    client: Client,
}

impl Database {
    /// Connect and spawn the connection driver task.
    pub async fn connect(url: &str) -> Result<Arc<Self>> {
        let (client, connection) = tokio_postgres::connect(url, NoTls)
            .await
            .map_err(|e| AdherixError::Database(format!("connect failed: {e}")))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "postgres connection closed");
            }
        });

        info!("connected to postgres");
        Ok(Arc::new(Self { client }))
    }

    /// Create the tables this crate owns, if missing.
    pub async fn init_schema(&self) -> Result<()> {
        self.client
            .batch_execute(schema::DDL)
            .await
            .map_err(|e| AdherixError::Database(format!("schema init failed: {e}")))?;
        Ok(())
    }

    /// Underlying client, for queries this crate does not wrap.
    pub fn client(&self) -> &Client {
        &self.client
    }
}
