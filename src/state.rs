use std::sync::Arc;

use anyhow::Result;

use crate::blob::{BlobStore, S3BlobStore};
use crate::config::Config;
use crate::db::Store;

/// Shared application state. The blob store is optional; endpoints that need
/// it return a configuration error when it is absent.
pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub blob: Option<Arc<dyn BlobStore>>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Arc<Self>> {
        let store = Store::with_pool_options(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await?;

        let blob: Option<Arc<dyn BlobStore>> = S3BlobStore::from_config(&config.s3)
            .await?
            .map(|s3| Arc::new(s3) as Arc<dyn BlobStore>);

        if blob.is_none() {
            tracing::warn!("Blob store not configured; PDF persistence endpoints are disabled");
        }

        Ok(Arc::new(Self {
            config,
            store,
            blob,
        }))
    }

    /// Assembles state from already-built parts, used by tests.
    #[must_use]
    pub fn from_parts(config: Config, store: Store, blob: Option<Arc<dyn BlobStore>>) -> Arc<Self> {
        Arc::new(Self {
            config,
            store,
            blob,
        })
    }
}
