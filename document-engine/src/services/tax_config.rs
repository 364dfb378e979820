//! Cached tax-rate configuration provider.

use engine_core::error::AppError;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::models::TaxRateConfig;
use crate::services::Database;

/// Injected provider over the `tax_rate_config` table with a bounded
/// in-process cache. `invalidate` is exposed to the configuration-change
/// collaborator so rate edits take effect before the TTL expires.
pub struct TaxConfigProvider {
    db: Database,
    ttl: Duration,
    cache: RwLock<Option<CacheEntry>>,
}

struct CacheEntry {
    loaded_at: Instant,
    config: TaxRateConfig,
}

impl TaxConfigProvider {
    pub fn new(db: Database, ttl: Duration) -> Self {
        Self {
            db,
            ttl,
            cache: RwLock::new(None),
        }
    }

    /// Get the active configuration, reloading from the store when the
    /// cached copy is stale or absent.
    pub async fn get(&self) -> Result<TaxRateConfig, AppError> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.as_ref() {
                if entry.loaded_at.elapsed() < self.ttl {
                    return Ok(entry.config);
                }
            }
        }

        let config = self.load().await?;
        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry {
            loaded_at: Instant::now(),
            config,
        });
        Ok(config)
    }

    /// Drop the cached configuration so the next read reloads it.
    #[instrument(skip(self))]
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
        info!("tax configuration cache invalidated");
    }

    async fn load(&self) -> Result<TaxRateConfig, AppError> {
        let row = sqlx::query_as::<_, TaxRateConfig>(
            "SELECT vat_rate, vat_enabled, css_rate, css_enabled FROM tax_rate_config LIMIT 1",
        )
        .fetch_optional(self.db.pool())
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to load tax configuration: {}", e))
        })?;

        Ok(row.unwrap_or_else(|| {
            debug!("no tax configuration row, using defaults");
            TaxRateConfig::default()
        }))
    }
}
