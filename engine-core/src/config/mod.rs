use anyhow::Result;
use dotenvy::dotenv;
use secrecy::Secret;
use serde::Deserialize;
use std::env;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub database: DatabaseConfig,
    pub log_level: String,
    pub tax_cache_ttl_secs: u64,
    pub service_name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let db_url = env::var("ENGINE_DATABASE_URL").expect("ENGINE_DATABASE_URL must be set");
        let max_connections = env::var("ENGINE_DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()?;
        let min_connections = env::var("ENGINE_DATABASE_MIN_CONNECTIONS")
            .unwrap_or_else(|_| "1".to_string())
            .parse()?;

        let log_level = env::var("ENGINE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let tax_cache_ttl_secs = env::var("ENGINE_TAX_CACHE_TTL_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()?;

        Ok(Self {
            database: DatabaseConfig {
                url: Secret::new(db_url),
                max_connections,
                min_connections,
            },
            log_level,
            tax_cache_ttl_secs,
            service_name: "document-engine".to_string(),
        })
    }
}
