use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:8081"). Unused by the worker.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// PostgreSQL connection string
    pub database_url: String,

    /// Redis connection string for the ingestion queue
    pub redis_url: String,

    /// Maximum number of orders held in the lookup cache
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Number of most recent orders loaded into the cache at startup
    #[serde(default = "default_cache_preload_limit")]
    pub cache_preload_limit: usize,

    /// Redis list the worker consumes orders from
    #[serde(default = "default_ingest_queue")]
    pub ingest_queue: String,

    /// Redis list receiving messages that cannot be processed
    #[serde(default = "default_dead_letter_queue")]
    pub dead_letter_queue: String,

    /// Per-request timeout for the HTTP server, in seconds
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Address the worker serves its Prometheus metrics on
    #[serde(default = "default_worker_metrics_addr")]
    pub worker_metrics_addr: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8081".to_string()
}

fn default_cache_capacity() -> usize {
    1000
}

fn default_cache_preload_limit() -> usize {
    100
}

fn default_ingest_queue() -> String {
    "orders".to_string()
}

fn default_dead_letter_queue() -> String {
    "orders.dlq".to_string()
}

fn default_http_timeout_secs() -> u64 {
    10
}

fn default_worker_metrics_addr() -> String {
    "0.0.0.0:9091".to_string()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_apply() {
        let config: AppConfig = envy::from_iter(vars(&[
            ("DATABASE_URL", "postgres://localhost/orders"),
            ("REDIS_URL", "redis://localhost"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:8081");
        assert_eq!(config.cache_capacity, 1000);
        assert_eq!(config.cache_preload_limit, 100);
        assert_eq!(config.ingest_queue, "orders");
        assert_eq!(config.dead_letter_queue, "orders.dlq");
        assert_eq!(config.http_timeout_secs, 10);
        assert_eq!(config.worker_metrics_addr, "0.0.0.0:9091");
    }

    #[test]
    fn test_overrides_parse() {
        let config: AppConfig = envy::from_iter(vars(&[
            ("DATABASE_URL", "postgres://localhost/orders"),
            ("REDIS_URL", "redis://localhost"),
            ("CACHE_CAPACITY", "5"),
            ("INGEST_QUEUE", "wb-orders"),
        ]))
        .unwrap();

        assert_eq!(config.cache_capacity, 5);
        assert_eq!(config.ingest_queue, "wb-orders");
    }

    #[test]
    fn test_missing_database_url_fails() {
        let result = envy::from_iter::<_, AppConfig>(vars(&[("REDIS_URL", "redis://localhost")]));
        assert!(result.is_err());
    }
}
