use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::error::{AppError, AppResult};
use crate::infrastructure::id_generator::MAX_NODES;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub features: FeatureConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub node_id: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    pub latest_posts_limit: usize,
    pub enable_seed_routes: bool,
}

impl Config {
    /// Reads the process environment, after loading `.env` if one is present.
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let node_id: u16 = parse_or(&lookup, "NODE_ID", 0)?;
        if node_id >= MAX_NODES {
            return Err(AppError::ConfigurationError(format!(
                "NODE_ID must be less than {}, got {}",
                MAX_NODES, node_id
            )));
        }

        let latest_posts_limit: usize = parse_or(&lookup, "LATEST_POSTS_LIMIT", 3)?;
        if latest_posts_limit == 0 {
            return Err(AppError::ConfigurationError(
                "LATEST_POSTS_LIMIT must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            database: DatabaseConfig {
                url: lookup("DATABASE_URL")
                    .unwrap_or_else(|| "sqlite:data/review_board.db".to_string()),
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
            },
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
                port: parse_or(&lookup, "SERVER_PORT", 8888)?,
                node_id,
            },
            features: FeatureConfig {
                latest_posts_limit,
                enable_seed_routes: parse_or(&lookup, "ENABLE_SEED_ROUTES", false)?,
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> AppResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e| {
            AppError::ConfigurationError(format!("{}={:?} is invalid: {}", key, raw, e))
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppResult<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.database.url, "sqlite:data/review_board.db");
        assert_eq!(config.server.port, 8888);
        assert_eq!(config.features.latest_posts_limit, 3);
        assert!(!config.features.enable_seed_routes);
        assert_eq!(config.server_address(), "127.0.0.1:8888");
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("SERVER_PORT", "3210"),
            ("LATEST_POSTS_LIMIT", "5"),
            ("ENABLE_SEED_ROUTES", "true"),
        ])
        .unwrap();
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.server.port, 3210);
        assert_eq!(config.features.latest_posts_limit, 5);
        assert!(config.features.enable_seed_routes);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            config_from(&[("SERVER_PORT", "eighty")]),
            Err(AppError::ConfigurationError(_))
        ));
        assert!(matches!(
            config_from(&[("NODE_ID", "4096")]),
            Err(AppError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_zero_latest_posts_limit_is_rejected() {
        assert!(matches!(
            config_from(&[("LATEST_POSTS_LIMIT", "0")]),
            Err(AppError::ConfigurationError(_))
        ));
        assert_eq!(
            config_from(&[("LATEST_POSTS_LIMIT", "1")])
                .unwrap()
                .features
                .latest_posts_limit,
            1
        );
    }
}
