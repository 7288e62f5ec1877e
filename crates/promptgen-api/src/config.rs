//! API configuration.

use std::time::Duration;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second
    pub rate_limit_rps: u32,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// HS256 secret for session tokens
    pub auth_secret: String,
    /// Session token lifetime
    pub token_ttl: Duration,
    /// Which backend set to wire up ("memory" or "firestore")
    pub backend: String,
    /// Interval between charge status polls
    pub payment_poll_interval: Duration,
    /// Delay before the purchase dialog auto-closes after confirmation
    pub payment_auto_close_delay: Duration,
    /// Simulated processor delay before a pending charge confirms
    pub payment_confirm_delay: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            max_body_size: 10 * 1024 * 1024, // 10MB, uploads are inline base64
            environment: "development".to_string(),
            auth_secret: "dev-secret".to_string(),
            token_ttl: Duration::from_secs(24 * 3600),
            backend: "memory".to_string(),
            payment_poll_interval: Duration::from_secs(3),
            payment_auto_close_delay: Duration::from_secs(3),
            payment_confirm_delay: Duration::from_secs(10),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: std::env::var("RATE_LIMIT_RPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.rate_limit_rps),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            auth_secret: std::env::var("AUTH_SECRET").unwrap_or(defaults.auth_secret),
            token_ttl: Duration::from_secs(
                std::env::var("TOKEN_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(24 * 3600),
            ),
            backend: std::env::var("BACKEND").unwrap_or(defaults.backend),
            payment_poll_interval: duration_from_env(
                "PAYMENT_POLL_INTERVAL_SECS",
                defaults.payment_poll_interval,
            ),
            payment_auto_close_delay: duration_from_env(
                "PAYMENT_AUTO_CLOSE_SECS",
                defaults.payment_auto_close_delay,
            ),
            payment_confirm_delay: duration_from_env(
                "PAYMENT_CONFIRM_DELAY_SECS",
                defaults.payment_confirm_delay,
            ),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

fn duration_from_env(var: &str, default: Duration) -> Duration {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.payment_poll_interval, Duration::from_secs(3));
        assert_eq!(config.payment_auto_close_delay, Duration::from_secs(3));
        assert!(!config.is_production());
    }
}
