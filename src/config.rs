use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

// ============================================================================
// Configuration Constants
// ============================================================================

// Default service ports
const DEFAULT_GATEWAY_PORT: u16 = 8080;
const DEFAULT_AUTH_PORT: u16 = 8081;
const DEFAULT_ORDER_PORT: u16 = 8082;
const DEFAULT_RESTAURANT_PORT: u16 = 8083;

// Default token TTLs
const DEFAULT_ACCESS_TOKEN_TTL_HOURS: i64 = 1;
const DEFAULT_REFRESH_TOKEN_TTL_DAYS: i64 = 30;

// Default Kafka settings
const DEFAULT_KAFKA_TOPIC: &str = "order-placed-events";
const DEFAULT_CONSUMER_GROUP: &str = "restaurant-group";
const DEFAULT_SEND_TIMEOUT_MS: u64 = 2000;

// Request body limit for gateway forwarding (HTTP API requests)
pub const MAX_REQUEST_BODY_SIZE: usize = 2 * 1024 * 1024; // 2 MB

// ============================================================================
// Configuration Structures
// ============================================================================

/// Token signing and lifetime configuration.
///
/// The secret is shared out-of-band with every service that validates
/// tokens. It is read once at startup and never mutated.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Shared HMAC secret for token signing and verification
    pub token_secret: String,
    /// Access token TTL in hours (short-lived, per-request authorization)
    pub access_token_ttl_hours: i64,
    /// Refresh token TTL in days (long-lived, only mints new access tokens)
    pub refresh_token_ttl_days: i64,
}

/// Kafka configuration for the order event hand-off.
#[derive(Clone, Debug)]
pub struct KafkaConfig {
    /// Whether Kafka is enabled (false = events are dropped, for local dev/tests)
    pub enabled: bool,
    /// Comma-separated list of brokers (e.g. "kafka1:9092,kafka2:9092")
    pub brokers: String,
    /// Topic carrying OrderPlacedEvent messages
    pub topic: String,
    /// Consumer group of the subscribing service
    pub consumer_group: String,
    /// How long a single publish may wait for broker acknowledgment
    pub send_timeout_ms: u64,
}

/// Upstream service base URLs used by the gateway router.
#[derive(Clone, Debug)]
pub struct UpstreamConfig {
    pub auth_url: String,
    pub order_url: String,
    pub restaurant_url: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub gateway_port: u16,
    pub auth_port: u16,
    pub order_port: u16,
    pub restaurant_port: u16,
    /// Optional Redis URL; when set, consumers use Redis for idempotency keys
    pub redis_url: Option<String>,
    pub rust_log: String,
    pub auth: AuthConfig,
    pub kafka: KafkaConfig,
    pub upstreams: UpstreamConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Only `TOKEN_SECRET` is mandatory; everything else has a default
    /// suitable for local development.
    pub fn from_env() -> Result<Self> {
        let token_secret =
            env::var("TOKEN_SECRET").context("TOKEN_SECRET must be set (shared HMAC secret)")?;
        if token_secret.trim().is_empty() {
            anyhow::bail!("TOKEN_SECRET must not be empty");
        }

        let gateway_port = parse_env("GATEWAY_PORT", DEFAULT_GATEWAY_PORT)?;
        let auth_port = parse_env("AUTH_SERVICE_PORT", DEFAULT_AUTH_PORT)?;
        let order_port = parse_env("ORDER_SERVICE_PORT", DEFAULT_ORDER_PORT)?;
        let restaurant_port = parse_env("RESTAURANT_SERVICE_PORT", DEFAULT_RESTAURANT_PORT)?;

        let auth = AuthConfig {
            token_secret,
            access_token_ttl_hours: parse_env(
                "ACCESS_TOKEN_TTL_HOURS",
                DEFAULT_ACCESS_TOKEN_TTL_HOURS,
            )?,
            refresh_token_ttl_days: parse_env(
                "REFRESH_TOKEN_TTL_DAYS",
                DEFAULT_REFRESH_TOKEN_TTL_DAYS,
            )?,
        };

        let kafka = KafkaConfig {
            enabled: parse_env("KAFKA_ENABLED", true)?,
            brokers: env::var("KAFKA_BROKERS").unwrap_or_else(|_| "localhost:9092".to_string()),
            topic: env::var("KAFKA_TOPIC").unwrap_or_else(|_| DEFAULT_KAFKA_TOPIC.to_string()),
            consumer_group: env::var("KAFKA_CONSUMER_GROUP")
                .unwrap_or_else(|_| DEFAULT_CONSUMER_GROUP.to_string()),
            send_timeout_ms: parse_env("KAFKA_SEND_TIMEOUT_MS", DEFAULT_SEND_TIMEOUT_MS)?,
        };

        let upstreams = UpstreamConfig {
            auth_url: env::var("AUTH_SERVICE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{auth_port}")),
            order_url: env::var("ORDER_SERVICE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{order_port}")),
            restaurant_url: env::var("RESTAURANT_SERVICE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{restaurant_port}")),
        };

        Ok(Self {
            gateway_port,
            auth_port,
            order_port,
            restaurant_port,
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            auth,
            kafka,
            upstreams,
        })
    }
}

/// Parse an environment variable, falling back to a default when unset.
fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "TOKEN_SECRET",
            "GATEWAY_PORT",
            "AUTH_SERVICE_PORT",
            "ORDER_SERVICE_PORT",
            "RESTAURANT_SERVICE_PORT",
            "ACCESS_TOKEN_TTL_HOURS",
            "REFRESH_TOKEN_TTL_DAYS",
            "KAFKA_ENABLED",
            "KAFKA_BROKERS",
            "KAFKA_TOPIC",
            "KAFKA_CONSUMER_GROUP",
            "KAFKA_SEND_TIMEOUT_MS",
            "AUTH_SERVICE_URL",
            "ORDER_SERVICE_URL",
            "RESTAURANT_SERVICE_URL",
            "REDIS_URL",
            "RUST_LOG",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        env::set_var("TOKEN_SECRET", "test-secret");

        let config = Config::from_env().unwrap();
        assert_eq!(config.gateway_port, DEFAULT_GATEWAY_PORT);
        assert_eq!(config.auth.access_token_ttl_hours, 1);
        assert_eq!(config.kafka.topic, "order-placed-events");
        assert_eq!(config.kafka.consumer_group, "restaurant-group");
        assert!(config.redis_url.is_none());
    }

    #[test]
    #[serial]
    fn test_from_env_requires_secret() {
        clear_env();
        assert!(Config::from_env().is_err());

        env::set_var("TOKEN_SECRET", "   ");
        assert!(Config::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        env::set_var("TOKEN_SECRET", "test-secret");
        env::set_var("KAFKA_ENABLED", "false");
        env::set_var("KAFKA_CONSUMER_GROUP", "billing-group");
        env::set_var("ACCESS_TOKEN_TTL_HOURS", "2");

        let config = Config::from_env().unwrap();
        assert!(!config.kafka.enabled);
        assert_eq!(config.kafka.consumer_group, "billing-group");
        assert_eq!(config.auth.access_token_ttl_hours, 2);
    }
}
