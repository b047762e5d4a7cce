//! Service configuration.
//!
//! Every field has an environment variable and a default, so a container can
//! be configured without a file.

use std::time::Duration;

use chat::SendPolicy;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub assistant: AssistantConfig,
    pub chat: ChatConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g. "0.0.0.0")
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// `host:port`, ready for `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string; the server refuses to start without one.
    pub url: Option<String>,
    pub max_connections: u32,
}

/// Where the chat assistant lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    pub url: Option<String>,
    /// Sent as a bearer token when present.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl AssistantConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    pub send_policy: SendPolicy,
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("HALO_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env_parse("HALO_PORT", 8080),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL").ok(),
                max_connections: env_parse("HALO_DB_MAX_CONNECTIONS", 10),
            },
            assistant: AssistantConfig {
                url: std::env::var("HALO_ASSISTANT_URL").ok(),
                api_key: std::env::var("HALO_ASSISTANT_KEY").ok(),
                timeout_secs: env_parse("HALO_ASSISTANT_TIMEOUT_SECS", 60),
            },
            chat: ChatConfig {
                send_policy: env_parse("HALO_CHAT_SEND_POLICY", SendPolicy::Reject),
            },
        }
    }
}

/// Read and parse `name`, falling back to `default` when it is unset or
/// does not parse.
fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_joins_host_and_port() {
        let server = ServerConfig { host: "127.0.0.1".into(), port: 9000 };
        assert_eq!(server.bind_addr(), "127.0.0.1:9000");
    }

    #[test]
    fn unset_variables_fall_back() {
        assert_eq!(env_parse("HALO_TEST_UNSET_PORT", 8080u16), 8080);
        assert_eq!(
            env_parse("HALO_TEST_UNSET_POLICY", SendPolicy::CancelPrevious),
            SendPolicy::CancelPrevious
        );
    }
}
