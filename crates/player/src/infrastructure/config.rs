//! Player configuration loaded from the environment.

use std::time::Duration;

use super::websocket::{PhoenixSocketFactory, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_PUSH_TIMEOUT};

pub const ENV_SOCKET_URL: &str = "ISLANDS_SOCKET_URL";
pub const ENV_PLAYER_NAME: &str = "ISLANDS_PLAYER_NAME";
pub const ENV_TOPIC_SUFFIX: &str = "ISLANDS_TOPIC_SUFFIX";
pub const ENV_HEARTBEAT_SECS: &str = "ISLANDS_HEARTBEAT_SECS";
pub const ENV_PUSH_TIMEOUT_SECS: &str = "ISLANDS_PUSH_TIMEOUT_SECS";
pub const ENV_GREETING: &str = "ISLANDS_GREETING";
pub const ENV_NEW_GAME: &str = "ISLANDS_NEW_GAME";

pub const DEFAULT_SOCKET_URL: &str = "ws://127.0.0.1:4000/socket/websocket";
pub const DEFAULT_PLAYER_NAME: &str = "player1";
pub const DEFAULT_TOPIC_SUFFIX: &str = "moon";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
    pub socket_url: String,
    pub player_name: String,
    pub topic_suffix: String,
    pub heartbeat_interval: Duration,
    pub push_timeout: Duration,
    /// Sent with `hello` after joining, when present
    pub greeting: Option<String>,
    /// Push `new_game` after joining
    pub new_game: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            socket_url: DEFAULT_SOCKET_URL.to_string(),
            player_name: DEFAULT_PLAYER_NAME.to_string(),
            topic_suffix: DEFAULT_TOPIC_SUFFIX.to_string(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            push_timeout: DEFAULT_PUSH_TIMEOUT,
            greeting: None,
            new_game: false,
        }
    }
}

impl PlayerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset or blank values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        Self {
            socket_url: get(ENV_SOCKET_URL).unwrap_or(defaults.socket_url),
            player_name: get(ENV_PLAYER_NAME).unwrap_or(defaults.player_name),
            topic_suffix: get(ENV_TOPIC_SUFFIX).unwrap_or(defaults.topic_suffix),
            heartbeat_interval: seconds(ENV_HEARTBEAT_SECS, get(ENV_HEARTBEAT_SECS))
                .unwrap_or(defaults.heartbeat_interval),
            push_timeout: seconds(ENV_PUSH_TIMEOUT_SECS, get(ENV_PUSH_TIMEOUT_SECS))
                .unwrap_or(defaults.push_timeout),
            greeting: get(ENV_GREETING),
            new_game: get(ENV_NEW_GAME)
                .map(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.new_game),
        }
    }

    pub fn socket_factory(&self) -> PhoenixSocketFactory {
        PhoenixSocketFactory::new(self.socket_url.clone())
            .with_heartbeat_interval(self.heartbeat_interval)
            .with_timeout(self.push_timeout)
    }
}

fn seconds(key: &str, value: Option<String>) -> Option<Duration> {
    let value = value?;
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => {
            tracing::warn!(key, value = %value, "Invalid duration, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> PlayerConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PlayerConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        assert_eq!(config_from(&[]), PlayerConfig::default());
    }

    #[test]
    fn reads_all_keys() {
        let config = config_from(&[
            (ENV_SOCKET_URL, "wss://islands.example/socket"),
            (ENV_PLAYER_NAME, "ada"),
            (ENV_TOPIC_SUFFIX, "sun"),
            (ENV_HEARTBEAT_SECS, "5"),
            (ENV_PUSH_TIMEOUT_SECS, "2"),
            (ENV_GREETING, "Hello, world!"),
            (ENV_NEW_GAME, "true"),
        ]);
        assert_eq!(config.socket_url, "wss://islands.example/socket");
        assert_eq!(config.player_name, "ada");
        assert_eq!(config.topic_suffix, "sun");
        assert_eq!(config.heartbeat_interval, Duration::from_secs(5));
        assert_eq!(config.push_timeout, Duration::from_secs(2));
        assert_eq!(config.greeting.as_deref(), Some("Hello, world!"));
        assert!(config.new_game);
    }

    #[test]
    fn invalid_numbers_and_blank_values_fall_back() {
        let config = config_from(&[
            (ENV_HEARTBEAT_SECS, "soon"),
            (ENV_PUSH_TIMEOUT_SECS, "0"),
            (ENV_PLAYER_NAME, "   "),
            (ENV_NEW_GAME, "nope"),
        ]);
        assert_eq!(config.heartbeat_interval, DEFAULT_HEARTBEAT_INTERVAL);
        assert_eq!(config.push_timeout, DEFAULT_PUSH_TIMEOUT);
        assert_eq!(config.player_name, DEFAULT_PLAYER_NAME);
        assert!(!config.new_game);
    }
}
