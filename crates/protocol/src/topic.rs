//! Channel topic naming.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix shared by every game channel.
pub const GAME_TOPIC_PREFIX: &str = "game:";

/// Reserved topic used for socket-level messages such as heartbeats.
pub const PHOENIX_TOPIC: &str = "phoenix";

/// A channel topic, e.g. `game:moon`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    /// Game channel for the given subtopic. The suffix is taken verbatim.
    pub fn game(suffix: &str) -> Self {
        Self(format!("{GAME_TOPIC_PREFIX}{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Topic {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Topic {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Topic {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_topic_is_prefix_plus_suffix() {
        for suffix in ["moon", "", "player1", "with:colon", "ünïcode"] {
            let topic = Topic::game(suffix);
            assert_eq!(topic.as_str(), format!("game:{suffix}"));
        }
    }

    #[test]
    fn displays_as_raw_topic() {
        assert_eq!(Topic::from(PHOENIX_TOPIC).to_string(), "phoenix");
    }
}
