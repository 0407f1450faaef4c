//! Repository to channel routing.

use std::collections::HashMap;

use crate::error::RelayError;

/// Channel map key for the mandatory fallback channel.
pub const DEFAULT_CHANNEL: &str = "__default__";

/// Channel map key for the optional sink receiving skipped-event notes.
pub const DEBUG_CHANNEL: &str = "__debug__";

/// Maps repository names to chat channels.
///
/// Lookup always terminates: unmapped repositories fall back to the
/// `__default__` channel, whose presence is validated at construction.
#[derive(Debug, Clone)]
pub struct ChannelRouter {
    channels: HashMap<String, String>,
}

impl ChannelRouter {
    /// Build a router from the configured channel map.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::MissingDefaultChannel`] when the map has no
    /// `__default__` entry; this is a configuration error, not a per-message
    /// condition.
    pub fn new(channels: HashMap<String, String>) -> Result<Self, RelayError> {
        if !channels.contains_key(DEFAULT_CHANNEL) {
            return Err(RelayError::MissingDefaultChannel);
        }
        Ok(Self { channels })
    }

    /// Channel for a repository, falling back to the default.
    #[must_use]
    pub fn channel_for(&self, repo: &str) -> &str {
        self.channels
            .get(repo)
            .unwrap_or_else(|| &self.channels[DEFAULT_CHANNEL])
    }

    /// The configured default channel.
    #[must_use]
    pub fn default_channel(&self) -> &str {
        &self.channels[DEFAULT_CHANNEL]
    }

    /// The debug sink, if one is configured.
    #[must_use]
    pub fn debug_channel(&self) -> Option<&str> {
        self.channels.get(DEBUG_CHANNEL).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmapped_repo_falls_back_to_default() {
        let router = ChannelRouter::new(HashMap::from([
            ("__default__".to_string(), "#general".to_string()),
            ("gadgets".to_string(), "#gadgets-dev".to_string()),
        ]))
        .unwrap();

        assert_eq!(router.channel_for("foo"), "#general");
        assert_eq!(router.channel_for("gadgets"), "#gadgets-dev");
        assert_eq!(router.default_channel(), "#general");
        assert_eq!(router.debug_channel(), None);
    }

    #[test]
    fn debug_channel_is_optional() {
        let router = ChannelRouter::new(HashMap::from([
            ("__default__".to_string(), "#general".to_string()),
            ("__debug__".to_string(), "#relay-debug".to_string()),
        ]))
        .unwrap();
        assert_eq!(router.debug_channel(), Some("#relay-debug"));
    }

    #[test]
    fn missing_default_is_a_configuration_error() {
        let err = ChannelRouter::new(HashMap::from([(
            "gadgets".to_string(),
            "#gadgets-dev".to_string(),
        )]))
        .unwrap_err();
        assert!(matches!(err, RelayError::MissingDefaultChannel));
    }
}
