//! User directory bridging tracker and chat identities.
//!
//! Built once at startup from the tracker's user list and the chat
//! workspace's member list, joined on real name. Read-only afterwards.

use std::collections::HashMap;

use tracing::warn;

/// Prefix of tracker user PHIDs.
const USER_PHID_PREFIX: &str = "PHID-USER-";

/// A tracker user joined with their chat identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUser {
    /// Tracker PHID.
    pub phid: String,
    /// Tracker username, used as the display name in rendered messages.
    pub username: String,
    /// Chat user id, if the real name matched a workspace member.
    pub slack_id: Option<String>,
}

/// Lookup table from tracker identity to [`ResolvedUser`].
///
/// Absence of an entry means "unknown identity" and is treated as a hard
/// failure by the renderer, not a default.
#[derive(Debug, Default)]
pub struct UserDirectory {
    by_phid: HashMap<String, ResolvedUser>,
}

impl UserDirectory {
    /// Join tracker users `{phid: (username, real_name)}` with chat users
    /// `{real_name: chat_id}`. Tracker users with no chat counterpart are
    /// kept (they can author events) but cannot be mentioned.
    #[must_use]
    pub fn new(
        tracker_users: HashMap<String, (String, String)>,
        chat_users: &HashMap<String, String>,
    ) -> Self {
        let by_phid = tracker_users
            .into_iter()
            .map(|(phid, (username, real_name))| {
                let slack_id = chat_users.get(&real_name).cloned();
                if slack_id.is_none() {
                    warn!(username = %username, real_name = %real_name, "No chat user matches this tracker user");
                }
                (
                    phid.clone(),
                    ResolvedUser {
                        phid,
                        username,
                        slack_id,
                    },
                )
            })
            .collect();

        Self { by_phid }
    }

    /// Look up a user by PHID or tracker username.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ResolvedUser> {
        if id.starts_with(USER_PHID_PREFIX) {
            return self.by_phid.get(id);
        }
        self.by_phid.values().find(|user| user.username == id)
    }

    /// Chat mention for a user, by PHID or tracker username. `None` when the
    /// identity is unknown or has no chat counterpart.
    #[must_use]
    pub fn mention(&self, id: &str) -> Option<String> {
        let slack_id = self.get(id)?.slack_id.as_ref()?;
        Some(format!("<@{slack_id}>"))
    }

    /// Number of known tracker users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_phid.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_phid.is_empty()
    }
}
