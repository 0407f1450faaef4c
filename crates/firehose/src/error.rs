//! Error taxonomy for the relay core.

use thiserror::Error;

/// Errors raised while processing a webhook request.
#[derive(Debug, Error)]
pub enum RelayError {
    /// An author, owner, or assignee identity is not in the user directory.
    /// Fatal to the current request; reported once at the dispatch boundary.
    #[error("unknown tracker user: {0}")]
    UnknownUser(String),

    /// A revision without an owner cannot be rendered; the tracker always
    /// reports an author for revisions, so this indicates bad upstream data.
    #[error("revision {0} has no owner")]
    MissingOwner(String),

    /// The channel map lacks the mandatory `__default__` entry. Raised at
    /// construction, never per message.
    #[error("channel map has no __default__ entry")]
    MissingDefaultChannel,
}
