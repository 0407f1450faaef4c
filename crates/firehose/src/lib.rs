//! Core engine for the Phabricator firehose → Slack relay.
//!
//! This crate turns enriched tracker transactions into human-readable chat
//! notifications:
//!
//! - [`Dispatcher`] orchestrates one webhook request: enrichment, rendering,
//!   delivery, and the single error-report path. It never propagates a
//!   failure to the HTTP boundary.
//! - [`render::Renderer`] holds the rule set: a closed union of
//!   (object type, subtype) pairs, each with its own formatting, mention
//!   prefix, and channel routing.
//! - [`UserDirectory`], [`MentionResolver`], and [`ChannelRouter`] supply
//!   identity resolution, inline mention rewriting, and repository routing.
//!
//! Collaborators (the tracker client and the chat client) are injected at
//! construction behind the [`TransactionSource`] and [`Notifier`] traits.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod directory;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod mentions;
pub mod render;
pub mod routing;
pub mod traits;

pub use directory::{ResolvedUser, UserDirectory};
pub use dispatch::Dispatcher;
pub use error::RelayError;
pub use events::{
    CommitTransaction, DiffTransaction, FirehosePayload, ObjectKind, OutboundMessage,
    ProjectTransaction, RepoTransaction, Severity, TaskTransaction, Transaction,
};
pub use mentions::MentionResolver;
pub use routing::ChannelRouter;
pub use traits::{Notifier, TransactionSource};
