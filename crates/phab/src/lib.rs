//! Phabricator Conduit client for the firehose relay.
//!
//! [`PhabClient`] wraps the Conduit endpoints the relay needs: user listing,
//! transaction enrichment (with classification into the relay's rule set),
//! permalinks, and owner lookups. It implements
//! [`firehose::TransactionSource`].

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Conduit wrappers fail on transport or API errors

pub mod classify;
pub mod client;

pub use classify::{RawComment, RawTransaction};
pub use client::{ConduitError, PhabClient};
