//! Collaborator seams, injected at dispatcher construction.

use anyhow::Result;
use async_trait::async_trait;

use crate::events::{ObjectKind, OutboundMessage, Transaction};

/// Source of enriched transactions and object metadata (the tracker API).
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Fetch the named transactions and classify them into the rule set,
    /// preserving the order the tracker returns.
    async fn transactions(
        &self,
        kind: ObjectKind,
        object_phid: &str,
        tx_phids: &[String],
    ) -> Result<Vec<Transaction>>;

    /// Permalink for a task, revision, commit, project, or repository PHID,
    /// in chat link syntax.
    async fn link(&self, phid: &str) -> Result<String>;

    /// Owner of a task or revision, if any.
    async fn owner(&self, phid: &str) -> Result<Option<String>>;
}

/// Message delivery to the chat platform.
///
/// Implementations absorb delivery failures internally (log and drop); the
/// core never retries and never sees a delivery error.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: OutboundMessage);
}
