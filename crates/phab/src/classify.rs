//! Classification of raw Conduit transactions into the relay's rule set.
//!
//! Raw transaction types without a counterpart in the rule set are skipped
//! with a debug log; malformed records (missing fields the rule needs) are
//! errors and abort the request.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use firehose::{
    CommitTransaction, DiffTransaction, ProjectTransaction, RepoTransaction, TaskTransaction,
    Transaction,
};

/// One record from `transaction.search`, reduced to the parts we read.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTransaction {
    /// Conduit transaction type, e.g. `create`, `comment`, `status`. May be
    /// absent for internal transaction kinds.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(rename = "authorPHID")]
    pub author: String,
    #[serde(rename = "objectPHID")]
    pub object: String,
    #[serde(default)]
    pub fields: Value,
    #[serde(default)]
    pub comments: Vec<RawComment>,
}

/// A comment attached to a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct RawComment {
    #[serde(default)]
    pub removed: bool,
    pub content: RawCommentContent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCommentContent {
    pub raw: String,
}

impl RawTransaction {
    fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or_default()
    }

    /// Live (not removed) comment bodies, in order.
    fn live_comments(&self) -> impl Iterator<Item = &str> {
        self.comments
            .iter()
            .filter(|comment| !comment.removed)
            .map(|comment| comment.content.raw.as_str())
    }

    fn field_str(&self, name: &str) -> Result<String> {
        self.fields[name]
            .as_str()
            .map(ToString::to_string)
            .with_context(|| format!("transaction field '{name}' is missing or not a string"))
    }

    fn field_name_str(&self, name: &str) -> Result<String> {
        self.fields[name]["name"]
            .as_str()
            .map(ToString::to_string)
            .with_context(|| format!("transaction field '{name}.name' is missing or not a string"))
    }
}

/// Classify a task transaction.
pub fn task(raw: &RawTransaction) -> Result<Vec<Transaction>> {
    let classified = match raw.kind() {
        "create" => vec![TaskTransaction::Create {
            author: raw.author.clone(),
            task: raw.object.clone(),
        }],

        "comment" => raw
            .live_comments()
            .map(|comment| TaskTransaction::AddComment {
                author: raw.author.clone(),
                task: raw.object.clone(),
                comment: comment.to_string(),
            })
            .collect(),

        // An owner change where the author takes the task is a claim;
        // anything else is an assignment (possibly to nobody).
        "owner" => {
            let new_owner = raw.fields["new"].as_str();
            if new_owner == Some(raw.author.as_str()) {
                vec![TaskTransaction::Claim {
                    author: raw.author.clone(),
                    task: raw.object.clone(),
                }]
            } else {
                vec![TaskTransaction::Assign {
                    author: raw.author.clone(),
                    task: raw.object.clone(),
                    assignee: new_owner.map(ToString::to_string),
                }]
            }
        }

        "status" => vec![TaskTransaction::ChangeStatus {
            author: raw.author.clone(),
            task: raw.object.clone(),
            old: raw.field_str("old")?,
            new: raw.field_str("new")?,
        }],

        "priority" => vec![TaskTransaction::ChangePriority {
            author: raw.author.clone(),
            task: raw.object.clone(),
            old: raw.field_name_str("old")?,
            new: raw.field_name_str("new")?,
        }],

        kind => {
            debug!(kind, "No message will be generated for task transaction");
            vec![]
        }
    };

    Ok(classified.into_iter().map(Transaction::Task).collect())
}

/// Classify a revision transaction. `repo` is the name of the repository the
/// revision belongs to, used for channel routing downstream.
pub fn diff(raw: &RawTransaction, repo: &str) -> Result<Vec<Transaction>> {
    let plain = |build: fn(String, String, String) -> DiffTransaction| {
        vec![build(
            raw.author.clone(),
            raw.object.clone(),
            repo.to_string(),
        )]
    };

    let classified = match raw.kind() {
        "create" => plain(|author, diff, repo| DiffTransaction::Create { author, diff, repo }),

        "comment" | "inline" => raw
            .live_comments()
            .map(|comment| DiffTransaction::AddComment {
                author: raw.author.clone(),
                diff: raw.object.clone(),
                repo: repo.to_string(),
                comment: comment.to_string(),
            })
            .collect(),

        "update" => plain(|author, diff, repo| DiffTransaction::Update { author, diff, repo }),
        "abandon" => plain(|author, diff, repo| DiffTransaction::Abandon { author, diff, repo }),
        "reclaim" => plain(|author, diff, repo| DiffTransaction::Reclaim { author, diff, repo }),
        "accept" => plain(|author, diff, repo| DiffTransaction::Accept { author, diff, repo }),
        "request-changes" => {
            plain(|author, diff, repo| DiffTransaction::RequestChanges { author, diff, repo })
        }
        "commandeer" => {
            plain(|author, diff, repo| DiffTransaction::Commandeer { author, diff, repo })
        }

        kind => {
            debug!(kind, "No message will be generated for revision transaction");
            vec![]
        }
    };

    Ok(classified.into_iter().map(Transaction::Diff).collect())
}

/// Classify a commit transaction.
pub fn commit(raw: &RawTransaction, repo: &str) -> Result<Vec<Transaction>> {
    let classified: Vec<_> = match raw.kind() {
        "comment" => raw
            .live_comments()
            .map(|comment| CommitTransaction::AddComment {
                author: raw.author.clone(),
                commit: raw.object.clone(),
                repo: repo.to_string(),
                comment: comment.to_string(),
            })
            .collect(),

        kind => {
            debug!(kind, "No message will be generated for commit transaction");
            vec![]
        }
    };

    Ok(classified.into_iter().map(Transaction::Commit).collect())
}

/// Classify a project transaction.
pub fn project(raw: &RawTransaction) -> Result<Vec<Transaction>> {
    let classified = match raw.kind() {
        "create" => vec![ProjectTransaction::Create {
            author: raw.author.clone(),
            project: raw.object.clone(),
        }],
        kind => {
            debug!(kind, "No message will be generated for project transaction");
            vec![]
        }
    };

    Ok(classified.into_iter().map(Transaction::Project).collect())
}

/// Classify a repository transaction.
pub fn repository(raw: &RawTransaction) -> Result<Vec<Transaction>> {
    let classified = match raw.kind() {
        "create" => vec![RepoTransaction::Create {
            author: raw.author.clone(),
            repo: raw.object.clone(),
        }],
        kind => {
            debug!(kind, "No message will be generated for repository transaction");
            vec![]
        }
    };

    Ok(classified.into_iter().map(Transaction::Repo).collect())
}
