//! Payload, transaction, and message types for the relay.

use serde::{Deserialize, Serialize};

/// Raw webhook payload as delivered by a Firehose call.
#[derive(Debug, Clone, Deserialize)]
pub struct FirehosePayload {
    /// The object the transactions apply to.
    pub object: FirehoseObject,
    /// Transaction references; the actual content comes from enrichment.
    #[serde(default)]
    pub transactions: Vec<TransactionRef>,
}

/// Identity of the object a webhook call is about.
#[derive(Debug, Clone, Deserialize)]
pub struct FirehoseObject {
    /// Object type tag, e.g. `TASK` or `DREV`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Object PHID.
    pub phid: String,
}

/// A transaction PHID wrapper from the webhook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionRef {
    pub phid: String,
}

/// The five object types the relay renders messages for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Task,
    Diff,
    Commit,
    Project,
    Repo,
}

impl ObjectKind {
    /// Parse a Firehose object type tag. Unknown tags yield `None` and are
    /// reported through the debug sink rather than rendered.
    #[must_use]
    pub fn from_type_tag(tag: &str) -> Option<Self> {
        match tag {
            "TASK" => Some(Self::Task),
            "DREV" => Some(Self::Diff),
            "CMIT" => Some(Self::Commit),
            "PROJ" => Some(Self::Project),
            "REPO" => Some(Self::Repo),
            _ => None,
        }
    }

    /// The wire tag for this object kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "TASK",
            Self::Diff => "DREV",
            Self::Commit => "CMIT",
            Self::Project => "PROJ",
            Self::Repo => "REPO",
        }
    }
}

/// An enriched transaction, classified into the closed rule set.
///
/// The two-level shape mirrors the rendering table: the outer enum selects the
/// object type, the inner enums are exactly the subtypes that carry a
/// rendering rule. Adding a variant without extending the renderer is a
/// compile error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Transaction {
    Task(TaskTransaction),
    Diff(DiffTransaction),
    Commit(CommitTransaction),
    Project(ProjectTransaction),
    Repo(RepoTransaction),
}

impl Transaction {
    /// The object kind this transaction belongs to.
    #[must_use]
    pub const fn kind(&self) -> ObjectKind {
        match self {
            Self::Task(_) => ObjectKind::Task,
            Self::Diff(_) => ObjectKind::Diff,
            Self::Commit(_) => ObjectKind::Commit,
            Self::Project(_) => ObjectKind::Project,
            Self::Repo(_) => ObjectKind::Repo,
        }
    }
}

/// Task transactions with a rendering rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TaskTransaction {
    #[serde(rename = "task-create")]
    Create { author: String, task: String },
    #[serde(rename = "task-add-comment")]
    AddComment {
        author: String,
        task: String,
        comment: String,
    },
    #[serde(rename = "task-claim")]
    Claim { author: String, task: String },
    #[serde(rename = "task-assign")]
    Assign {
        author: String,
        task: String,
        assignee: Option<String>,
    },
    #[serde(rename = "task-change-status")]
    ChangeStatus {
        author: String,
        task: String,
        old: String,
        new: String,
    },
    #[serde(rename = "task-change-priority")]
    ChangePriority {
        author: String,
        task: String,
        old: String,
        new: String,
    },
}

impl TaskTransaction {
    /// PHID of the task this transaction applies to.
    #[must_use]
    pub fn task(&self) -> &str {
        match self {
            Self::Create { task, .. }
            | Self::AddComment { task, .. }
            | Self::Claim { task, .. }
            | Self::Assign { task, .. }
            | Self::ChangeStatus { task, .. }
            | Self::ChangePriority { task, .. } => task,
        }
    }

    /// PHID of the acting user.
    #[must_use]
    pub fn author(&self) -> &str {
        match self {
            Self::Create { author, .. }
            | Self::AddComment { author, .. }
            | Self::Claim { author, .. }
            | Self::Assign { author, .. }
            | Self::ChangeStatus { author, .. }
            | Self::ChangePriority { author, .. } => author,
        }
    }
}

/// Differential revision transactions with a rendering rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DiffTransaction {
    #[serde(rename = "diff-create")]
    Create {
        author: String,
        diff: String,
        repo: String,
    },
    #[serde(rename = "diff-add-comment")]
    AddComment {
        author: String,
        diff: String,
        repo: String,
        comment: String,
    },
    #[serde(rename = "diff-update")]
    Update {
        author: String,
        diff: String,
        repo: String,
    },
    #[serde(rename = "diff-abandon")]
    Abandon {
        author: String,
        diff: String,
        repo: String,
    },
    #[serde(rename = "diff-reclaim")]
    Reclaim {
        author: String,
        diff: String,
        repo: String,
    },
    #[serde(rename = "diff-accept")]
    Accept {
        author: String,
        diff: String,
        repo: String,
    },
    #[serde(rename = "diff-request-changes")]
    RequestChanges {
        author: String,
        diff: String,
        repo: String,
    },
    #[serde(rename = "diff-commandeer")]
    Commandeer {
        author: String,
        diff: String,
        repo: String,
    },
}

impl DiffTransaction {
    /// PHID of the revision this transaction applies to.
    #[must_use]
    pub fn diff(&self) -> &str {
        match self {
            Self::Create { diff, .. }
            | Self::AddComment { diff, .. }
            | Self::Update { diff, .. }
            | Self::Abandon { diff, .. }
            | Self::Reclaim { diff, .. }
            | Self::Accept { diff, .. }
            | Self::RequestChanges { diff, .. }
            | Self::Commandeer { diff, .. } => diff,
        }
    }

    /// PHID of the acting user.
    #[must_use]
    pub fn author(&self) -> &str {
        match self {
            Self::Create { author, .. }
            | Self::AddComment { author, .. }
            | Self::Update { author, .. }
            | Self::Abandon { author, .. }
            | Self::Reclaim { author, .. }
            | Self::Accept { author, .. }
            | Self::RequestChanges { author, .. }
            | Self::Commandeer { author, .. } => author,
        }
    }

    /// Name of the repository the revision belongs to.
    #[must_use]
    pub fn repo(&self) -> &str {
        match self {
            Self::Create { repo, .. }
            | Self::AddComment { repo, .. }
            | Self::Update { repo, .. }
            | Self::Abandon { repo, .. }
            | Self::Reclaim { repo, .. }
            | Self::Accept { repo, .. }
            | Self::RequestChanges { repo, .. }
            | Self::Commandeer { repo, .. } => repo,
        }
    }
}

/// Commit transactions with a rendering rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CommitTransaction {
    #[serde(rename = "commit-add-comment")]
    AddComment {
        author: String,
        commit: String,
        repo: String,
        comment: String,
    },
}

/// Project transactions with a rendering rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProjectTransaction {
    #[serde(rename = "proj-create")]
    Create { author: String, project: String },
}

/// Repository transactions with a rendering rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RepoTransaction {
    #[serde(rename = "repo-create")]
    Create { author: String, repo: String },
}

/// Presentation category of an outbound notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Plain notification, no visual treatment.
    #[default]
    None,
    Info,
    Warn,
    Error,
    Success,
}

impl Severity {
    /// Slack attachment color for this severity.
    #[must_use]
    pub const fn color(&self) -> &'static str {
        match self {
            Self::None => "#F0F0F0",
            Self::Info => "#28D7E5",
            Self::Warn => "warning",
            Self::Error => "danger",
            Self::Success => "good",
        }
    }
}

/// A rendered notification ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    /// Message text; never empty for a rendered transaction.
    pub text: String,
    /// Channel override; `None` routes to the configured default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Presentation severity.
    pub severity: Severity,
}

impl OutboundMessage {
    /// A plain message for the default channel.
    #[must_use]
    pub fn plain(text: String) -> Self {
        Self {
            text,
            channel: None,
            severity: Severity::None,
        }
    }

    /// A plain message routed to a specific channel.
    #[must_use]
    pub fn routed(text: String, channel: String) -> Self {
        Self {
            text,
            channel: Some(channel),
            severity: Severity::None,
        }
    }

    /// Attach a severity.
    #[must_use]
    pub const fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}
