//! The rendering rule set: one function per object type, exhaustive over the
//! transaction union. Adding a subtype without a rule is a compile error.

use std::sync::Arc;

use anyhow::Result;

use crate::directory::{ResolvedUser, UserDirectory};
use crate::error::RelayError;
use crate::events::{
    CommitTransaction, DiffTransaction, ObjectKind, OutboundMessage, ProjectTransaction,
    RepoTransaction, TaskTransaction, Transaction,
};
use crate::mentions::MentionResolver;
use crate::routing::ChannelRouter;
use crate::traits::TransactionSource;

/// Renders enriched transactions into outbound messages.
pub struct Renderer {
    source: Arc<dyn TransactionSource>,
    directory: Arc<UserDirectory>,
    router: Arc<ChannelRouter>,
    mentions: MentionResolver,
}

impl Renderer {
    #[must_use]
    pub fn new(
        source: Arc<dyn TransactionSource>,
        directory: Arc<UserDirectory>,
        router: Arc<ChannelRouter>,
    ) -> Self {
        Self {
            source,
            directory,
            router,
            mentions: MentionResolver::new(),
        }
    }

    /// Render one transaction under the renderer registered for `kind`.
    ///
    /// Returns `None` when the transaction does not belong to that object
    /// type's rule set; the dispatcher turns that into a debug note.
    ///
    /// # Errors
    ///
    /// Any unresolvable author, owner, or assignee identity, and any tracker
    /// lookup failure, aborts rendering; the dispatcher reports it once for
    /// the whole request.
    pub async fn render(
        &self,
        kind: ObjectKind,
        tx: &Transaction,
    ) -> Result<Option<OutboundMessage>> {
        let message = match (kind, tx) {
            (ObjectKind::Task, Transaction::Task(tx)) => self.render_task(tx).await?,
            (ObjectKind::Diff, Transaction::Diff(tx)) => self.render_diff(tx).await?,
            (ObjectKind::Commit, Transaction::Commit(tx)) => self.render_commit(tx).await?,
            (ObjectKind::Project, Transaction::Project(tx)) => self.render_project(tx).await?,
            (ObjectKind::Repo, Transaction::Repo(tx)) => self.render_repo(tx).await?,
            _ => return Ok(None),
        };
        Ok(Some(message))
    }

    async fn render_task(&self, tx: &TaskTransaction) -> Result<OutboundMessage> {
        let link = self.source.link(tx.task()).await?;
        let author = self.user(tx.author())?;
        let owner = match self.source.owner(tx.task()).await? {
            Some(phid) => Some(self.user(&phid)?),
            None => None,
        };

        let text = match tx {
            TaskTransaction::Create { .. } => {
                format!("User {} created task {link}", author.username)
            }

            TaskTransaction::AddComment { comment, .. } => {
                let comment = self.mentions.resolve(&self.directory, comment);
                let text = format!(
                    "User {} commented on task {link} with: {comment}",
                    author.username
                );
                prefix_for(owner, author).map_or_else(|| text.clone(), |m| format!("{m} {text}"))
            }

            TaskTransaction::Claim { .. } => {
                format!("User {} claimed task {link}", author.username)
            }

            TaskTransaction::Assign { assignee, .. } => {
                let assignee = match assignee {
                    Some(phid) => mention_or_name(self.user(phid)?),
                    None => "nobody".to_string(),
                };
                format!(
                    "User {} assigned {assignee} to task {link}",
                    author.username
                )
            }

            TaskTransaction::ChangeStatus { old, new, .. } => {
                let text = format!(
                    "User {} changed the status of task {link} from {old} to {new}",
                    author.username
                );
                prefix_for(owner, author).map_or_else(|| text.clone(), |m| format!("{m} {text}"))
            }

            TaskTransaction::ChangePriority { old, new, .. } => {
                let text = format!(
                    "User {} changed the priority of task {link} from {old} to {new}",
                    author.username
                );
                prefix_for(owner, author).map_or_else(|| text.clone(), |m| format!("{m} {text}"))
            }
        };

        Ok(OutboundMessage::plain(text))
    }

    async fn render_diff(&self, tx: &DiffTransaction) -> Result<OutboundMessage> {
        let link = self.source.link(tx.diff()).await?;
        let author = self.user(tx.author())?;
        let owner_phid = self
            .source
            .owner(tx.diff())
            .await?
            .ok_or_else(|| RelayError::MissingOwner(tx.diff().to_string()))?;
        let owner = self.user(&owner_phid)?;
        let channel = self.router.channel_for(tx.repo()).to_string();

        let text = match tx {
            DiffTransaction::Create { .. } => {
                format!("User {} created diff {link}", author.username)
            }

            DiffTransaction::AddComment { comment, .. } => {
                let comment = self.mentions.resolve(&self.directory, comment);
                let text = format!(
                    "User {} commented on diff {link} with {comment}",
                    author.username
                );
                prefix_for(Some(owner), author)
                    .map_or_else(|| text.clone(), |m| format!("{m} {text}"))
            }

            DiffTransaction::Update { .. } => {
                format!("User {} updated diff {link}", author.username)
            }

            DiffTransaction::Abandon { .. } => {
                format!("User {} abandoned diff {link}", author.username)
            }

            DiffTransaction::Reclaim { .. } => {
                format!("User {} reclaimed diff {link}", author.username)
            }

            // Review verdicts always lead with the owner's mention, even when
            // the owner reviews their own revision.
            DiffTransaction::Accept { .. } => {
                format!(
                    "{} User {} accepted diff {link}",
                    mention_or_name(owner),
                    author.username
                )
            }

            DiffTransaction::RequestChanges { .. } => {
                format!(
                    "{} User {} requested changes to diff {link}",
                    mention_or_name(owner),
                    author.username
                )
            }

            DiffTransaction::Commandeer { .. } => {
                format!(
                    "{} User {} took command of diff {link}",
                    mention_or_name(owner),
                    author.username
                )
            }
        };

        Ok(OutboundMessage::routed(text, channel))
    }

    async fn render_commit(&self, tx: &CommitTransaction) -> Result<OutboundMessage> {
        let CommitTransaction::AddComment {
            author,
            commit,
            repo,
            ..
        } = tx;
        let link = self.source.link(commit).await?;
        let author = self.user(author)?;
        let channel = self.router.channel_for(repo).to_string();

        Ok(OutboundMessage::routed(
            format!(
                "User {} created commit {link} on repository {repo}",
                author.username
            ),
            channel,
        ))
    }

    async fn render_project(&self, tx: &ProjectTransaction) -> Result<OutboundMessage> {
        let ProjectTransaction::Create { author, project } = tx;
        let link = self.source.link(project).await?;
        let author = self.user(author)?;

        Ok(OutboundMessage::plain(format!(
            "User {} created project {link}",
            author.username
        )))
    }

    async fn render_repo(&self, tx: &RepoTransaction) -> Result<OutboundMessage> {
        let RepoTransaction::Create { author, repo } = tx;
        let link = self.source.link(repo).await?;
        let author = self.user(author)?;

        Ok(OutboundMessage::plain(format!(
            "User {} created repository {link}",
            author.username
        )))
    }

    /// Resolve an identity or fail the request.
    fn user(&self, phid: &str) -> Result<&ResolvedUser> {
        self.directory
            .get(phid)
            .ok_or_else(|| RelayError::UnknownUser(phid.to_string()).into())
    }
}

/// Owner prefix for conditional-prefix rules: only when an owner exists and
/// the author is someone else.
fn prefix_for<'a>(owner: Option<&'a ResolvedUser>, author: &ResolvedUser) -> Option<String> {
    let owner = owner?;
    if owner.phid == author.phid {
        return None;
    }
    Some(mention_or_name(owner))
}

/// Chat mention, or the tracker username when the user has no chat account.
fn mention_or_name(user: &ResolvedUser) -> String {
    user.slack_id
        .as_ref()
        .map_or_else(|| format!("@{}", user.username), |id| format!("<@{id}>"))
}
