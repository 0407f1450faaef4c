//! Conduit API client.

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use firehose::{ObjectKind, Transaction, TransactionSource};

use crate::classify;
use crate::classify::RawTransaction;

const TASK_PHID: &str = "PHID-TASK-";
const DREV_PHID: &str = "PHID-DREV-";
const CMIT_PHID: &str = "PHID-CMIT-";
const PROJ_PHID: &str = "PHID-PROJ-";
const REPO_PHID: &str = "PHID-REPO-";

/// An error reported by the Conduit API itself (as opposed to transport).
#[derive(Debug, Error)]
#[error("Conduit error {code}: {info}")]
pub struct ConduitError {
    pub code: String,
    pub info: String,
}

/// Client for the Phabricator Conduit API.
#[derive(Debug, Clone)]
pub struct PhabClient {
    client: reqwest::Client,
    url: String,
    token: String,
}

/// Envelope every Conduit response arrives in.
#[derive(Debug, Deserialize)]
struct ConduitResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_info: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchData<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    phid: String,
    #[serde(rename = "type")]
    kind: String,
    fields: UserFields,
}

#[derive(Debug, Deserialize)]
struct UserFields {
    username: String,
    #[serde(rename = "realName")]
    real_name: String,
    #[serde(default)]
    roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TaskRecord {
    id: u64,
    fields: TaskFields,
}

#[derive(Debug, Deserialize)]
struct TaskFields {
    name: String,
    #[serde(rename = "ownerPHID", default)]
    owner_phid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RevisionRecord {
    id: u64,
    fields: RevisionFields,
}

#[derive(Debug, Deserialize)]
struct RevisionFields {
    title: String,
    #[serde(rename = "authorPHID", default)]
    author_phid: Option<String>,
    #[serde(rename = "repositoryPHID", default)]
    repository_phid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProjectRecord {
    id: u64,
    fields: NamedFields,
}

#[derive(Debug, Deserialize)]
struct RepoRecord {
    id: u64,
    fields: NamedFields,
}

#[derive(Debug, Deserialize)]
struct NamedFields {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CommitQueryData {
    data: HashMap<String, CommitRecord>,
}

#[derive(Debug, Deserialize)]
struct CommitRecord {
    summary: String,
    uri: String,
    #[serde(rename = "repositoryPHID", default)]
    repository_phid: Option<String>,
}

impl PhabClient {
    /// Create a client for the given install.
    ///
    /// # Errors
    ///
    /// Fails when the URL or token is empty, or when the HTTP client cannot
    /// be built.
    pub fn new(url: &str, token: &str) -> Result<Self> {
        if url.is_empty() {
            bail!("Can't find a URL to connect to Phabricator");
        }
        if token.is_empty() {
            bail!("Can't find a token to connect to Phabricator");
        }

        let client = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Health check against `conduit.ping`; verifies URL and token.
    ///
    /// # Errors
    ///
    /// Returns an error when the install is unreachable or rejects the token.
    pub async fn ping(&self) -> Result<()> {
        self.call("conduit.ping", json!({}))
            .await
            .context("Phabricator health check failed")?;
        Ok(())
    }

    /// Active human users: `{phid: (username, real_name)}`.
    ///
    /// # Errors
    ///
    /// Returns an error when the API call fails.
    pub async fn users(&self) -> Result<HashMap<String, (String, String)>> {
        info!("Fetching user list from Phabricator");

        let result = self.call("user.search", json!({})).await?;
        let parsed: SearchData<UserRecord> =
            serde_json::from_value(result).context("Failed to parse user.search response")?;

        Ok(parsed
            .data
            .into_iter()
            .filter(|user| {
                user.kind == "USER"
                    && !user
                        .fields
                        .roles
                        .iter()
                        .any(|role| role == "disabled" || role == "bot")
            })
            .map(|user| (user.phid, (user.fields.username, user.fields.real_name)))
            .collect())
    }

    /// Fetch and classify the named transactions.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failures or malformed records. A
    /// Conduit "not implemented" API error yields an empty list instead: some
    /// applications do not implement `transaction.search`.
    pub async fn transactions(
        &self,
        kind: ObjectKind,
        object_phid: &str,
        tx_phids: &[String],
    ) -> Result<Vec<Transaction>> {
        let params = json!({
            "objectIdentifier": object_phid,
            "constraints": {"phids": tx_phids},
        });

        let result = match self.call("transaction.search", params).await {
            Ok(result) => result,
            Err(err) => {
                let unimplemented = err
                    .downcast_ref::<ConduitError>()
                    .is_some_and(|conduit| conduit.info.contains("not implemented"));
                if unimplemented {
                    warn!(error = %err, "Unimplemented method in Phabricator");
                    return Ok(vec![]);
                }
                return Err(err);
            }
        };

        let parsed: SearchData<RawTransaction> = serde_json::from_value(result)
            .context("Failed to parse transaction.search response")?;

        let mut classified = Vec::new();
        for raw in &parsed.data {
            debug!(kind = ?raw.kind, object = %raw.object, "Classifying transaction");

            classified.extend(match kind {
                ObjectKind::Task => classify::task(raw)?,
                ObjectKind::Diff => {
                    let repo = self.repo_name_for(&raw.object).await?;
                    classify::diff(raw, &repo)?
                }
                ObjectKind::Commit => {
                    let repo = self.repo_name_for(&raw.object).await?;
                    classify::commit(raw, &repo)?
                }
                ObjectKind::Project => classify::project(raw)?,
                ObjectKind::Repo => classify::repository(raw)?,
            });
        }

        Ok(classified)
    }

    /// Permalink for a task, revision, project, repository, or commit, in
    /// chat link syntax.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown PHIDs or PHID kinds without a permalink
    /// rule.
    pub async fn link(&self, phid: &str) -> Result<String> {
        if phid.starts_with(TASK_PHID) {
            let task: TaskRecord = self.search_one("maniphest.search", phid).await?;
            return Ok(format!(
                "<{url}/T{id}|T{id}>: {name}",
                url = self.url,
                id = task.id,
                name = task.fields.name
            ));
        }

        if phid.starts_with(DREV_PHID) {
            let revision: RevisionRecord =
                self.search_one("differential.revision.search", phid).await?;
            return Ok(format!(
                "<{url}/D{id}|D{id}>: {title}",
                url = self.url,
                id = revision.id,
                title = revision.fields.title
            ));
        }

        if phid.starts_with(PROJ_PHID) {
            let project: ProjectRecord = self.search_one("project.search", phid).await?;
            return Ok(format!(
                "<{url}/project/view/{id}|{name}>",
                url = self.url,
                id = project.id,
                name = project.fields.name
            ));
        }

        if phid.starts_with(REPO_PHID) {
            let repo: RepoRecord = self.search_one("diffusion.repository.search", phid).await?;
            return Ok(format!(
                "<{url}/source/{id}|{name}>",
                url = self.url,
                id = repo.id,
                name = repo.fields.name
            ));
        }

        if phid.starts_with(CMIT_PHID) {
            let commit = self.commit(phid).await?;
            return Ok(format!("<{}|{}>", commit.uri, commit.summary));
        }

        bail!("no permalink rule for {phid}")
    }

    /// Owner of a task (`ownerPHID`) or revision (`authorPHID`); `None` for
    /// everything else.
    ///
    /// # Errors
    ///
    /// Returns an error when the lookup fails.
    pub async fn owner(&self, phid: &str) -> Result<Option<String>> {
        if phid.starts_with(TASK_PHID) {
            let task: TaskRecord = self.search_one("maniphest.search", phid).await?;
            return Ok(task.fields.owner_phid);
        }

        if phid.starts_with(DREV_PHID) {
            let revision: RevisionRecord =
                self.search_one("differential.revision.search", phid).await?;
            return Ok(revision.fields.author_phid);
        }

        Ok(None)
    }

    /// Name of the repository a revision or commit belongs to.
    async fn repo_name_for(&self, phid: &str) -> Result<String> {
        let repo_phid = if phid.starts_with(DREV_PHID) {
            let revision: RevisionRecord =
                self.search_one("differential.revision.search", phid).await?;
            revision.fields.repository_phid
        } else if phid.starts_with(CMIT_PHID) {
            self.commit(phid).await?.repository_phid
        } else {
            None
        };

        let repo_phid =
            repo_phid.with_context(|| format!("{phid} is not attached to a repository"))?;
        let repo: RepoRecord = self
            .search_one("diffusion.repository.search", &repo_phid)
            .await?;
        Ok(repo.fields.name)
    }

    async fn commit(&self, phid: &str) -> Result<CommitRecord> {
        let result = self
            .call("diffusion.querycommits", json!({"phids": [phid]}))
            .await?;
        let mut parsed: CommitQueryData = serde_json::from_value(result)
            .context("Failed to parse diffusion.querycommits response")?;
        parsed
            .data
            .remove(phid)
            .with_context(|| format!("diffusion.querycommits returned no record for {phid}"))
    }

    /// Search endpoints all share the by-PHID constraint shape; fetch the
    /// single matching record.
    async fn search_one<T: DeserializeOwned>(&self, method: &str, phid: &str) -> Result<T> {
        let result = self
            .call(method, json!({"constraints": {"phids": [phid]}}))
            .await?;
        let parsed: SearchData<T> = serde_json::from_value(result)
            .with_context(|| format!("Failed to parse {method} response"))?;
        parsed
            .data
            .into_iter()
            .next()
            .with_context(|| format!("{method} returned no record for {phid}"))
    }

    async fn call(&self, method: &str, mut params: Value) -> Result<Value> {
        let url = format!("{}/api/{}", self.url, method);

        params["__conduit__"] = json!({"token": self.token});
        let form = [
            ("params", serde_json::to_string(&params)?),
            ("output", "json".to_string()),
        ];

        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .with_context(|| format!("Failed to reach Conduit at {url}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Conduit HTTP error: {status} - {body}");
        }

        let body: ConduitResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse Conduit response from {method}"))?;

        if let Some(code) = body.error_code {
            return Err(ConduitError {
                code,
                info: body.error_info.unwrap_or_default(),
            }
            .into());
        }

        Ok(body.result.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl TransactionSource for PhabClient {
    async fn transactions(
        &self,
        kind: ObjectKind,
        object_phid: &str,
        tx_phids: &[String],
    ) -> Result<Vec<Transaction>> {
        Self::transactions(self, kind, object_phid, tx_phids).await
    }

    async fn link(&self, phid: &str) -> Result<String> {
        Self::link(self, phid).await
    }

    async fn owner(&self, phid: &str) -> Result<Option<String>> {
        Self::owner(self, phid).await
    }
}
