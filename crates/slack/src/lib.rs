//! Slack Web API client for the firehose relay.
//!
//! Wraps the two endpoints the relay needs: `users.list` to build the user
//! directory, and `chat.postMessage` for delivery. Messages are posted as a
//! single attachment whose color encodes the severity. Delivery failures are
//! logged and dropped: the [`firehose::Notifier`] contract absorbs them so
//! the core never retries and never sees a delivery error.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use firehose::{Notifier, OutboundMessage};

const SLACK_API_URL: &str = "https://slack.com/api";

/// Slack Web API client.
#[derive(Debug, Clone)]
pub struct SlackClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
    default_channel: String,
}

#[derive(Debug, Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    attachments: [Attachment<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Attachment<'a> {
    color: &'static str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsersListResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    members: Vec<Member>,
}

#[derive(Debug, Deserialize)]
struct Member {
    id: String,
    #[serde(default)]
    real_name: Option<String>,
    #[serde(default)]
    is_bot: bool,
    #[serde(default)]
    deleted: bool,
}

impl SlackClient {
    /// Create a client posting to the given default channel.
    ///
    /// # Errors
    ///
    /// Fails when the token is empty or the HTTP client cannot be built.
    pub fn new(token: &str, default_channel: &str) -> Result<Self> {
        if token.is_empty() {
            bail!("Can't find a token to connect to Slack");
        }

        let client = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_url: SLACK_API_URL.to_string(),
            token: token.to_string(),
            default_channel: default_channel.to_string(),
        })
    }

    /// Point the client at a different API base URL (tests).
    #[must_use]
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    /// Workspace members by real name: `{real_name: user_id}`.
    ///
    /// Requires the `users:read` scope. Bots, deleted users, and members
    /// without a real name are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error when the API call fails or Slack answers non-`ok`.
    pub async fn users(&self) -> Result<HashMap<String, String>> {
        info!("Fetching user list from Slack");

        let response: UsersListResponse = self
            .client
            .get(format!("{}/users.list", self.api_url))
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Failed to reach Slack")?
            .json()
            .await
            .context("Failed to parse users.list response")?;

        if !response.ok {
            bail!(
                "Couldn't retrieve user list from Slack: {}",
                response.error.unwrap_or_default()
            );
        }

        Ok(response
            .members
            .into_iter()
            .filter(|member| !member.is_bot && !member.deleted)
            .filter_map(|member| member.real_name.map(|name| (name, member.id)))
            .collect())
    }

    /// Post one message via `chat.postMessage`.
    ///
    /// Requires the `chat:write` scope. Messages without a channel override
    /// go to the configured default channel.
    ///
    /// # Errors
    ///
    /// Returns an error when the API call fails or Slack answers non-`ok`.
    pub async fn post_message(&self, message: &OutboundMessage) -> Result<()> {
        let channel = message.channel.as_deref().unwrap_or(&self.default_channel);
        let request = PostMessageRequest {
            channel,
            attachments: [Attachment {
                color: message.severity.color(),
                text: &message.text,
            }],
        };

        let response: ApiResponse = self
            .client
            .post(format!("{}/chat.postMessage", self.api_url))
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .context("Failed to reach Slack")?
            .json()
            .await
            .context("Failed to parse chat.postMessage response")?;

        if !response.ok {
            bail!(
                "Slack rejected the message: {}",
                response.error.unwrap_or_default()
            );
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for SlackClient {
    async fn notify(&self, message: OutboundMessage) {
        if let Err(err) = self.post_message(&message).await {
            error!(
                error = %err,
                text = %message.text,
                "Couldn't send message to Slack, dropping it"
            );
        }
    }
}
