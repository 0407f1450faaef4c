//! Request orchestration: enrich, render, deliver, and the single
//! error-report path that keeps failures away from the webhook caller.

use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, error};

use crate::directory::UserDirectory;
use crate::events::{FirehosePayload, ObjectKind, OutboundMessage, Severity};
use crate::render::Renderer;
use crate::routing::ChannelRouter;
use crate::traits::{Notifier, TransactionSource};

/// Orchestrates one webhook request end to end.
///
/// All collaborators are injected at construction and shared immutably;
/// concurrent `handle` calls are safe without locking.
pub struct Dispatcher {
    source: Arc<dyn TransactionSource>,
    notifier: Arc<dyn Notifier>,
    router: Arc<ChannelRouter>,
    renderer: Renderer,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        source: Arc<dyn TransactionSource>,
        notifier: Arc<dyn Notifier>,
        directory: Arc<UserDirectory>,
        router: Arc<ChannelRouter>,
    ) -> Self {
        let renderer = Renderer::new(Arc::clone(&source), directory, Arc::clone(&router));
        Self {
            source,
            notifier,
            router,
            renderer,
        }
    }

    /// Handle one webhook request.
    ///
    /// Never fails: any internal error aborts the remaining transactions of
    /// this request and is converted into a single error-severity
    /// notification instead of propagating to the HTTP boundary.
    pub async fn handle(&self, payload: &Value) {
        if let Err(err) = self.process(payload).await {
            self.report_failure(payload, &err).await;
        }
    }

    async fn process(&self, raw: &Value) -> Result<()> {
        let payload: FirehosePayload = serde_json::from_value(raw.clone())?;

        debug!(
            object_type = %payload.object.kind,
            object_phid = %payload.object.phid,
            transactions = payload.transactions.len(),
            "Incoming firehose request"
        );

        let Some(kind) = ObjectKind::from_type_tag(&payload.object.kind) else {
            for tx in &payload.transactions {
                self.debug_note(format!(
                    "No message will be generated for {} transaction {}:\n{raw:#}",
                    payload.object.kind, tx.phid
                ))
                .await;
            }
            return Ok(());
        };

        let tx_phids: Vec<String> = payload
            .transactions
            .iter()
            .map(|tx| tx.phid.clone())
            .collect();

        let transactions = self
            .source
            .transactions(kind, &payload.object.phid, &tx_phids)
            .await?;

        for tx in &transactions {
            match self.renderer.render(kind, tx).await? {
                Some(message) => {
                    debug!(text = %message.text, channel = ?message.channel, "Rendered message");
                    self.notifier.notify(message).await;
                }
                None => {
                    let rendered = serde_json::to_string_pretty(tx)
                        .unwrap_or_else(|_| format!("{tx:?}"));
                    self.debug_note(format!("No message will be generated for: {rendered}"))
                        .await;
                }
            }
        }

        Ok(())
    }

    /// Note a skipped event on the debug sink, if one is configured.
    async fn debug_note(&self, text: String) {
        debug!(%text, "Skipped event");
        if let Some(channel) = self.router.debug_channel() {
            self.notifier
                .notify(OutboundMessage {
                    text,
                    channel: Some(channel.to_string()),
                    severity: Severity::Info,
                })
                .await;
        }
    }

    /// The only path that produces an error-severity message.
    async fn report_failure(&self, payload: &Value, err: &anyhow::Error) {
        error!(error = %err, "Request failed; reporting through the notifier");

        // Best effort: fall back to the in-memory form if the payload will
        // not serialize.
        let payload = serde_json::to_string(payload).unwrap_or_else(|_| format!("{payload:?}"));

        let text = format!(
            "*Error in relay:* {err:#}\n*Original message:* {payload}\n*Backtrace:*\n{}",
            err.backtrace()
        );

        self.notifier
            .notify(OutboundMessage {
                text,
                channel: None,
                severity: Severity::Error,
            })
            .await;
    }
}
