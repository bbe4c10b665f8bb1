//! Posts a delivery summary to a Mattermost incoming webhook.

use async_trait::async_trait;
use consign_model::{CallbackConfig, DeliveryResult};
use serde::Serialize;
use tracing::info;

use super::{CallbackError, CallbackResult, DeliveryCallback, option_str, required_str};

const NAME: &str = "mattermost";
const DEFAULT_USERNAME: &str = "Delivery Bot";
const COLOR_COMPLETE: &str = "#00FF00";
const COLOR_PARTIAL: &str = "#FF0000";

/// Webhook notifier.
///
/// Options: `webhook_url` (required), `channel`, `username` (default "Delivery Bot"),
/// `icon_url`.
#[derive(Debug, Clone)]
pub struct MattermostCallback {
    client: reqwest::Client,
}

impl MattermostCallback {
    /// Notifier sending through `client`.
    #[must_use]
    pub const fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<&'a str>,
    username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon_url: Option<&'a str>,
    text: String,
    attachments: [Attachment<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Attachment<'a> {
    fallback: &'a str,
    color: &'static str,
    fields: [Field<'a>; 2],
}

#[derive(Debug, Serialize)]
struct Field<'a> {
    short: bool,
    title: &'static str,
    value: &'a str,
}

fn payload<'a>(result: &'a DeliveryResult, config: &'a CallbackConfig) -> WebhookPayload<'a> {
    let text = format!(
        "### Delivery Update: {}\n**Status:** {}\n**Manifest:** `{}`\n**Path:** `{}`",
        result.package_name, result.summary, result.manifest_path, result.delivery_path
    );
    let color = if result.is_complete() {
        COLOR_COMPLETE
    } else {
        COLOR_PARTIAL
    };
    WebhookPayload {
        channel: option_str(config, "channel"),
        username: option_str(config, "username").unwrap_or(DEFAULT_USERNAME),
        icon_url: option_str(config, "icon_url"),
        text,
        attachments: [Attachment {
            fallback: &result.summary,
            color,
            fields: [
                Field {
                    short: true,
                    title: "Package",
                    value: &result.package_name,
                },
                Field {
                    short: true,
                    title: "Timestamp",
                    value: &result.timestamp,
                },
            ],
        }],
    }
}

#[async_trait]
impl DeliveryCallback for MattermostCallback {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn invoke(
        &self,
        result: &DeliveryResult,
        config: &CallbackConfig,
        dry_run: bool,
    ) -> CallbackResult<()> {
        let webhook_url = required_str(NAME, config, "webhook_url")?;
        let body = payload(result, config);

        if dry_run {
            info!(
                channel = body.channel.unwrap_or("<default>"),
                package = %result.package_name,
                "dry run: mattermost notification not sent"
            );
            return Ok(());
        }

        let response = self
            .client
            .post(webhook_url)
            .json(&body)
            .send()
            .await
            .map_err(|source| CallbackError::Http {
                callback: NAME,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CallbackError::Status {
                callback: NAME,
                status: status.as_u16(),
            });
        }
        info!(package = %result.package_name, "mattermost notification sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use consign_model::ItemResult;
    use httpmock::prelude::*;
    use serde_json::{Value, json};

    fn config(value: &Value) -> CallbackConfig {
        value.as_object().cloned().unwrap_or_default()
    }

    fn result(success: bool) -> DeliveryResult {
        let results = vec![if success {
            ItemResult::succeeded("/src/a.mov", "/out/PKG/a.mov", None)
        } else {
            ItemResult::failed("/src/a.mov", "", None, "source not found")
        }];
        DeliveryResult {
            package_name: "PKG".into(),
            delivery_path: "/out/PKG".into(),
            manifest_path: "/out/PKG/manifest.md".into(),
            timestamp: "2024-05-01 10:00:00".into(),
            summary: consign_model::summarize(&results),
            results,
        }
    }

    #[test]
    fn payload_reflects_completeness() -> Result<()> {
        let cfg = config(&json!({ "channel": "deliveries" }));
        let complete = result(true);
        let value = serde_json::to_value(payload(&complete, &cfg))?;
        assert_eq!(value["channel"], "deliveries");
        assert_eq!(value["username"], DEFAULT_USERNAME);
        assert!(value.get("icon_url").is_none());
        assert_eq!(value["attachments"][0]["color"], COLOR_COMPLETE);
        assert_eq!(value["attachments"][0]["fallback"], "Delivered 1 of 1 files.");
        assert_eq!(value["attachments"][0]["fields"][0]["value"], "PKG");
        assert!(
            value["text"]
                .as_str()
                .is_some_and(|text| text.contains("/out/PKG/manifest.md"))
        );

        let partial = result(false);
        let value = serde_json::to_value(payload(&partial, &cfg))?;
        assert_eq!(value["attachments"][0]["color"], COLOR_PARTIAL);
        Ok(())
    }

    #[tokio::test]
    async fn posts_to_webhook() -> Result<()> {
        let server = MockServer::start_async().await;
        let cfg = config(&json!({
            "webhook_url": server.url("/hooks/abc"),
            "channel": "vfx",
            "username": "Pipeline",
        }));
        let delivered = result(true);
        let expected = serde_json::to_value(payload(&delivered, &cfg))?;
        assert_eq!(expected["username"], "Pipeline");
        let mock = server.mock(move |when, then| {
            when.method(POST).path("/hooks/abc").json_body(expected);
            then.status(200);
        });

        MattermostCallback::new(reqwest::Client::new())
            .invoke(&delivered, &cfg, false)
            .await?;
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn rejected_status_is_an_error() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/hooks/abc");
            then.status(500);
        });
        let cfg = config(&json!({ "webhook_url": server.url("/hooks/abc") }));

        let err = MattermostCallback::new(reqwest::Client::new())
            .invoke(&result(true), &cfg, false)
            .await
            .err();
        assert!(matches!(err, Some(CallbackError::Status { status: 500, .. })));
        Ok(())
    }

    #[tokio::test]
    async fn dry_run_sends_nothing() -> Result<()> {
        let cfg = config(&json!({ "webhook_url": "http://127.0.0.1:9/unreachable" }));

        MattermostCallback::new(reqwest::Client::new())
            .invoke(&result(true), &cfg, true)
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn missing_webhook_is_rejected() {
        let err = MattermostCallback::new(reqwest::Client::new())
            .invoke(&result(true), &CallbackConfig::new(), true)
            .await
            .err();
        assert!(matches!(
            err,
            Some(CallbackError::MissingOption {
                field: "webhook_url",
                ..
            })
        ));
    }
}
