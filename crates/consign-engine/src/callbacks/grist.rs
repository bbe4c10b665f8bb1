//! Marks the package record in a Grist tracking table as delivered or failed.

use async_trait::async_trait;
use consign_model::{CallbackConfig, DeliveryResult};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::{CallbackError, CallbackResult, DeliveryCallback, option_str, required_str};

const NAME: &str = "grist_update";
const DEFAULT_TABLE: &str = "Packages";

/// Tracking-table updater.
///
/// Options: `server_url`, `api_key`, `doc_id` and `record_id` are required; `table_id` defaults
/// to "Packages".
#[derive(Debug, Clone)]
pub struct GristUpdateCallback {
    client: reqwest::Client,
}

impl GristUpdateCallback {
    /// Updater sending through `client`.
    #[must_use]
    pub const fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[derive(Debug, Serialize)]
struct RecordsPatch<'a> {
    records: [RecordPatch<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RecordPatch<'a> {
    id: u64,
    fields: RecordFields<'a>,
}

#[derive(Debug, Serialize)]
struct RecordFields<'a> {
    #[serde(rename = "Status")]
    status: &'static str,
    #[serde(rename = "Path_to_Delivery_Folder")]
    delivery_path: &'a str,
    #[serde(rename = "Description")]
    description: &'a str,
}

/// Validated options for one invocation.
#[derive(Debug)]
struct Target<'a> {
    endpoint: String,
    api_key: &'a str,
    record_id: u64,
}

impl<'a> Target<'a> {
    fn from_config(config: &'a CallbackConfig) -> CallbackResult<Self> {
        let server_url = required_str(NAME, config, "server_url")?;
        let api_key = required_str(NAME, config, "api_key")?;
        let doc_id = required_str(NAME, config, "doc_id")?;
        let table_id = option_str(config, "table_id").unwrap_or(DEFAULT_TABLE);
        let record_id = record_id(config)?;
        Ok(Self {
            endpoint: format!(
                "{}/api/docs/{doc_id}/tables/{table_id}/records",
                server_url.trim_end_matches('/')
            ),
            api_key,
            record_id,
        })
    }
}

fn record_id(config: &CallbackConfig) -> CallbackResult<u64> {
    let invalid = CallbackError::InvalidOption {
        callback: NAME,
        field: "record_id",
        reason: "not_a_positive_integer",
    };
    match config.get("record_id") {
        None | Some(Value::Null) => Err(CallbackError::MissingOption {
            callback: NAME,
            field: "record_id",
        }),
        Some(Value::Number(number)) => number.as_u64().ok_or(invalid),
        Some(Value::String(text)) => text.trim().parse::<u64>().map_err(|_| invalid),
        Some(_) => Err(invalid),
    }
}

fn status_label(result: &DeliveryResult) -> &'static str {
    if result.is_complete() {
        "Delivered"
    } else {
        "Failed"
    }
}

#[async_trait]
impl DeliveryCallback for GristUpdateCallback {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn invoke(
        &self,
        result: &DeliveryResult,
        config: &CallbackConfig,
        dry_run: bool,
    ) -> CallbackResult<()> {
        let target = Target::from_config(config)?;
        let status = status_label(result);

        if dry_run {
            info!(
                record_id = target.record_id,
                status,
                endpoint = %target.endpoint,
                "dry run: grist record not updated"
            );
            return Ok(());
        }

        let body = RecordsPatch {
            records: [RecordPatch {
                id: target.record_id,
                fields: RecordFields {
                    status,
                    delivery_path: &result.delivery_path,
                    description: &result.summary,
                },
            }],
        };
        let response = self
            .client
            .patch(&target.endpoint)
            .bearer_auth(target.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|source| CallbackError::Http {
                callback: NAME,
                source,
            })?;

        let code = response.status();
        if !code.is_success() {
            return Err(CallbackError::Status {
                callback: NAME,
                status: code.as_u16(),
            });
        }
        info!(record_id = target.record_id, status, "grist record updated");
        Ok(())
    }
}
