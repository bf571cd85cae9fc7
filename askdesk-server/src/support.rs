//! CRM webhook forwarder for escalated support cases.
//!
//! When the assistant cannot answer, the operator flow creates a support
//! case in the CRM via an inbound webhook. The payload follows the CRM's
//! item-creation contract: an entity type id plus a map of custom fields.

use std::time::Duration;

use anyhow::{Context, bail};
use chrono::Utc;
use serde_json::json;
use tracing::warn;

/// Entity type id of the support-case item in the CRM.
const SUPPORT_ENTITY_TYPE_ID: u32 = 155;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the CRM's case-creation webhook.
pub struct SupportWebhook {
    client: reqwest::Client,
    url: String,
}

impl SupportWebhook {
    /// Create a forwarder posting to the given webhook URL.
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build CRM webhook client")?;
        Ok(Self { client, url: url.into() })
    }

    /// Create a support case for the given category and chat link.
    ///
    /// Retries once on a transport error or 5xx, then fails; the caller maps
    /// the failure to a generic response.
    pub async fn create_case(&self, category: &str, chat_link: &str) -> anyhow::Result<()> {
        let payload = json!({
            "entityTypeId": SUPPORT_ENTITY_TYPE_ID,
            "fields": {
                "title": format!("Support request: {category}"),
                "UF_CRM_CATEGORY": category,
                "UF_CRM_CHAT_LINK": chat_link,
                "UF_CRM_STATUS": "Open",
                "UF_CRM_DATETIME": Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            }
        });

        let send = || self.client.post(&self.url).json(&payload).send();

        let response = match send().await {
            Ok(response) if response.status().is_server_error() => {
                warn!(status = %response.status(), "CRM webhook server error, retrying once");
                send().await.context("retried CRM webhook request failed")?
            }
            Ok(response) => response,
            Err(e) if e.is_timeout() || e.is_connect() || e.is_request() => {
                warn!(error = %e, "CRM webhook transport error, retrying once");
                send().await.context("retried CRM webhook request failed")?
            }
            Err(e) => return Err(e).context("CRM webhook request failed"),
        };

        if !response.status().is_success() {
            bail!("CRM webhook returned HTTP {}", response.status());
        }
        Ok(())
    }
}
