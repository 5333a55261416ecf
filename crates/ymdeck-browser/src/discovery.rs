//! Page target discovery through the DevTools HTTP endpoint.

use serde::Deserialize;

use crate::error::{refused_by_peer, BrowserError};

/// One entry of the `/json/list` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    pub web_socket_debugger_url: Option<String>,
}

/// List the targets exposed at `http://{host}:{port}/json/list`.
pub async fn list_targets(
    http: &reqwest::Client,
    host: &str,
    port: u16,
) -> Result<Vec<TargetInfo>, BrowserError> {
    let url = format!("http://{host}:{port}/json/list");
    let resp = http.get(&url).send().await.map_err(|e| {
        if refused_by_peer(&e) {
            BrowserError::ConnectionRefused { port }
        } else {
            BrowserError::ConnectionFailed {
                url: url.clone(),
                reason: e.to_string(),
            }
        }
    })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(BrowserError::ConnectionFailed {
            url,
            reason: format!("HTTP {status}"),
        });
    }

    resp.json::<Vec<TargetInfo>>()
        .await
        .map_err(|e| BrowserError::Protocol {
            detail: format!("invalid target list from {url}: {e}"),
        })
}

/// Pick the first page target that can be attached to.
pub fn select_page_target(targets: &[TargetInfo]) -> Option<&TargetInfo> {
    targets
        .iter()
        .find(|t| t.kind == "page" && t.web_socket_debugger_url.is_some())
}

/// Resolve the WebSocket URL of the player's page.
pub async fn page_ws_url(
    http: &reqwest::Client,
    host: &str,
    port: u16,
) -> Result<String, BrowserError> {
    let targets = list_targets(http, host, port).await?;
    tracing::debug!(port, count = targets.len(), "listed DevTools targets");

    select_page_target(&targets)
        .and_then(|t| {
            tracing::debug!(id = %t.id, title = %t.title, url = %t.url, "selected page target");
            t.web_socket_debugger_url.clone()
        })
        .ok_or(BrowserError::NoPageTarget { port })
}
