//! The seam between the connection manager and the DevTools transport.
//!
//! [`RemoteSession`] is one usable connection to the player page and
//! [`Connector`] opens new ones. The real implementations sit on top of
//! [`CdpClient`]; tests substitute in-memory fakes.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::cdp::CdpClient;
use crate::discovery;
use crate::error::BrowserError;

/// A live connection to the player page.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// Evaluate a JavaScript expression and return its JSON value.
    async fn evaluate(&self, expression: &str) -> Result<Value, BrowserError>;

    /// Close the underlying transport.
    async fn close(&self);

    /// Resolve once the transport reports a disconnect.
    async fn closed(&self);
}

/// Opens sessions against a host and port.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, host: &str, port: u16)
        -> Result<Arc<dyn RemoteSession>, BrowserError>;
}

/// [`RemoteSession`] backed by a CDP WebSocket.
pub struct CdpSession {
    client: CdpClient,
}

impl CdpSession {
    pub fn new(client: CdpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RemoteSession for CdpSession {
    async fn evaluate(&self, expression: &str) -> Result<Value, BrowserError> {
        self.client.evaluate(expression).await
    }

    async fn close(&self) {
        self.client.close().await;
    }

    async fn closed(&self) {
        self.client.closed().await;
    }
}

/// Discovers the page target over HTTP, attaches over WebSocket, and
/// enables the `Page` and `Runtime` domains.
#[derive(Clone, Default)]
pub struct CdpConnector {
    http: reqwest::Client,
}

impl CdpConnector {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Connector for CdpConnector {
    async fn connect(
        &self,
        host: &str,
        port: u16,
    ) -> Result<Arc<dyn RemoteSession>, BrowserError> {
        let ws_url = discovery::page_ws_url(&self.http, host, port).await?;
        let client = CdpClient::connect(&ws_url).await?;

        client.enable_domain("Page").await?;
        client.enable_domain("Runtime").await?;

        Ok(Arc::new(CdpSession::new(client)))
    }
}
