//! Plugin mode: register with the host and relay until it disconnects.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use ymdeck_browser::{CdpConnector, ConnectionManager, Connector};
use ymdeck_host::{HostSink, LaunchInfo};
use ymdeck_player::{MediaRemote, Player};
use ymdeck_sync::{CoverFetcher, HttpCoverFetcher, Relay, Scheduler};
use ymdeck_types::BridgeConfig;

pub async fn run(config: BridgeConfig, launch: LaunchInfo) -> Result<()> {
    info!(
        port = launch.port,
        plugin_uuid = %launch.plugin_uuid,
        host_version = ?launch.info.application.version,
        host_language = ?launch.info.application.language,
        plugin_version = ?launch.info.plugin.version,
        "plugin starting"
    );
    info!(
        host = %config.debug_host,
        port = config.debug_port,
        "player debug endpoint"
    );

    let connector: Arc<dyn Connector> = Arc::new(CdpConnector::new());
    let connection = ConnectionManager::new(
        connector,
        config.debug_host.clone(),
        config.debug_port,
        config.reconnect.clone(),
    );
    let player: Arc<dyn MediaRemote> = Arc::new(Player::new(connection.clone()));

    let (handle, events) = ymdeck_host::connect(&launch).await?;
    let sink: Arc<dyn HostSink> = Arc::new(handle);
    let covers: Arc<dyn CoverFetcher> = Arc::new(HttpCoverFetcher::default());

    let scheduler = Scheduler::new(
        player.clone(),
        sink.clone(),
        covers,
        config.polling.clone(),
        &config.marquee,
    );
    let relay = Relay::new(player, sink, scheduler);
    relay.run(events).await;

    connection.disconnect().await;
    info!("host connection closed, exiting");
    Ok(())
}
