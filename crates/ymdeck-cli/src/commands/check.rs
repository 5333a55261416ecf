//! `ymdeck check`: verify that the player's debugging port answers.

use std::sync::Arc;

use anyhow::{bail, Result};

use ymdeck_browser::{CdpConnector, ConnectionManager};
use ymdeck_player::Player;
use ymdeck_types::EffectiveConfig;

pub async fn run(effective: &EffectiveConfig, debug_port: Option<u16>, toggle: bool) -> Result<()> {
    let config = &effective.config;
    if effective.source_files.is_empty() {
        println!("[OK] config: built-in defaults");
    }
    for path in &effective.source_files {
        println!("[OK] config: {}", path.display());
    }
    for (key, source) in effective.overrides() {
        println!("  {key} <- {source}");
    }

    let port = debug_port.unwrap_or(config.debug_port);
    println!("Checking Yandex Music at {}:{port}...", config.debug_host);

    let connection = ConnectionManager::new(
        Arc::new(CdpConnector::new()),
        config.debug_host.clone(),
        port,
        config.reconnect.clone(),
    );
    let player = Player::new(connection.clone());

    if !connection.check_connection().await {
        println!("[FAIL] player is not reachable on port {port}");
        println!("  hint: start Yandex Music with --remote-debugging-port={port}");
        bail!("player unreachable on port {port}");
    }
    println!("[OK] connected");

    match player.track_info().await {
        Some(track) => println!("[OK] now playing: {}", track.display_text()),
        None => println!("[WARN] no track information"),
    }
    match player.playback_state().await {
        Some(true) => println!("[OK] playback: playing"),
        Some(false) => println!("[OK] playback: paused"),
        None => println!("[WARN] playback state unknown"),
    }

    let mut result = Ok(());
    if toggle {
        if player.toggle_playback().await {
            println!("[OK] playback toggled");
        } else {
            println!("[FAIL] could not toggle playback");
            result = Err(anyhow::anyhow!("toggle failed"));
        }
    }

    connection.disconnect().await;
    result
}
