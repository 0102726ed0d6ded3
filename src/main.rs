use anyhow::{Result, anyhow};
use bluest::Adapter;
use log::info;

use skp_bridge_lib::config::SessionConfig;
use skp_bridge_lib::core::bluetooth::{BluestCentral, ConnectionSession, event_channel, spawn_stdin_reader};
use skp_bridge_lib::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = SessionConfig::resolve_path(std::env::args().nth(1));
    // the log level lives in the config, so it is read before the logger exists
    let config = SessionConfig::load_config(&config_path).await;
    let level = config
        .as_ref()
        .map(|c| c.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    logging::init(&level);
    let config = config?;

    println!("\nBLE Scanner with User Selection");
    println!("==============================");

    let adapter = Adapter::default()
        .await
        .ok_or_else(|| anyhow!("No Bluetooth adapter found"))?;
    adapter.wait_available().await?;
    info!("Bluetooth adapter is available.");

    let (events_tx, events_rx) = event_channel();
    let central = BluestCentral::new(adapter, events_tx.clone());
    let _stdin_reader = spawn_stdin_reader(events_tx);

    let mut session = ConnectionSession::new(central, config, std::io::stdout());
    session.start().await;
    session.run(events_rx).await
}
