//! SNTP clock demo.
//!
//! Keeps time synchronized in the background and redraws a text clock panel
//! every few seconds.
//!
//! Environment variables:
//! - SNTP_SERVER, SNTP_PORT, SNTP_POLL_MS, SNTP_RESEND_MS, SNTP_RESOLVE_MS,
//!   SNTP_BIND_ADDR: client settings (see `sntp_clock::sync::env`)
//! - CLOCK_DST: "1" to show CEST instead of CET
//! - RUST_LOG: log filter, default "info"

mod panel;

use std::time::{Duration, Instant};

use sntp_clock::{ClockError, EpochSeconds, SntpClient, SyncConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::panel::Panel;

const REFRESH_INTERVAL: Duration = Duration::from_secs(3);

#[tokio::main]
async fn main() -> Result<(), ClockError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = SyncConfig::from_env()?;
    let dst = std::env::var("CLOCK_DST").is_ok_and(|v| v.trim() == "1");

    let client = SntpClient::start_with_resource(config, Panel::default()).await?;
    let reader = client.reader();
    info!(local_addr = %client.local_addr(), dst, "clock running");

    let mut refresh = tokio::time::interval(REFRESH_INTERVAL);
    loop {
        tokio::select! {
            _ = refresh.tick() => {
                let now = Instant::now();
                let frame = reader.with_resource(|snapshot, panel| {
                    let epoch = snapshot.estimate(now).unwrap_or(EpochSeconds::UNKNOWN);
                    panel.render(epoch, dst);
                    panel.to_string()
                });
                println!("{frame}");
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    info!("stopping clock");
    client.shutdown().await;
    Ok(())
}
