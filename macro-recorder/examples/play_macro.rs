use macro_recorder::{Player, PlayerConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| macro_recorder::DEFAULT_RECORDING_FILE.to_string());

    let player = Player::with_rdev(PlayerConfig::default());
    player.load(&path)?;

    // Ctrl+C stops the playback instead of killing the process
    let stopper = player.clone();
    ctrlc::set_handler(move || stopper.stop())?;

    info!(
        "Playing {} events from {}. Press Ctrl+C to stop.",
        player.events().len(),
        path
    );
    let report = player.play_loaded().await?;

    for warning in &report.warnings {
        warn!("{}", warning);
    }
    if report.cancelled {
        info!("Playback stopped after {} events", report.executed);
    } else {
        info!("Playback finished: {} events played", report.executed);
    }

    Ok(())
}
