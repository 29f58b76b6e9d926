use macro_recorder::{MacroSession, Player, PlayerConfig, Recorder, RecorderConfig};
use tokio::signal::ctrl_c;
use tokio_stream::StreamExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let recorder = Recorder::with_global_hook(RecorderConfig::default());
    let player = Player::with_rdev(PlayerConfig::default());
    let mut session = MacroSession::new(recorder, player);
    if let Some(path) = std::env::args().nth(1) {
        session.select_file(path);
    }

    let mut events = session.recorder().event_stream();
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            info!("Recorded {:?}", event.kind);
        }
    });

    session.start_recording()?;
    info!(
        "Recording started. Press Ctrl+C to stop and save to {:?}",
        session.active_file()
    );

    ctrl_c().await?;
    session.stop()?;
    info!(
        "Saved {} events to {:?}",
        session.recorder().event_count(),
        session.active_file()
    );

    Ok(())
}
