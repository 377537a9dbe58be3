use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use drive_session::power::{EnvBootMetadata, SimulatedPowerSource};
use drive_session::time::SystemClock;
use drive_session::{PowerState, SessionAnnotation, SessionConfig, SessionController, SessionHistory};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

// Simulated power manager script: two drives with a suspend in between.
const POWER_SCRIPT: &[PowerState] = &[
    PowerState::On,
    PowerState::On,
    PowerState::ShutdownPrepare,
    PowerState::SuspendEnter,
    PowerState::SuspendExit,
    PowerState::On,
    PowerState::ShutdownPrepare,
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => SessionConfig::load(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SessionConfig::default(),
    };

    // Initialize logging/tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.clone()));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    tracing::info!("Drive session service booting...");

    let power = Arc::new(SimulatedPowerSource::new(PowerState::WaitForVhal));
    let history = Arc::new(SessionHistory::new(config.history_capacity)?);

    let (controller, worker) = SessionController::builder()
        .power_source(power.clone())
        .boot_metadata(Arc::new(EnvBootMetadata))
        .clock(Arc::new(SystemClock::new()))
        .build_queued()?;

    controller.register_callback(history.clone());
    controller.register_callback(Arc::new(|annotation: &SessionAnnotation| {
        println!(
            "[SESSION] {}",
            serde_json::Value::Object(annotation.to_record())
        );
    }));

    let worker_handle = tokio::spawn(worker.run());
    controller.init_session();

    let mut cadence = tokio::time::interval(Duration::from_millis(100));
    cadence.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    for state in POWER_SCRIPT {
        cadence.tick().await;
        power.set_state(*state);
    }

    // Let the worker catch up before tearing down.
    cadence.tick().await;
    controller.release();
    worker_handle.await.context("session worker panicked")?;

    let stats = history.stats();
    println!("[STATS] {}", serde_json::to_string_pretty(&stats)?);
    tracing::info!("Drive session service stopped.");
    Ok(())
}
