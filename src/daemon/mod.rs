mod polling;
mod supervisor;
#[cfg(test)]
mod testing;

use crate::core::settings::Settings;
use crate::service::TermariaClient;
use crate::sink::InfluxWriter;
use anyhow::Result;
use tokio::sync::watch;

pub use polling::LoopConfig;
pub use supervisor::{Supervisor, SupervisorReport, EXIT_STATUS};

pub async fn run(settings: Settings) -> Result<SupervisorReport> {
    settings.validate()?;
    settings.influx.validate()?;

    tracing::info!(
        poll_interval_secs = settings.poll_interval_secs,
        influx = %settings.influx.url,
        bucket = %settings.influx.bucket,
        "Starting occupancy poller"
    );

    let service = TermariaClient::new(&settings.service)?;
    let writer = InfluxWriter::new(&settings.influx)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Interrupt received, stopping after the current poll");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => tracing::warn!(error = %e, "Failed to listen for interrupt signal"),
        }
    });

    let supervisor = Supervisor::new(
        service,
        writer,
        LoopConfig::from_settings(&settings),
        shutdown_rx,
    );

    Ok(supervisor.run().await)
}
