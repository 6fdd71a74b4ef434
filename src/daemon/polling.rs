use crate::core::error::LoopError;
use crate::core::models::{Destination, PollOutcome};
use crate::core::settings::Settings;
use crate::core::transform::transform;
use crate::service::{OccupancyService, Session};
use crate::sink::PointWriter;
use std::time::Duration;
use tokio::sync::watch;

/// Fixed parameters of the polling cadence and where its points go.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub destination: Destination,
    pub measurement: String,
    pub poll_interval: Duration,
}

impl LoopConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            destination: settings.influx.destination(),
            measurement: settings.influx.measurement.clone(),
            poll_interval: settings.poll_interval(),
        }
    }
}

/// Why a session loop stopped polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Expired,
    Failure { status_code: u16 },
    Shutdown,
}

pub struct SessionLoop<'a, S: ?Sized, W: ?Sized> {
    service: &'a S,
    writer: &'a W,
    config: &'a LoopConfig,
}

impl<'a, S, W> SessionLoop<'a, S, W>
where
    S: OccupancyService + ?Sized,
    W: PointWriter + ?Sized,
{
    pub fn new(service: &'a S, writer: &'a W, config: &'a LoopConfig) -> Self {
        Self {
            service,
            writer,
            config,
        }
    }

    /// Polls on `session` until the service reports anything but success.
    /// The session is consumed and dropped when the loop ends.
    pub async fn run(
        &self,
        mut session: Session,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<LoopExit, LoopError> {
        let mut polls: u64 = 0;

        loop {
            let outcome = self.service.poll(&session).await?;
            polls += 1;

            match outcome {
                PollOutcome::Success { records, cookies } => {
                    session.merge_cookies(cookies);

                    let points = transform(&self.config.measurement, &records);
                    self.writer.write(&self.config.destination, &points).await?;

                    tracing::info!(
                        facilities = records.len(),
                        points = points.len(),
                        "Recorded occupancy snapshot"
                    );
                }
                PollOutcome::Expired => {
                    tracing::info!(
                        polls,
                        session_age_secs = session.age().num_seconds(),
                        cookies = session.cookies().len(),
                        "Session expired"
                    );
                    return Ok(LoopExit::Expired);
                }
                PollOutcome::Failure { status_code } => {
                    return Ok(LoopExit::Failure { status_code });
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                _ = wait_for_shutdown(shutdown) => {
                    tracing::info!(polls, "Shutdown requested, leaving session loop");
                    return Ok(LoopExit::Shutdown);
                }
            }
        }
    }
}

/// Resolves once the flag is set. Never resolves if the sender is gone.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
