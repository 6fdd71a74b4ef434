use crate::core::error::{LoopError, ServiceError};
use crate::daemon::polling::{LoopConfig, LoopExit, SessionLoop};
use crate::service::{OccupancyService, Session};
use crate::sink::PointWriter;
use std::fmt;
use tokio::sync::watch;

/// Exit status of the process once the supervisor gives up. The daemon never
/// exits successfully: it only stops when it can no longer make progress.
pub const EXIT_STATUS: i32 = -1;

#[derive(Debug)]
pub enum Termination {
    AuthFailed(ServiceError),
    PollFailed { status_code: u16 },
    Fault(LoopError),
    Shutdown,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::AuthFailed(e) => write!(f, "authentication failed: {}", e),
            Termination::PollFailed { status_code } => {
                write!(f, "occupancy request failed with status {}", status_code)
            }
            Termination::Fault(e) => write!(f, "session loop aborted: {}", e),
            Termination::Shutdown => write!(f, "shutdown requested"),
        }
    }
}

#[derive(Debug)]
pub struct SupervisorReport {
    pub termination: Termination,
    pub sessions: u64,
}

impl SupervisorReport {
    pub fn exit_status(&self) -> i32 {
        EXIT_STATUS
    }
}

enum State {
    Authenticating,
    Running(Session),
    Terminated(Termination),
}

/// Owns the service client and the writer for the lifetime of the process and
/// cycles between authenticating and polling.
pub struct Supervisor<S, W> {
    service: S,
    writer: W,
    config: LoopConfig,
    shutdown: watch::Receiver<bool>,
}

impl<S, W> Supervisor<S, W>
where
    S: OccupancyService,
    W: PointWriter,
{
    pub fn new(
        service: S,
        writer: W,
        config: LoopConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            service,
            writer,
            config,
            shutdown,
        }
    }

    /// Runs until a terminal state is reached. Reauthentication is an
    /// iteration of the state loop, never a nested call, so any number of
    /// expirations runs in constant stack.
    pub async fn run(mut self) -> SupervisorReport {
        let mut state = State::Authenticating;
        let mut sessions: u64 = 0;

        let termination = loop {
            state = match state {
                State::Authenticating => match self.service.authenticate().await {
                    Ok(session) => {
                        sessions += 1;
                        tracing::info!(
                            sessions,
                            established_at = %session.established_at(),
                            "Session established"
                        );
                        State::Running(session)
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Authentication failed");
                        State::Terminated(Termination::AuthFailed(e))
                    }
                },
                State::Running(session) => {
                    let session_loop = SessionLoop::new(&self.service, &self.writer, &self.config);

                    match session_loop.run(session, &mut self.shutdown).await {
                        Ok(LoopExit::Expired) => {
                            tracing::warn!("Session expired (status 419), re-authenticating");
                            State::Authenticating
                        }
                        Ok(LoopExit::Failure { status_code }) => {
                            tracing::error!(status_code, "Occupancy request failed");
                            State::Terminated(Termination::PollFailed { status_code })
                        }
                        Ok(LoopExit::Shutdown) => State::Terminated(Termination::Shutdown),
                        Err(e) => {
                            tracing::error!(error = %e, "Session loop aborted");
                            State::Terminated(Termination::Fault(e))
                        }
                    }
                }
                State::Terminated(termination) => break termination,
            };
        };

        if let Err(e) = self.writer.close().await {
            tracing::warn!(error = %e, "Failed to close writer");
        }

        tracing::info!(
            sessions,
            reauthentications = sessions.saturating_sub(1),
            "Supervisor terminated"
        );

        SupervisorReport {
            termination,
            sessions,
        }
    }
}
