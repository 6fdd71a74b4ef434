mod session;
mod termaria;
mod token;

use crate::core::error::ServiceError;
use crate::core::models::PollOutcome;
use async_trait::async_trait;

pub use session::Session;
pub use termaria::TermariaClient;

/// Status the service answers with once the CSRF session has expired.
pub const SESSION_EXPIRED_STATUS: u16 = 419;

/// The remote occupancy service: one call to open a session, one to poll it.
#[async_trait]
pub trait OccupancyService: Send + Sync {
    /// Performs exactly one landing-page request. No retries.
    async fn authenticate(&self) -> Result<Session, ServiceError>;

    /// Performs exactly one authenticated poll. `Err` is reserved for faults
    /// that are not an HTTP status (transport, undecodable body).
    async fn poll(&self, session: &Session) -> Result<PollOutcome, ServiceError>;
}

/// Maps a poll response status to its outcome class. Only 419 means expiry.
pub fn classify_status(status_code: u16) -> Option<PollOutcome> {
    match status_code {
        200 => None,
        SESSION_EXPIRED_STATUS => Some(PollOutcome::Expired),
        other => Some(PollOutcome::Failure {
            status_code: other,
        }),
    }
}
