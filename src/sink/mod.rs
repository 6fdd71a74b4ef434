mod influx;
pub mod line_protocol;

use crate::core::error::WriteError;
use crate::core::models::{DataPoint, Destination};
use async_trait::async_trait;

pub use influx::InfluxWriter;

/// Destination for transformed points. Writes are synchronous from the
/// caller's point of view: when `write` returns `Ok`, the batch is stored.
#[async_trait]
pub trait PointWriter: Send + Sync {
    async fn write(&self, destination: &Destination, points: &[DataPoint])
        -> Result<(), WriteError>;

    /// Releases the underlying connection. Called once, on shutdown.
    async fn close(&mut self) -> Result<(), WriteError>;
}
