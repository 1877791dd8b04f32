// ── Abstract server contract ──
//
// The seam between the sync engine and whatever transport actually talks
// to the screening server. The engine is generic over this trait; tests
// drive it with an in-process scripted implementation.

use std::future::Future;

use futures_core::Stream;

use crate::error::ApiError;
use crate::types::{Config, DeviceDescriptor, ScreeningRecord, UpdateEvent};

/// Operations the dashboard core consumes from the screening server.
///
/// All fetches are one-shot request/response. `subscribe_updates` yields a
/// lazy, infinite, non-restartable event sequence; dropping the stream
/// cancels delivery without side effects. The core performs no retry or
/// backoff -- a failed call is reported once and the caller owns recovery.
pub trait ScreeningServer: Send + Sync + 'static {
    /// The live update stream type. Ends only when the server drops the
    /// subscription.
    type Updates: Stream<Item = UpdateEvent> + Send + Unpin + 'static;

    /// Fetch the current global configuration.
    fn fetch_config(&self) -> impl Future<Output = Result<Config, ApiError>> + Send;

    /// Fetch the ordered device list.
    fn fetch_devices(&self) -> impl Future<Output = Result<Vec<DeviceDescriptor>, ApiError>> + Send;

    /// Fetch the last screened person per device, for first-paint backfill.
    fn fetch_last_persons(
        &self,
    ) -> impl Future<Output = Result<Vec<ScreeningRecord>, ApiError>> + Send;

    /// Open the live update subscription.
    fn subscribe_updates(&self) -> impl Future<Output = Result<Self::Updates, ApiError>> + Send;
}
