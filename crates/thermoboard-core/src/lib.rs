// thermoboard-core: live state synchronization between the screening
// server and whatever renders the dashboard.

pub mod error;
pub mod model;
pub mod monitor;
pub mod notify;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use error::CoreError;
pub use model::{AppliedConfig, Slot, SlotState, TemperatureBand};
pub use monitor::{Monitor, MonitorSettings};
pub use notify::{ChangeNotifier, RosterChange};
pub use store::{ApplyOutcome, Roster};
pub use stream::SlotStream;

// Boundary types, re-exported so consumers rarely need thermoboard-api
// directly.
pub use thermoboard_api::{
    ApiError, Config, Correction, DeviceDescriptor, PersonInfo, ScreeningRecord, ScreeningServer,
    UpdateEvent, Wigand,
};
