// thermoboard-api: boundary types and the abstract screening-server contract.
//
// No transport lives here. A concrete backend (GraphQL, REST, WebSocket)
// implements [`ScreeningServer`]; `thermoboard-core` consumes it.

pub mod error;
pub mod server;
pub mod timestamp;
pub mod types;

pub use error::ApiError;
pub use server::ScreeningServer;
pub use types::{
    Config, Correction, DeviceDescriptor, PersonInfo, ScreeningRecord, UpdateEvent, Wigand,
};
