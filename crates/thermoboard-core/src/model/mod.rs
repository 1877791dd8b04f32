// ── Domain model ──

mod slot;

pub use slot::{AppliedConfig, Slot, SlotState, TemperatureBand};
