// ── Roster storage and merge rules ──

mod roster;

pub use roster::{ApplyOutcome, Roster};
