// ── Slot: one cell of the dashboard grid ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use thermoboard_api::{Config, Correction, DeviceDescriptor, PersonInfo, ScreeningRecord, Wigand};

/// Config values stamped onto a slot when the roster is built, so each
/// cell renders against the thresholds that were in force for it. The
/// config store re-stamps these in place when a refresh changes them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AppliedConfig {
    pub max_temperature: f64,
    pub min_temperature: f64,
    /// Maximum reading age, in seconds, before the cell is flagged stale.
    pub staleness_budget_secs: i64,
}

impl AppliedConfig {
    pub fn stamp(config: &Config, staleness_budget_secs: i64) -> Self {
        Self {
            max_temperature: config.max_temperature,
            min_temperature: config.min_temperature,
            staleness_budget_secs,
        }
    }
}

/// Reconciliation state of a slot. Placeholders never receive live data;
/// they only become known through a full roster rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Placeholder cell (device identity 0) padding the grid.
    Empty,
    /// Bound to a device, no reading received yet.
    KnownNoReading,
    /// Bound to a device with a reading on display.
    KnownHasReading,
}

/// Classification of a reading against the slot's applied thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureBand {
    /// No reading yet (temperature 0).
    NoReading,
    /// At or above the configured maximum.
    High,
    /// At or below the configured minimum.
    Low,
    Normal,
}

/// One visual cell of the dashboard.
///
/// Slots are created only when the roster is (re)built, mutated in place
/// by the reconciler and the staleness evaluator, and replaced wholesale
/// on the next rebuild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    /// Device identity; `0` marks a placeholder.
    pub device_id: u32,
    pub device_name: String,
    pub device_description: String,
    /// Timestamp of the reading on display (roster build time until the
    /// first reading arrives).
    pub recorded_at: DateTime<Utc>,
    /// Current temperature; `0.0` means no reading yet.
    pub temperature: f64,
    /// Reading image reference.
    pub image: String,
    pub wigand: Wigand,
    pub person: PersonInfo,
    pub applied: AppliedConfig,
    /// Set by the staleness evaluator, cleared only by a new reading or a
    /// rebuild.
    pub is_stale: bool,
}

impl Slot {
    /// A slot bound to a real device, awaiting its first reading.
    pub fn for_device(device: &DeviceDescriptor, applied: AppliedConfig) -> Self {
        Self {
            device_id: device.id,
            device_name: device.name.clone(),
            device_description: device.description.clone(),
            ..Self::placeholder(applied)
        }
    }

    /// An unassigned placeholder cell padding the grid to capacity.
    pub fn placeholder(applied: AppliedConfig) -> Self {
        Self {
            device_id: 0,
            device_name: String::new(),
            device_description: String::new(),
            recorded_at: Utc::now(),
            temperature: 0.0,
            image: String::new(),
            wigand: Wigand::default(),
            person: PersonInfo::default(),
            applied,
            is_stale: false,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.device_id == 0
    }

    pub fn state(&self) -> SlotState {
        if self.is_placeholder() {
            SlotState::Empty
        } else if self.temperature == 0.0 {
            SlotState::KnownNoReading
        } else {
            SlotState::KnownHasReading
        }
    }

    /// Classify the displayed reading against the applied thresholds.
    pub fn band(&self) -> TemperatureBand {
        if self.temperature == 0.0 {
            TemperatureBand::NoReading
        } else if self.temperature >= self.applied.max_temperature {
            TemperatureBand::High
        } else if self.temperature <= self.applied.min_temperature {
            TemperatureBand::Low
        } else {
            TemperatureBand::Normal
        }
    }

    /// Age of the displayed reading, in whole seconds rounded up.
    pub fn age_secs(&self, now: DateTime<Utc>) -> i64 {
        let ms = (now - self.recorded_at).num_milliseconds().unsigned_abs();
        i64::try_from(ms.div_ceil(1000)).unwrap_or(i64::MAX)
    }

    /// Full replace of the reading: temperature, timestamp, badge, person
    /// fields and image. Restarts the staleness baseline.
    pub fn set_reading(&mut self, record: &ScreeningRecord) {
        self.recorded_at = record.recorded_at;
        self.temperature = record.temperature;
        self.image = record.image.clone();
        self.wigand = record.wigand;
        self.person = record.person.clone();
        self.is_stale = false;
    }

    /// Replace the person descriptive fields only, and only when the
    /// correction's badge matches the badge on display. Returns whether
    /// the correction applied.
    pub fn correct_person(&mut self, correction: &Correction) -> bool {
        if self.wigand.code != correction.wigand.code {
            return false;
        }
        self.person = correction.person.clone();
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn applied() -> AppliedConfig {
        AppliedConfig {
            max_temperature: 37.5,
            min_temperature: 35.0,
            staleness_budget_secs: 60,
        }
    }

    fn device(id: u32) -> DeviceDescriptor {
        DeviceDescriptor {
            id,
            name: format!("pad-{id}"),
            description: String::new(),
        }
    }

    fn record(device_id: u32, temperature: f64) -> ScreeningRecord {
        ScreeningRecord {
            device_id,
            recorded_at: Utc::now(),
            temperature,
            image: "shot.jpg".into(),
            wigand: Wigand::new(500, 7, 244),
            person: PersonInfo {
                first_name: "Ivan".into(),
                ..PersonInfo::default()
            },
        }
    }

    #[test]
    fn state_transitions_follow_reading_presence() {
        let mut slot = Slot::for_device(&device(1), applied());
        assert_eq!(slot.state(), SlotState::KnownNoReading);

        slot.set_reading(&record(1, 36.6));
        assert_eq!(slot.state(), SlotState::KnownHasReading);

        assert_eq!(Slot::placeholder(applied()).state(), SlotState::Empty);
    }

    #[test]
    fn band_boundaries_are_inclusive() {
        let mut slot = Slot::for_device(&device(1), applied());
        assert_eq!(slot.band(), TemperatureBand::NoReading);

        slot.set_reading(&record(1, 37.5));
        assert_eq!(slot.band(), TemperatureBand::High);

        slot.set_reading(&record(1, 38.2));
        assert_eq!(slot.band(), TemperatureBand::High);

        slot.set_reading(&record(1, 35.0));
        assert_eq!(slot.band(), TemperatureBand::Low);

        slot.set_reading(&record(1, 36.6));
        assert_eq!(slot.band(), TemperatureBand::Normal);
    }

    #[test]
    fn set_reading_clears_staleness_and_restarts_baseline() {
        let mut slot = Slot::for_device(&device(1), applied());
        slot.is_stale = true;

        let r = record(1, 36.6);
        slot.set_reading(&r);

        assert!(!slot.is_stale);
        assert_eq!(slot.recorded_at, r.recorded_at);
        assert_eq!(slot.temperature, 36.6);
        assert_eq!(slot.wigand, r.wigand);
    }

    #[test]
    fn correction_requires_matching_badge() {
        let mut slot = Slot::for_device(&device(1), applied());
        slot.set_reading(&record(1, 36.6));
        let before = slot.clone();

        let mismatched = Correction {
            device_id: 1,
            wigand: Wigand::new(777, 1, 1),
            person: PersonInfo {
                first_name: "X".into(),
                ..PersonInfo::default()
            },
        };
        assert!(!slot.correct_person(&mismatched));
        assert_eq!(slot, before);

        let matching = Correction {
            device_id: 1,
            wigand: Wigand::new(500, 7, 244),
            person: PersonInfo {
                first_name: "X".into(),
                ..PersonInfo::default()
            },
        };
        assert!(slot.correct_person(&matching));
        assert_eq!(slot.person.first_name, "X");
        // Everything outside the person fields is untouched.
        assert_eq!(slot.temperature, before.temperature);
        assert_eq!(slot.recorded_at, before.recorded_at);
    }

    #[test]
    fn age_rounds_up_to_whole_seconds() {
        let now = Utc::now();
        let mut slot = Slot::for_device(&device(1), applied());
        slot.recorded_at = now - chrono::Duration::milliseconds(1_001);
        assert_eq!(slot.age_secs(now), 2);

        slot.recorded_at = now - chrono::Duration::milliseconds(61_000);
        assert_eq!(slot.age_secs(now), 61);
    }
}
