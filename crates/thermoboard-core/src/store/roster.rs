// ── Slot roster ──
//
// The ordered, fixed-capacity collection of slots plus the merge rules
// that reconcile snapshot, backfill and live data into it. Pure and
// synchronous: the monitor's driver task owns an instance and is the only
// writer, so no locking happens here.

use chrono::{DateTime, Utc};
use tracing::debug;

use thermoboard_api::{Config, DeviceDescriptor, ScreeningRecord, UpdateEvent};

use crate::model::{AppliedConfig, Slot};

/// Result of applying one update event.
///
/// Only `Applied` warrants a change notification. The dropped variants are
/// not errors -- they are the reconciler's defined safety nets, observable
/// here and through `debug!` diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The event mutated the slot bound to this device.
    Applied { device_id: u32 },
    /// No slot is bound to the event's device (removed since the event
    /// was produced); silently dropped.
    NoMatch { device_id: u32 },
    /// A correction whose badge no longer matches the reading on display
    /// (a newer `Set` replaced the person); silently dropped.
    BadgeMismatch { device_id: u32 },
    /// The event targeted the placeholder identity 0; placeholders never
    /// receive live data.
    Placeholder,
}

/// The ordered roster of dashboard slots.
#[derive(Debug, Clone)]
pub struct Roster {
    slots: Vec<Slot>,
    staleness_budget_secs: i64,
}

impl Roster {
    /// Build a roster from the device list: one slot per device in list
    /// order, padded with placeholders up to `config.capacity`.
    ///
    /// A device list longer than the capacity is NOT truncated -- the
    /// roster simply exceeds the configured grid size.
    pub fn build(
        devices: &[DeviceDescriptor],
        config: &Config,
        staleness_budget_secs: i64,
    ) -> Self {
        let applied = AppliedConfig::stamp(config, staleness_budget_secs);

        let mut slots: Vec<Slot> = devices
            .iter()
            .map(|device| Slot::for_device(device, applied))
            .collect();

        for _ in slots.len()..config.capacity as usize {
            slots.push(Slot::placeholder(applied));
        }

        Self {
            slots,
            staleness_budget_secs,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    /// All slots bound to `device_id`. Under the uniqueness invariant this
    /// is one or zero slots; multiplicity is tolerated defensively.
    pub fn find(&self, device_id: u32) -> impl Iterator<Item = &Slot> {
        self.slots
            .iter()
            .filter(move |slot| slot.device_id == device_id)
    }

    fn find_mut(&mut self, device_id: u32) -> impl Iterator<Item = &mut Slot> {
        self.slots
            .iter_mut()
            .filter(move |slot| slot.device_id == device_id)
    }

    /// Backfill one last-person record into its slot. No-op when the
    /// device is no longer on the roster. Returns whether a slot took it.
    pub fn apply_initial_person(&mut self, record: &ScreeningRecord) -> bool {
        let mut applied = false;
        for slot in self.find_mut(record.device_id) {
            slot.set_reading(record);
            applied = true;
        }
        applied
    }

    /// Apply one live update event under the reconciler state machine.
    pub fn apply_event(&mut self, event: &UpdateEvent) -> ApplyOutcome {
        let device_id = event.device_id();
        if device_id == 0 {
            debug!("dropping event addressed to placeholder identity");
            return ApplyOutcome::Placeholder;
        }

        let mut matched = false;
        let mut applied = false;

        for slot in self.find_mut(device_id) {
            matched = true;
            match event {
                UpdateEvent::InitialPerson(record) | UpdateEvent::Set(record) => {
                    slot.set_reading(record);
                    applied = true;
                }
                UpdateEvent::Update(correction) => {
                    applied |= slot.correct_person(correction);
                }
            }
        }

        if !matched {
            debug!(device_id, "dropping event for device not on the roster");
            return ApplyOutcome::NoMatch { device_id };
        }
        if !applied {
            debug!(device_id, "dropping correction with mismatched badge");
            return ApplyOutcome::BadgeMismatch { device_id };
        }
        ApplyOutcome::Applied { device_id }
    }

    /// Re-stamp every slot's applied thresholds after a config refresh,
    /// leaving reading and person data untouched. A capacity increase pads
    /// the grid with placeholders; a decrease waits for the next rebuild.
    pub fn restamp(&mut self, config: &Config) {
        for slot in &mut self.slots {
            slot.applied.max_temperature = config.max_temperature;
            slot.applied.min_temperature = config.min_temperature;
        }

        let applied = AppliedConfig::stamp(config, self.staleness_budget_secs);
        for _ in self.slots.len()..config.capacity as usize {
            self.slots.push(Slot::placeholder(applied));
        }
    }

    /// One staleness tick: flag every non-placeholder, not-yet-stale slot
    /// whose reading age exceeds its budget. Returns the device ids that
    /// turned stale on this tick. The flag is monotonic -- only a new
    /// reading or a rebuild clears it.
    pub fn evaluate_staleness(&mut self, now: DateTime<Utc>) -> Vec<u32> {
        let mut newly_stale = Vec::new();
        for slot in &mut self.slots {
            if slot.is_placeholder() || slot.is_stale {
                continue;
            }
            if slot.age_secs(now) > slot.applied.staleness_budget_secs {
                slot.is_stale = true;
                newly_stale.push(slot.device_id);
            }
        }
        newly_stale
    }
}
