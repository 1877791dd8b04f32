// ── Wire-boundary data model ──
//
// Shapes exchanged with the screening server, independent of any concrete
// transport. Field sets follow the server contract; the core crate converts
// these into its domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Config ───────────────────────────────────────────────────────────

/// Global dashboard configuration, refreshed wholesale on a fixed period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Number of slots the dashboard always shows. Short device lists are
    /// padded with placeholders up to this count.
    pub capacity: u32,
    /// Upper temperature threshold, degrees Celsius.
    pub max_temperature: f64,
    /// Lower temperature threshold, degrees Celsius.
    pub min_temperature: f64,
}

impl Config {
    /// Round both thresholds to one decimal place, matching the precision
    /// the server contract promises for display values.
    pub fn normalized(self) -> Self {
        Self {
            capacity: self.capacity,
            max_temperature: round1(self.max_temperature),
            min_temperature: round1(self.min_temperature),
        }
    }

    /// Check the `min < max` invariant.
    pub fn is_valid(&self) -> bool {
        self.min_temperature < self.max_temperature
    }
}

fn round1(t: f64) -> f64 {
    (t * 10.0).round() / 10.0
}

// ── DeviceDescriptor ─────────────────────────────────────────────────

/// One monitoring station as listed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Device identifier; always non-zero for a real device (`0` is the
    /// placeholder sentinel on the dashboard side).
    pub id: u32,
    pub name: String,
    pub description: String,
}

// ── Wigand ───────────────────────────────────────────────────────────

/// Badge credential of the person being screened.
///
/// `code` is the combined Wiegand value; `facility` and `number` are its
/// decoded sub-fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wigand {
    pub code: u32,
    pub facility: u32,
    pub number: u32,
}

impl Wigand {
    pub fn new(code: u32, facility: u32, number: u32) -> Self {
        Self {
            code,
            facility,
            number,
        }
    }
}

// ── PersonInfo ───────────────────────────────────────────────────────

/// Descriptive fields of the screened person. These are exactly the fields
/// a `Correct` event may replace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonInfo {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub organization: String,
    pub department: String,
    pub position: String,
}

// ── ScreeningRecord ──────────────────────────────────────────────────

/// A full temperature reading: who was screened, where, when, and the
/// measured value. Used both for the one-shot last-person backfill and for
/// `Set` events on the live stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningRecord {
    pub device_id: u32,
    pub recorded_at: DateTime<Utc>,
    pub temperature: f64,
    /// Reference to the camera image taken at screening time. Resolving it
    /// to a URL is the presentation layer's business.
    pub image: String,
    pub wigand: Wigand,
    pub person: PersonInfo,
}

// ── Correction ───────────────────────────────────────────────────────

/// A person-field correction for an existing reading. Only applies when
/// `wigand` still matches the reading currently shown for the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub device_id: u32,
    pub wigand: Wigand,
    pub person: PersonInfo,
}

// ── UpdateEvent ──────────────────────────────────────────────────────

/// One incremental update from the server, applied strictly in arrival
/// order by the reconciler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "job", rename_all = "snake_case")]
pub enum UpdateEvent {
    /// One-shot backfill delivered after the roster is built.
    InitialPerson(ScreeningRecord),
    /// A brand-new reading -- full replace of the slot's reading fields.
    Set(ScreeningRecord),
    /// A correction to the reading already shown, guarded by badge match.
    Update(Correction),
}

impl UpdateEvent {
    /// The device this event targets.
    pub fn device_id(&self) -> u32 {
        match self {
            Self::InitialPerson(r) | Self::Set(r) => r.device_id,
            Self::Update(c) => c.device_id,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn config_normalization_rounds_to_one_decimal() {
        let config = Config {
            capacity: 8,
            max_temperature: 37.4999,
            min_temperature: 35.0501,
        };
        let n = config.normalized();
        assert_eq!(n.max_temperature, 37.5);
        assert_eq!(n.min_temperature, 35.1);
        assert_eq!(n.capacity, 8);
    }

    #[test]
    fn config_validity_requires_min_below_max() {
        let good = Config {
            capacity: 4,
            max_temperature: 37.5,
            min_temperature: 35.0,
        };
        assert!(good.is_valid());

        let inverted = Config {
            capacity: 4,
            max_temperature: 35.0,
            min_temperature: 37.5,
        };
        assert!(!inverted.is_valid());

        let equal = Config {
            capacity: 4,
            max_temperature: 36.6,
            min_temperature: 36.6,
        };
        assert!(!equal.is_valid());
    }

    #[test]
    fn update_event_reports_target_device() {
        let record = ScreeningRecord {
            device_id: 7,
            recorded_at: Utc::now(),
            temperature: 36.6,
            image: "img/7.jpg".into(),
            wigand: Wigand::new(123, 1, 23),
            person: PersonInfo::default(),
        };
        assert_eq!(UpdateEvent::Set(record.clone()).device_id(), 7);
        assert_eq!(UpdateEvent::InitialPerson(record).device_id(), 7);
        assert_eq!(
            UpdateEvent::Update(Correction {
                device_id: 9,
                wigand: Wigand::default(),
                person: PersonInfo::default(),
            })
            .device_id(),
            9
        );
    }

    #[test]
    fn update_event_serializes_with_job_tag() {
        let event = UpdateEvent::Update(Correction {
            device_id: 3,
            wigand: Wigand::new(500, 7, 244),
            person: PersonInfo {
                first_name: "Anna".into(),
                ..PersonInfo::default()
            },
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["job"], "update");
        assert_eq!(json["device_id"], 3);

        let back: UpdateEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
