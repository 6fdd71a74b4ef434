use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const TAG_FACILITY_ID: &str = "id_recinto";
pub const TAG_FACILITY_NAME: &str = "nombre_recinto";

pub const FIELD_OCCUPANCY: &str = "ocupacion";
pub const FIELD_ENTRIES: &str = "entradas";
pub const FIELD_EXITS: &str = "salidas";
pub const FIELD_CAPACITY: &str = "aforo";
pub const FIELD_OCCUPANCY_PCT: &str = "ocupacion_pct";

/// One facility entry of an occupancy snapshot, as returned by the AJAX endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyRecord {
    #[serde(rename = "IdRecinto")]
    pub facility_id: i64,
    #[serde(rename = "Recinto")]
    pub facility_name: String,
    #[serde(rename = "Ocupacion")]
    pub occupancy: u32,
    #[serde(rename = "Entradas")]
    pub entries: u32,
    #[serde(rename = "Salidas")]
    pub exits: u32,
    #[serde(rename = "Aforo")]
    pub capacity: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

/// A single time-series point. The timestamp is left to the database, which
/// stamps the point with its arrival time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, FieldValue>,
}

impl DataPoint {
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Where a batch of points is written (bucket/org pair in InfluxDB terms).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub org: String,
    pub bucket: String,
}

/// Result of a single authenticated poll.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// HTTP 200. `cookies` holds whatever the response set and must be merged
    /// into the session by the caller.
    Success {
        records: Vec<OccupancyRecord>,
        cookies: Vec<(String, String)>,
    },
    /// HTTP 419, the CSRF session is no longer valid.
    Expired,
    Failure { status_code: u16 },
}
