use crate::core::models::{
    DataPoint, OccupancyRecord, FIELD_CAPACITY, FIELD_ENTRIES, FIELD_EXITS, FIELD_OCCUPANCY,
    FIELD_OCCUPANCY_PCT, TAG_FACILITY_ID, TAG_FACILITY_NAME,
};

pub const POINTS_PER_RECORD: usize = 5;

/// Expands each record into its four raw points followed by the derived
/// occupancy percentage point.
pub fn transform(measurement: &str, records: &[OccupancyRecord]) -> Vec<DataPoint> {
    let mut points = Vec::with_capacity(records.len() * POINTS_PER_RECORD);

    for record in records {
        let facility_id = record.facility_id.to_string();
        let facility_name = title_case(&record.facility_name);
        let base = DataPoint::new(measurement)
            .tag(TAG_FACILITY_ID, facility_id)
            .tag(TAG_FACILITY_NAME, facility_name);

        for (field, value) in [
            (FIELD_OCCUPANCY, record.occupancy),
            (FIELD_ENTRIES, record.entries),
            (FIELD_EXITS, record.exits),
            (FIELD_CAPACITY, record.capacity),
        ] {
            points.push(base.clone().field(field, value));
        }

        points.push(base.field(
            FIELD_OCCUPANCY_PCT,
            occupancy_percent(record.occupancy, record.capacity),
        ));
    }

    points
}

/// Occupancy as a percentage of capacity, rounded to two decimals. Zero when
/// the capacity is unknown.
pub fn occupancy_percent(occupancy: u32, capacity: u32) -> f64 {
    if capacity == 0 {
        return 0.0;
    }

    let pct = 100.0 * f64::from(occupancy) / f64::from(capacity);
    round_two_decimals(pct)
}

/// Rounds on the exact decimal value of `value`, with exact halves going to
/// the even digit, so 3.125 becomes 3.12 and 1.625 becomes 1.62.
fn round_two_decimals(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

/// Upper-cases the first letter of every word and lower-cases the rest. Any
/// non-letter starts a new word.
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_word = false;

    for c in input.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }

    out
}
