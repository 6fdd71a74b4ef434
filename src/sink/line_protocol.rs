use crate::core::models::{DataPoint, FieldValue};

/// Encodes points as InfluxDB line protocol, one line per point, without
/// timestamps so the server stamps them on arrival.
pub fn encode(points: &[DataPoint]) -> String {
    let mut out = String::new();
    for point in points {
        encode_point(point, &mut out);
        out.push('\n');
    }
    out
}

fn encode_point(point: &DataPoint, out: &mut String) {
    escape_into(&point.measurement, &[',', ' '], out);

    for (key, value) in &point.tags {
        out.push(',');
        escape_into(key, &[',', '=', ' '], out);
        out.push('=');
        escape_into(value, &[',', '=', ' '], out);
    }

    for (i, (key, value)) in point.fields.iter().enumerate() {
        out.push(if i == 0 { ' ' } else { ',' });
        escape_into(key, &[',', '=', ' '], out);
        out.push('=');
        match value {
            FieldValue::Integer(v) => {
                out.push_str(&v.to_string());
                out.push('i');
            }
            FieldValue::Float(v) => out.push_str(&v.to_string()),
        }
    }
}

fn escape_into(input: &str, special: &[char], out: &mut String) {
    for c in input.chars() {
        if c == '\\' || special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}
