//! Versioned upgrades of the stored `survey_data` document
//!
//! Version 1 records were written straight from the capture screen and may
//! carry the platform's raw location object (`{coords: {...}, timestamp}`)
//! and the mirror id under `backendId`. Version 2 is the shape
//! `SurveyRecord` deserializes: flat `{latitude, longitude, timestamp}` and
//! `remoteId`.

use serde_json::{Map, Value};

/// Version written alongside every persisted record list
pub const CURRENT_VERSION: u32 = 2;

/// Version assumed when no version key has been stored
pub const LEGACY_VERSION: u32 = 1;

type Migration = fn(&mut Map<String, Value>);

fn migrations() -> Vec<(u32, Migration)> {
    vec![(2, flatten_legacy_fields)]
}

/// Upgrade raw records from `from_version` to `CURRENT_VERSION` in place.
/// Returns true if any migration step ran.
pub fn upgrade(records: &mut [Value], from_version: u32) -> bool {
    let mut applied = false;

    for (version, migrate) in migrations() {
        if version <= from_version {
            continue;
        }

        tracing::info!(
            "Upgrading {} stored records to format version {}",
            records.len(),
            version
        );

        for record in records.iter_mut() {
            if let Value::Object(fields) = record {
                migrate(fields);
            }
        }
        applied = true;
    }

    applied
}

fn flatten_legacy_fields(fields: &mut Map<String, Value>) {
    if let Some(backend_id) = fields.remove("backendId") {
        if !fields.contains_key("remoteId") && !backend_id.is_null() {
            fields.insert("remoteId".to_string(), stringify_id(backend_id));
        }
    }

    if let Some(id) = fields.remove("id") {
        fields.insert("id".to_string(), stringify_id(id));
    }

    let Some(Value::Object(location)) = fields.get_mut("location") else {
        return;
    };

    if let Some(Value::Object(coords)) = location.remove("coords") {
        for key in ["latitude", "longitude"] {
            if let Some(value) = coords.get(key) {
                location.insert(key.to_string(), value.clone());
            }
        }
    }

    // Platform fix timestamps may be fractional milliseconds, nested or flat
    if let Some(ts) = location
        .get("timestamp")
        .filter(|ts| !ts.is_i64())
        .and_then(Value::as_f64)
    {
        location.insert("timestamp".to_string(), Value::from(ts.round() as i64));
    }
}

fn stringify_id(id: Value) -> Value {
    match id {
        Value::Number(n) => Value::String(n.to_string()),
        other => other,
    }
}
