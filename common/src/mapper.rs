use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::types::{Activity, Field, MirroredVars, OnOff, VarSlot, ZoneStatus};

#[derive(Debug, Error, PartialEq)]
pub enum MapError {
    #[error("status field `{0}` missing or empty")]
    MissingField(&'static str),
    #[error("status field `{field}` has unknown token `{token}`")]
    UnknownToken { field: &'static str, token: String },
    #[error("status field `{field}` is not a number: `{value}`")]
    InvalidNumber { field: &'static str, value: String },
    #[error("controller variable slot {0} missing from listing")]
    MissingSlot(u16),
}

/// Status document as served by the thermostat proxy. Every field is a list with one
/// entry per zone; only the first entry is read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusPayload {
    #[serde(rename = "vacatrunning", default)]
    pub vacat_running: Vec<Value>,
    #[serde(default)]
    pub hold: Vec<Value>,
    #[serde(rename = "currentActivity", default)]
    pub current_activity: Vec<Value>,
    #[serde(rename = "rt", default)]
    pub temperature: Vec<Value>,
    #[serde(rename = "rh", default)]
    pub humidity: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StatusEnvelope {
    Wrapped { status: StatusPayload },
    Bare(StatusPayload),
}

impl StatusPayload {
    pub fn from_json(raw: &[u8]) -> Result<Self, serde_json::Error> {
        Ok(match serde_json::from_slice::<StatusEnvelope>(raw)? {
            StatusEnvelope::Wrapped { status } => status,
            StatusEnvelope::Bare(status) => status,
        })
    }
}

/// Integer variables keyed by slot, as read from the controller's bulk listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VarTable {
    values: BTreeMap<VarSlot, i64>,
}

impl VarTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, slot: VarSlot, value: i64) {
        self.values.insert(slot, value);
    }

    pub fn get(&self, slot: VarSlot) -> Option<i64> {
        self.values.get(&slot).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(VarSlot, i64)> for VarTable {
    fn from_iter<I: IntoIterator<Item = (VarSlot, i64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

pub fn map_status(raw: &StatusPayload) -> Result<ZoneStatus, MapError> {
    let run_state = first_token(&raw.vacat_running, "vacatrunning")?;
    let hold = first_token(&raw.hold, "hold")?;
    let activity = first_token(&raw.current_activity, "currentActivity")?;

    Ok(ZoneStatus {
        run_state: OnOff::parse(&run_state).ok_or_else(|| MapError::UnknownToken {
            field: "vacatrunning",
            token: run_state.clone(),
        })?,
        hold: OnOff::parse(&hold).ok_or_else(|| MapError::UnknownToken {
            field: "hold",
            token: hold.clone(),
        })?,
        activity: Activity::parse(&activity).ok_or_else(|| MapError::UnknownToken {
            field: "currentActivity",
            token: activity.clone(),
        })?,
        temperature: first_number(&raw.temperature, "rt")?,
        humidity: first_number(&raw.humidity, "rh")?,
    })
}

pub fn map_vars(table: &VarTable, zone_index: u16) -> Result<MirroredVars, MapError> {
    let read = |field: Field| {
        let slot = field.slot(zone_index);
        table.get(slot).ok_or(MapError::MissingSlot(slot.0))
    };

    Ok(MirroredVars {
        run_state: read(Field::RunState)?,
        hold: read(Field::Hold)?,
        activity: read(Field::Activity)?,
        temperature: read(Field::Temperature)?,
        humidity: read(Field::Humidity)?,
    })
}

fn first_token(values: &[Value], field: &'static str) -> Result<String, MapError> {
    match values.first() {
        Some(Value::String(text)) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        Some(Value::Number(number)) => Ok(number.to_string()),
        Some(Value::Bool(_)) | Some(Value::Array(_)) | Some(Value::Object(_)) => {
            Err(MapError::UnknownToken {
                field,
                token: values[0].to_string(),
            })
        }
        _ => Err(MapError::MissingField(field)),
    }
}

fn first_number(values: &[Value], field: &'static str) -> Result<f64, MapError> {
    let token = first_token(values, field)?;
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(MapError::InvalidNumber {
            field,
            value: token,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const STATUS_JSON: &str = r#"{
        "vacatrunning": ["off"],
        "hold": ["on"],
        "currentActivity": ["home", "away"],
        "rt": ["68.4"],
        "rh": ["41"]
    }"#;

    #[test]
    fn maps_first_zone_of_status() {
        let payload = StatusPayload::from_json(STATUS_JSON.as_bytes()).unwrap();
        let status = map_status(&payload).unwrap();

        assert_eq!(
            status,
            ZoneStatus {
                run_state: OnOff::Off,
                hold: OnOff::On,
                activity: Activity::Home,
                temperature: 68.4,
                humidity: 41.0,
            }
        );
    }

    #[test]
    fn accepts_wrapped_status_and_numeric_readings() {
        let raw = r#"{"status": {"vacatrunning": ["on"], "hold": ["off"],
            "currentActivity": ["sleep"], "rt": [67.5], "rh": [38]}}"#;
        let payload = StatusPayload::from_json(raw.as_bytes()).unwrap();
        let status = map_status(&payload).unwrap();

        assert_eq!(status.run_state, OnOff::On);
        assert_eq!(status.activity, Activity::Sleep);
        assert_eq!(status.temperature, 67.5);
        assert_eq!(status.humidity, 38.0);
    }

    #[test]
    fn unknown_activity_is_rejected() {
        let raw = r#"{"vacatrunning": ["off"], "hold": ["off"],
            "currentActivity": ["vacation"], "rt": ["70"], "rh": ["40"]}"#;
        let payload = StatusPayload::from_json(raw.as_bytes()).unwrap();

        assert_eq!(
            map_status(&payload),
            Err(MapError::UnknownToken {
                field: "currentActivity",
                token: "vacation".to_string(),
            })
        );
    }

    #[test]
    fn missing_or_bad_readings_are_rejected() {
        let raw = r#"{"vacatrunning": ["off"], "hold": ["off"],
            "currentActivity": ["home"], "rt": [], "rh": ["40"]}"#;
        let payload = StatusPayload::from_json(raw.as_bytes()).unwrap();
        assert_eq!(map_status(&payload), Err(MapError::MissingField("rt")));

        let raw = r#"{"vacatrunning": ["off"], "hold": ["off"],
            "currentActivity": ["home"], "rt": ["NaN"], "rh": ["40"]}"#;
        let payload = StatusPayload::from_json(raw.as_bytes()).unwrap();
        assert!(matches!(
            map_status(&payload),
            Err(MapError::InvalidNumber { field: "rt", .. })
        ));
    }

    #[test]
    fn maps_vars_for_selected_zone() {
        let table: VarTable = (0..12).map(|slot| (VarSlot(slot), slot as i64 * 10)).collect();

        let zone0 = map_vars(&table, 0).unwrap();
        assert_eq!(zone0.run_state, 0);
        assert_eq!(zone0.humidity, 80);

        let zone1 = map_vars(&table, 1).unwrap();
        assert_eq!(
            zone1,
            MirroredVars {
                run_state: 10,
                hold: 30,
                activity: 50,
                temperature: 70,
                humidity: 90,
            }
        );
    }

    #[test]
    fn short_listing_is_a_mapping_error() {
        let table: VarTable = (0..9).map(|slot| (VarSlot(slot), 0)).collect();
        assert_eq!(map_vars(&table, 1), Err(MapError::MissingSlot(9)));
    }
}
