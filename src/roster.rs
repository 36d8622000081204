// Roster model: the school-data-hub's view of every student, keyed by
// record number ("stamboeknummer").

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{LeerIdError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub institution_number: u32,
    /// Identifier of the student on the messaging platform.
    pub student_number: u64,
    pub class_code: String,
}

/// Lookup table built from one successful roster fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    entries: HashMap<u64, RosterEntry>,
}

/// Top-level shape of the roster response. `status` and `data` are kept as
/// raw JSON values: the service sends a bool status and a data array on
/// success, but an error description in `data` on failure.
#[derive(Debug, Deserialize)]
pub struct RosterPayload {
    #[serde(default)]
    pub status: Value,
    #[serde(default)]
    pub data: Value,
}

/// Anything able to produce a fresh roster.
pub trait RosterSource {
    fn fetch_roster(&self) -> Result<Roster>;
}

impl Roster {
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (u64, RosterEntry)>,
    {
        Roster {
            entries: entries.into_iter().collect(),
        }
    }

    /// Parse a raw response body.
    pub fn from_body(body: &str) -> Result<Self> {
        let payload: RosterPayload = serde_json::from_str(body)
            .map_err(|e| LeerIdError::InvalidRosterPayload(e.to_string()))?;
        Self::from_payload(&payload)
    }

    /// Build the lookup table from a decoded payload. A falsy status is a
    /// rejection; the error description is carried in the error.
    pub fn from_payload(payload: &RosterPayload) -> Result<Self> {
        if !is_truthy(&payload.status) {
            return Err(LeerIdError::RosterRejected(describe(&payload.data)));
        }
        let items = payload.data.as_array().ok_or_else(|| {
            LeerIdError::InvalidRosterPayload("'data' is not an array".into())
        })?;

        let mut entries = HashMap::with_capacity(items.len());
        for item in items {
            let record_number = int_field(item, "stamboeknummer")?;
            let entry = RosterEntry {
                institution_number: int_field(item, "instellingsnummer")?
                    .try_into()
                    .map_err(|_| invalid_field("instellingsnummer", item))?,
                student_number: int_field(item, "leerlingnummer")?,
                class_code: text_field(item, "klascode")?,
            };
            entries.insert(record_number, entry);
        }
        Ok(Roster { entries })
    }

    pub fn get(&self, record_number: u64) -> Option<&RosterEntry> {
        self.entries.get(&record_number)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false")),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "no error description".into(),
        other => other.to_string(),
    }
}

fn invalid_field(name: &str, item: &Value) -> LeerIdError {
    LeerIdError::InvalidRosterPayload(format!("field '{name}' invalid in {item}"))
}

fn int_field(item: &Value, name: &str) -> Result<u64> {
    let parsed = match item.get(name) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| invalid_field(name, item))
}

fn text_field(item: &Value, name: &str) -> Result<String> {
    match item.get(name) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(invalid_field(name, item)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_status_builds_one_entry_per_student() {
        let body = r#"{
            "status": true,
            "data": [
                {"stamboeknummer": "1001", "instellingsnummer": "30569", "leerlingnummer": 7001, "klascode": "1A"},
                {"stamboeknummer": 1002, "instellingsnummer": 30569, "leerlingnummer": "7002", "klascode": "1B"},
                {"stamboeknummer": 1003, "instellingsnummer": 30593, "leerlingnummer": 7003, "klascode": 2}
            ]
        }"#;
        let roster = Roster::from_body(body).unwrap();

        assert_eq!(roster.len(), 3);
        assert_eq!(
            roster.get(1001),
            Some(&RosterEntry {
                institution_number: 30569,
                student_number: 7001,
                class_code: "1A".into(),
            })
        );
        assert_eq!(roster.get(1002).unwrap().student_number, 7002);
        assert_eq!(roster.get(1003).unwrap().class_code, "2");
    }

    #[test]
    fn falsy_status_is_a_rejection() {
        let body = r#"{"status": false, "data": "invalid api key"}"#;
        match Roster::from_body(body) {
            Err(LeerIdError::RosterRejected(msg)) => assert_eq!(msg, "invalid api key"),
            other => panic!("unexpected result: {other:?}"),
        }

        let body = r#"{"status": 0, "data": {"code": 3}}"#;
        assert!(matches!(
            Roster::from_body(body),
            Err(LeerIdError::RosterRejected(_))
        ));
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(
            Roster::from_body("<html>gateway timeout</html>"),
            Err(LeerIdError::InvalidRosterPayload(_))
        ));
    }

    #[test]
    fn non_numeric_record_number_is_rejected() {
        let body = r#"{"status": true, "data": [
            {"stamboeknummer": "abc", "instellingsnummer": 1, "leerlingnummer": 1, "klascode": "1A"}
        ]}"#;
        assert!(matches!(
            Roster::from_body(body),
            Err(LeerIdError::InvalidRosterPayload(_))
        ));
    }
}
