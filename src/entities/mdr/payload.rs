//! Discipline payloads for MDR reports
//!
//! Reports are stored with a free-form JSON `data` column. Decoding happens
//! once, here, and never fails: every field has a default, numbers may arrive
//! as JSON numbers or numeric strings, unknown keys are ignored, and a payload
//! that is not a JSON object decodes to the discipline's default payload with
//! [`Integrity::Malformed`].

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::{Discipline, Integrity};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CuttingData {
    #[serde(deserialize_with = "lenient_string")]
    pub drawing_no: String,
    #[serde(deserialize_with = "lenient_string")]
    pub mark_no: String,
    #[serde(deserialize_with = "lenient_string")]
    pub material: String,
    #[serde(deserialize_with = "lenient_string")]
    pub heat_no: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub quantity: i64,
    /// Cut length in mm
    #[serde(deserialize_with = "lenient_f64")]
    pub length: f64,
    #[serde(deserialize_with = "lenient_string")]
    pub remarks: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitupData {
    #[serde(deserialize_with = "lenient_string")]
    pub joint_no: String,
    #[serde(deserialize_with = "lenient_string")]
    pub drawing_no: String,
    /// Parts being joined, e.g. "B1 + P3"
    #[serde(deserialize_with = "lenient_string")]
    pub parts: String,
    /// Root gap in mm
    #[serde(deserialize_with = "lenient_f64")]
    pub gap: f64,
    /// Bevel angle in degrees
    #[serde(deserialize_with = "lenient_f64")]
    pub bevel_angle: f64,
    #[serde(deserialize_with = "lenient_string")]
    pub remarks: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NdtData {
    #[serde(deserialize_with = "lenient_string")]
    pub joint_no: String,
    /// RT, UT, MT, PT, ...
    #[serde(deserialize_with = "lenient_string")]
    pub method: String,
    /// Acceptance standard
    #[serde(deserialize_with = "lenient_string")]
    pub spec: String,
    #[serde(deserialize_with = "lenient_string")]
    pub defects: String,
    #[serde(deserialize_with = "lenient_string")]
    pub remarks: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaintingData {
    #[serde(deserialize_with = "lenient_string")]
    pub area: String,
    /// Paint system reference
    #[serde(deserialize_with = "lenient_string")]
    pub system: String,
    /// Coat, e.g. "primer", "intermediate", "top"
    #[serde(deserialize_with = "lenient_string")]
    pub coat: String,
    /// Surface temperature in °C
    #[serde(deserialize_with = "lenient_f64")]
    pub temp: f64,
    /// Relative humidity in percent
    #[serde(deserialize_with = "lenient_f64")]
    pub humidity: f64,
    /// Dry film thickness in µm
    #[serde(deserialize_with = "lenient_f64")]
    pub thickness: f64,
    #[serde(deserialize_with = "lenient_string")]
    pub remarks: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeldingData {
    #[serde(deserialize_with = "lenient_string")]
    pub joint_no: String,
    #[serde(deserialize_with = "lenient_string")]
    pub drawing_no: String,
    /// Welder entity id; an unreadable id is kept as text but never resolved
    #[serde(deserialize_with = "lenient_string")]
    pub welder_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub wps_no: String,
    #[serde(deserialize_with = "lenient_string")]
    pub position: String,
    /// Weld length in mm
    #[serde(deserialize_with = "lenient_f64")]
    pub length: f64,
    #[serde(deserialize_with = "lenient_string")]
    pub remarks: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncomingData {
    #[serde(deserialize_with = "lenient_string")]
    pub item: String,
    #[serde(deserialize_with = "lenient_string")]
    pub supplier: String,
    #[serde(deserialize_with = "lenient_string")]
    pub po_no: String,
    #[serde(deserialize_with = "lenient_string")]
    pub heat_no: String,
    /// Mill certificate number
    #[serde(deserialize_with = "lenient_string")]
    pub cert_no: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub quantity: i64,
    #[serde(deserialize_with = "lenient_string")]
    pub remarks: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinalData {
    #[serde(deserialize_with = "lenient_string")]
    pub item: String,
    #[serde(deserialize_with = "lenient_string")]
    pub drawing_no: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub dimensions_ok: bool,
    #[serde(deserialize_with = "lenient_bool")]
    pub visual_ok: bool,
    #[serde(deserialize_with = "lenient_string")]
    pub remarks: String,
}

/// Strongly typed MDR payload, one variant per discipline
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MdrPayload {
    Cutting(CuttingData),
    Fitup(FitupData),
    Ndt(NdtData),
    Painting(PaintingData),
    Welding(WeldingData),
    Incoming(IncomingData),
    Final(FinalData),
}

impl MdrPayload {
    /// The default (all fields empty / zero) payload for a discipline
    pub fn empty(discipline: Discipline) -> Self {
        match discipline {
            Discipline::Cutting => MdrPayload::Cutting(CuttingData::default()),
            Discipline::Fitup => MdrPayload::Fitup(FitupData::default()),
            Discipline::Ndt => MdrPayload::Ndt(NdtData::default()),
            Discipline::Painting => MdrPayload::Painting(PaintingData::default()),
            Discipline::Welding => MdrPayload::Welding(WeldingData::default()),
            Discipline::Incoming => MdrPayload::Incoming(IncomingData::default()),
            Discipline::Final => MdrPayload::Final(FinalData::default()),
        }
    }

    pub fn discipline(&self) -> Discipline {
        match self {
            MdrPayload::Cutting(_) => Discipline::Cutting,
            MdrPayload::Fitup(_) => Discipline::Fitup,
            MdrPayload::Ndt(_) => Discipline::Ndt,
            MdrPayload::Painting(_) => Discipline::Painting,
            MdrPayload::Welding(_) => Discipline::Welding,
            MdrPayload::Incoming(_) => Discipline::Incoming,
            MdrPayload::Final(_) => Discipline::Final,
        }
    }

    /// Decode a stored `data` column. Never fails.
    pub fn decode(discipline: Discipline, raw: &str) -> (Self, Integrity) {
        let value: JsonValue = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(%discipline, error = %e, "MDR payload is not valid JSON, using defaults");
                return (Self::empty(discipline), Integrity::Malformed);
            }
        };
        Self::from_json(discipline, value)
    }

    /// Decode an already parsed JSON value. Never fails.
    pub fn from_json(discipline: Discipline, value: JsonValue) -> (Self, Integrity) {
        if !value.is_object() {
            tracing::warn!(%discipline, "MDR payload is not a JSON object, using defaults");
            return (Self::empty(discipline), Integrity::Malformed);
        }

        let decoded = match discipline {
            Discipline::Cutting => serde_json::from_value(value).map(MdrPayload::Cutting),
            Discipline::Fitup => serde_json::from_value(value).map(MdrPayload::Fitup),
            Discipline::Ndt => serde_json::from_value(value).map(MdrPayload::Ndt),
            Discipline::Painting => serde_json::from_value(value).map(MdrPayload::Painting),
            Discipline::Welding => serde_json::from_value(value).map(MdrPayload::Welding),
            Discipline::Incoming => serde_json::from_value(value).map(MdrPayload::Incoming),
            Discipline::Final => serde_json::from_value(value).map(MdrPayload::Final),
        };

        match decoded {
            Ok(payload) => (payload, Integrity::Ok),
            Err(e) => {
                tracing::warn!(%discipline, error = %e, "MDR payload could not be decoded, using defaults");
                (Self::empty(discipline), Integrity::Malformed)
            }
        }
    }

    /// Serialize to the JSON object stored in the `data` column
    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Set one field from text the user typed. Numeric and yes/no fields
    /// must parse; an empty value resets the field to its default.
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<(), FieldError> {
        let discipline = self.discipline();
        let mut object = match serde_json::to_value(&*self) {
            Ok(JsonValue::Object(map)) => map,
            _ => return Err(FieldError::Unknown(key.to_string())),
        };
        let Some(current) = object.get(key) else {
            return Err(FieldError::Unknown(key.to_string()));
        };
        let typed = strict_value(key, current, value)?;
        object.insert(key.to_string(), typed);
        match Self::from_json(discipline, JsonValue::Object(object)) {
            (payload, Integrity::Ok) => {
                *self = payload;
                Ok(())
            }
            (_, Integrity::Malformed) => Err(FieldError::Unknown(key.to_string())),
        }
    }

    /// Field names of this discipline, sorted
    pub fn field_names(&self) -> Vec<String> {
        match serde_json::to_value(self) {
            Ok(JsonValue::Object(map)) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// One-line description used in list tables
    pub fn headline(&self) -> String {
        let join = |parts: &[&str]| {
            parts
                .iter()
                .filter(|p| !p.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join(" / ")
        };
        match self {
            MdrPayload::Cutting(d) => join(&[&d.drawing_no, &d.mark_no, &d.heat_no]),
            MdrPayload::Fitup(d) => join(&[&d.joint_no, &d.drawing_no, &d.parts]),
            MdrPayload::Ndt(d) => join(&[&d.joint_no, &d.method, &d.spec]),
            MdrPayload::Painting(d) => join(&[&d.area, &d.system, &d.coat]),
            MdrPayload::Welding(d) => join(&[&d.joint_no, &d.wps_no, &d.position]),
            MdrPayload::Incoming(d) => join(&[&d.item, &d.supplier, &d.heat_no]),
            MdrPayload::Final(d) => join(&[&d.item, &d.drawing_no]),
        }
    }
}

/// Why a typed field value was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("unknown field '{0}'")]
    Unknown(String),

    #[error("'{field}' must be {expected}, got '{value}'")]
    Invalid {
        field: String,
        expected: &'static str,
        value: String,
    },
}

/// Parse user text into the JSON type the field already holds
fn strict_value(key: &str, current: &JsonValue, text: &str) -> Result<JsonValue, FieldError> {
    let trimmed = text.trim();
    let invalid = |expected| FieldError::Invalid {
        field: key.to_string(),
        expected,
        value: text.to_string(),
    };
    match current {
        JsonValue::Number(_) if trimmed.is_empty() => Ok(JsonValue::from(0)),
        JsonValue::Bool(_) if trimmed.is_empty() => Ok(JsonValue::Bool(false)),
        JsonValue::Number(n) if n.is_f64() => trimmed
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(JsonValue::from)
            .ok_or_else(|| invalid("a number")),
        JsonValue::Number(_) => trimmed
            .parse::<i64>()
            .map(JsonValue::from)
            .map_err(|_| invalid("a whole number")),
        JsonValue::Bool(_) => match trimmed.to_lowercase().as_str() {
            "true" | "yes" | "y" | "1" | "ok" => Ok(JsonValue::Bool(true)),
            "false" | "no" | "n" | "0" => Ok(JsonValue::Bool(false)),
            _ => Err(invalid("yes or no")),
        },
        _ => Ok(JsonValue::String(text.to_string())),
    }
}

fn finite(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::Number(n) => finite(n.as_f64().unwrap_or(0.0)),
        JsonValue::String(s) => finite(s.trim().parse().unwrap_or(0.0)),
        _ => 0.0,
    })
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::Number(n) => n
            .as_i64()
            .unwrap_or_else(|| finite(n.as_f64().unwrap_or(0.0)).trunc() as i64),
        JsonValue::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .unwrap_or_else(|_| finite(s.parse::<f64>().unwrap_or(0.0)).trunc() as i64)
        }
        _ => 0,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => s,
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::Bool(b) => b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        JsonValue::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "yes" | "y" | "1" | "ok"
        ),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_well_formed() {
        let (payload, integrity) = MdrPayload::decode(
            Discipline::Painting,
            r#"{"area":"Deck","system":"EP-3","temp":24.5,"humidity":60,"thickness":125}"#,
        );
        assert_eq!(integrity, Integrity::Ok);
        let MdrPayload::Painting(d) = payload else {
            panic!("expected painting payload");
        };
        assert_eq!(d.area, "Deck");
        assert_eq!(d.humidity, 60.0);
        assert_eq!(d.thickness, 125.0);
        assert_eq!(d.coat, "");
    }

    #[test]
    fn test_decode_invalid_json_defaults() {
        let (payload, integrity) = MdrPayload::decode(Discipline::Fitup, "{not json");
        assert_eq!(integrity, Integrity::Malformed);
        assert_eq!(payload, MdrPayload::Fitup(FitupData::default()));
    }

    #[test]
    fn test_decode_non_object_defaults() {
        for raw in ["null", "[1,2,3]", "42", "\"text\"", ""] {
            let (payload, integrity) = MdrPayload::decode(Discipline::Cutting, raw);
            assert_eq!(integrity, Integrity::Malformed, "raw: {raw:?}");
            assert_eq!(payload, MdrPayload::Cutting(CuttingData::default()));
        }
    }

    #[test]
    fn test_decode_numeric_strings_and_bad_values() {
        let (payload, integrity) = MdrPayload::decode(
            Discipline::Cutting,
            r#"{"quantity":"12","length":"abc","heat_no":4711,"mark_no":null,"extra":{"x":1}}"#,
        );
        assert_eq!(integrity, Integrity::Ok);
        let MdrPayload::Cutting(d) = payload else {
            panic!("expected cutting payload");
        };
        assert_eq!(d.quantity, 12);
        assert_eq!(d.length, 0.0);
        assert_eq!(d.heat_no, "4711");
        assert_eq!(d.mark_no, "");
    }

    #[test]
    fn test_decode_rejects_non_finite() {
        let (payload, _) = MdrPayload::decode(Discipline::Fitup, r#"{"gap":"NaN"}"#);
        let MdrPayload::Fitup(d) = payload else {
            panic!("expected fitup payload");
        };
        assert_eq!(d.gap, 0.0);
    }

    #[test]
    fn test_lenient_bool() {
        let (payload, _) = MdrPayload::decode(
            Discipline::Final,
            r#"{"dimensions_ok":"yes","visual_ok":0}"#,
        );
        let MdrPayload::Final(d) = payload else {
            panic!("expected final payload");
        };
        assert!(d.dimensions_ok);
        assert!(!d.visual_ok);
    }

    #[test]
    fn test_encode_roundtrip_keeps_discipline_fields() {
        let mut payload = MdrPayload::empty(Discipline::Ndt);
        payload.set_field("method", "UT").unwrap();
        assert_eq!(
            payload.set_field("thickness", "10"),
            Err(FieldError::Unknown("thickness".to_string()))
        );
        let (decoded, integrity) = MdrPayload::decode(Discipline::Ndt, &payload.encode());
        assert_eq!(integrity, Integrity::Ok);
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_set_field_numeric() {
        let mut payload = MdrPayload::empty(Discipline::Fitup);
        payload.set_field("gap", "2.5").unwrap();
        let MdrPayload::Fitup(d) = &payload else {
            panic!("expected fitup payload");
        };
        assert_eq!(d.gap, 2.5);
    }

    #[test]
    fn test_set_field_rejects_unparseable_input() {
        let mut payload = MdrPayload::empty(Discipline::Fitup);
        payload.set_field("gap", "3").unwrap();

        let err = payload.set_field("gap", "abc").unwrap_err();
        assert!(matches!(err, FieldError::Invalid { ref field, .. } if field == "gap"));
        assert!(payload.set_field("bevel_angle", "inf").is_err());
        // The rejected value never reaches the payload
        let MdrPayload::Fitup(d) = &payload else {
            panic!("expected fitup payload");
        };
        assert_eq!(d.gap, 3.0);

        let mut cutting = MdrPayload::empty(Discipline::Cutting);
        assert!(cutting.set_field("quantity", "2.5").is_err());
        cutting.set_field("quantity", " 4 ").unwrap();
        cutting.set_field("quantity", "").unwrap();

        let mut final_check = MdrPayload::empty(Discipline::Final);
        final_check.set_field("visual_ok", "Yes").unwrap();
        assert!(final_check.set_field("dimensions_ok", "maybe").is_err());
        let MdrPayload::Final(d) = &final_check else {
            panic!("expected final payload");
        };
        assert!(d.visual_ok);
    }
}
