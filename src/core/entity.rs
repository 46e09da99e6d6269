//! Entity trait - common interface for all stored entity types

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::Row;

use crate::core::identity::{EntityId, EntityPrefix};

/// Common trait for all QC entities held by the store
///
/// Every table has an `id TEXT PRIMARY KEY` column followed by
/// [`Entity::COLUMNS`]. [`Entity::to_values`] must yield exactly one value per
/// column, in the same order.
pub trait Entity: Sized {
    /// The entity type prefix (e.g., "NCR", "MAT")
    const PREFIX: EntityPrefix;

    /// Human readable singular name (e.g., "material")
    const NAME: &'static str;

    /// Backing table
    const TABLE: &'static str;

    /// Stored columns, excluding `id`
    const COLUMNS: &'static [&'static str];

    /// Default ordering for full collection fetches
    const ORDER_BY: &'static str = "created DESC";

    /// Get the entity's unique ID
    fn id(&self) -> &EntityId;

    /// Get a short label used in prompts and notifications
    fn title(&self) -> String;

    /// Get the creation timestamp
    fn created(&self) -> DateTime<Utc>;

    /// Build the entity from a row selected as `id, COLUMNS...`
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Column values in `COLUMNS` order
    fn to_values(&self) -> Vec<Value>;
}

/// Implements `ToSql`/`FromSql` for an enum through its `Display`/`FromStr` impls
macro_rules! sql_enum {
    ($ty:ty) => {
        impl rusqlite::types::ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(rusqlite::types::ToSqlOutput::from(self.to_string()))
            }
        }

        impl rusqlite::types::FromSql for $ty {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse::<$ty>()
                    .map_err(|e| rusqlite::types::FromSqlError::Other(e.into()))
            }
        }
    };
}

pub(crate) use sql_enum;

pub fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

pub fn opt_text(s: Option<&str>) -> Value {
    s.map_or(Value::Null, text)
}

pub fn real(v: f64) -> Value {
    Value::Real(v)
}

pub fn int(v: i64) -> Value {
    Value::Integer(v)
}

pub fn flag(v: bool) -> Value {
    Value::Integer(v as i64)
}

pub fn id(v: &EntityId) -> Value {
    Value::Text(v.to_string())
}

pub fn opt_id(v: Option<&EntityId>) -> Value {
    v.map_or(Value::Null, id)
}

pub fn stamp(v: &DateTime<Utc>) -> Value {
    Value::Text(v.to_rfc3339())
}

pub fn opt_stamp(v: Option<&DateTime<Utc>>) -> Value {
    v.map_or(Value::Null, stamp)
}

pub fn date(v: &NaiveDate) -> Value {
    Value::Text(v.format("%Y-%m-%d").to_string())
}

/// Read an RFC 3339 timestamp column
pub fn get_stamp(row: &Row<'_>, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(column)?;
    parse_stamp(column, &raw)
}

/// Read a nullable RFC 3339 timestamp column
pub fn get_opt_stamp(row: &Row<'_>, column: &str) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(column)?;
    raw.map(|s| parse_stamp(column, &s)).transpose()
}

/// Read a `YYYY-MM-DD` date column
pub fn get_date(row: &Row<'_>, column: &str) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(column)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_stamp(column: &str, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            tracing::warn!(column, raw, "unparseable timestamp in store");
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_helpers() {
        assert_eq!(opt_text(None), Value::Null);
        assert_eq!(opt_text(Some("x")), Value::Text("x".to_string()));
        assert_eq!(flag(true), Value::Integer(1));
        assert_eq!(flag(false), Value::Integer(0));
    }

    #[test]
    fn test_stamp_roundtrip() {
        let now = Utc::now();
        let Value::Text(raw) = stamp(&now) else {
            panic!("timestamp should be stored as text");
        };
        let parsed = parse_stamp("created", &raw).unwrap();
        assert_eq!(parsed.timestamp_millis(), now.timestamp_millis());
    }
}
