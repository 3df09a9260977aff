use serde_json::{Map, Value};

/// All record primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// A persisted (or to-be-persisted) row, keyed by column name.
pub type Record = Map<String, Value>;

/// Read an integer `id` out of a record, accepting numeric strings.
pub fn record_id(record: &Record) -> Option<DbId> {
    match record.get("id")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
