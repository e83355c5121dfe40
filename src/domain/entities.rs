//! Domain entities: record schemas of the investigation data

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Loosely typed value of a single record field.
///
/// Upstream rows come from spreadsheets and SQL dumps, so the same column may
/// arrive as a string, a number or a boolean. Presence follows JavaScript
/// truthiness: `""`, `0`, `false` and `null` count as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldValue(Value);

impl FieldValue {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn is_truthy(&self) -> bool {
        match &self.0 {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    /// Numeric view of the value; numeric strings are accepted, anything else is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match &self.0 {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
            }
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self(Value::String(s.to_string()))
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, &self.0)
    }
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Null => Ok(()),
        Value::Bool(b) => write!(f, "{}", b),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => write!(f, "{}", i),
            (_, Some(u), _) => write!(f, "{}", u),
            // integral floats print without a trailing ".0"
            (_, _, Some(x)) if x.fract() == 0.0 && x.abs() < 1e15 => write!(f, "{}", x as i64),
            (_, _, Some(x)) => write!(f, "{}", x),
            _ => write!(f, "{}", n),
        },
        Value::String(s) => f.write_str(s),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write_value(f, item)?;
            }
            Ok(())
        }
        Value::Object(_) => write!(f, "{}", value),
    }
}

/// The field, if it is present in the truthy sense.
pub fn present(field: &Option<FieldValue>) -> Option<&FieldValue> {
    field.as_ref().filter(|v| v.is_truthy())
}

/// Row of the `users` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UserRecord {
    pub user_id: Option<FieldValue>,
    pub name: Option<FieldValue>,
    pub phone_number: Option<FieldValue>,
    pub email: Option<FieldValue>,
    pub registration_time: Option<FieldValue>,
    pub source: Option<FieldValue>,
}

/// Row of the `transactions` table (exchange trades).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransactionRecord {
    pub user_id: Option<FieldValue>,
    pub transaction_time: Option<FieldValue>,
    pub transaction_type: Option<FieldValue>,
    pub base_asset: Option<FieldValue>,
    pub total_amount: Option<FieldValue>,
}

/// Row of the `asset_movements` table (deposits, withdrawals, transfers).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AssetMovementRecord {
    pub transaction_time: Option<FieldValue>,
    pub asset: Option<FieldValue>,
    pub direction: Option<FieldValue>,
    pub network: Option<FieldValue>,
    pub quantity: Option<FieldValue>,
}

/// Row of the `login_logs` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoginLogRecord {
    pub login_ip: Option<FieldValue>,
    pub login_time: Option<FieldValue>,
    pub device_id: Option<FieldValue>,
}

/// Row of the `devices` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DeviceRecord {
    pub device_id: Option<FieldValue>,
    pub client_type: Option<FieldValue>,
    pub ip_address: Option<FieldValue>,
    pub add_time: Option<FieldValue>,
    pub source: Option<FieldValue>,
    #[serde(deserialize_with = "deserialize_extra_data")]
    pub extra_data: Option<ExtraData>,
}

/// Free-form device attributes, decoded once at ingestion.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtraData {
    /// Decoded object, keys in document order.
    Fields(Vec<(String, FieldValue)>),
    /// Value that is not (or does not decode to) a JSON object. Shown verbatim,
    /// so a scalar like `"123"` still surfaces as `额外数据: 123`.
    Raw(String),
}

impl ExtraData {
    /// Decode an `extra_data` column. Falsy values yield `None`.
    pub fn decode(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self::from_map(map)),
            Value::String(raw) if raw.is_empty() => None,
            Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(map)) => Some(Self::from_map(map)),
                Ok(other) => {
                    debug!("extra_data decodes to non-object {:?}, keeping raw", other);
                    Some(Self::Raw(raw))
                }
                Err(e) => {
                    debug!("extra_data is not valid JSON ({}), keeping raw", e);
                    Some(Self::Raw(raw))
                }
            },
            other => {
                let field = FieldValue(other);
                field
                    .is_truthy()
                    .then(|| Self::Raw(field.to_string()))
            }
        }
    }

    fn from_map(map: Map<String, Value>) -> Self {
        Self::Fields(
            map.into_iter()
                .map(|(k, v)| (k, FieldValue(v)))
                .collect(),
        )
    }
}

fn deserialize_extra_data<'de, D>(deserializer: D) -> Result<Option<ExtraData>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(ExtraData::decode(value))
}

/// Metadata row describing an uploaded spreadsheet.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceFileRecord {
    pub original_filename: Option<FieldValue>,
    pub file_name: Option<FieldValue>,
    pub file_size: Option<FieldValue>,
    pub upload_time: Option<FieldValue>,
    pub platform: Option<FieldValue>,
    pub record_count: Option<FieldValue>,
    pub status: Option<FieldValue>,
}

/// Entry of the `source_files` list: a metadata object, or a bare file name
/// from the older API.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceFileEntry {
    Detailed(SourceFileRecord),
    Legacy(Option<FieldValue>),
}

impl SourceFileEntry {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(_) => Self::Detailed(record_from_value(value, "source_files")),
            Value::Array(_) => Self::Detailed(SourceFileRecord::default()),
            Value::Null => Self::Legacy(None),
            other => Self::Legacy(Some(FieldValue(other.clone()))),
        }
    }
}

/// Optional identity supplied next to the bag (from the search API).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    pub user_id: Option<FieldValue>,
    pub name: Option<FieldValue>,
}

impl UserInfo {
    pub fn new(user_id: Option<&str>, name: Option<&str>) -> Self {
        Self {
            user_id: user_id.map(FieldValue::from),
            name: name.map(FieldValue::from),
        }
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        UserInfo::deserialize(value).ok()
    }

    /// Overlay `other` onto self: present fields of `other` win.
    pub fn merged_with(&self, other: &UserInfo) -> UserInfo {
        UserInfo {
            user_id: present(&other.user_id)
                .cloned()
                .or_else(|| self.user_id.clone()),
            name: present(&other.name).cloned().or_else(|| self.name.clone()),
        }
    }
}

/// All records of one investigated account, keyed by entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordBag {
    pub users: Vec<UserRecord>,
    pub transactions: Vec<TransactionRecord>,
    pub asset_movements: Vec<AssetMovementRecord>,
    pub login_logs: Vec<LoginLogRecord>,
    pub devices: Vec<DeviceRecord>,
    pub source_files: Vec<SourceFileEntry>,
}

impl RecordBag {
    /// Ingest a decoded JSON document. Returns `None` unless it is an object.
    ///
    /// Missing, `null` or non-array entity lists become empty lists;
    /// non-object rows become all-absent records.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        Some(Self {
            users: records(object, "users"),
            transactions: records(object, "transactions"),
            asset_movements: records(object, "asset_movements"),
            login_logs: records(object, "login_logs"),
            devices: records(object, "devices"),
            source_files: entries(object, "source_files")
                .iter()
                .map(SourceFileEntry::from_value)
                .collect(),
        })
    }

    pub fn total_records(&self) -> usize {
        self.users.len()
            + self.transactions.len()
            + self.asset_movements.len()
            + self.login_logs.len()
            + self.devices.len()
            + self.source_files.len()
    }
}

fn entries<'a>(object: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    match object.get(key) {
        Some(Value::Array(items)) => items,
        None | Some(Value::Null) => &[],
        Some(other) => {
            warn!("'{}' is not a list ({}), treating as empty", key, type_name(other));
            &[]
        }
    }
}

fn records<T: DeserializeOwned + Default>(object: &Map<String, Value>, key: &str) -> Vec<T> {
    entries(object, key)
        .iter()
        .map(|value| record_from_value(value, key))
        .collect()
}

fn record_from_value<T: DeserializeOwned + Default>(value: &Value, key: &str) -> T {
    if !value.is_object() {
        debug!("non-object row in '{}': {}", key, type_name(value));
        return T::default();
    }
    match T::deserialize(value) {
        Ok(record) => record,
        Err(e) => {
            warn!("unreadable row in '{}': {}", key, e);
            T::default()
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
