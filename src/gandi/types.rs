use std::fmt;

use chrono::NaiveDateTime;

use super::xmlrpc::Value;
use crate::error::RpcError;

/// Server-assigned zone identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneId(pub i64);

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ZoneId> for Value {
    fn from(id: ZoneId) -> Self {
        Value::Int(id.0)
    }
}

/// Every zone is created with this version, empty.
pub const INITIAL_VERSION: i64 = 1;

// Returned by domain.zone.create
#[derive(Clone, Debug, PartialEq)]
pub struct ZoneInfo {
    pub id: ZoneId,
    pub name: String,
    pub version: Option<i64>,
    pub date_updated: Option<NaiveDateTime>,
}

impl TryFrom<Value> for ZoneInfo {
    type Error = RpcError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let id = value
            .member("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| RpcError::malformed("zone info without integer id"))?;
        let name = value
            .member("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let version = value.member("version").and_then(Value::as_i64);
        let date_updated = match value.member("date_updated") {
            Some(Value::DateTime(dt)) => Some(*dt),
            _ => None,
        };

        Ok(ZoneInfo {
            id: ZoneId(id),
            name,
            version,
            date_updated,
        })
    }
}

// One entry of the list returned by domain.zone.record.set
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordInfo {
    pub id: Option<i64>,
    pub name: String, // "www", "@"
    pub rtype: String, // "A", "MX", ...
    pub value: String,
    pub ttl: Option<i64>,
}

impl TryFrom<&Value> for RecordInfo {
    type Error = RpcError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        if !matches!(value, Value::Struct(_)) {
            return Err(RpcError::malformed(format!(
                "record is a {}, expected struct",
                value.type_name()
            )));
        }
        let text = |key: &str| {
            value
                .member(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Ok(RecordInfo {
            id: value.member("id").and_then(Value::as_i64),
            name: text("name"),
            rtype: text("type"),
            value: text("value"),
            ttl: value.member("ttl").and_then(Value::as_i64),
        })
    }
}

pub fn records_from_value(value: Value) -> Result<Vec<RecordInfo>, RpcError> {
    match value {
        Value::Array(items) => items.iter().map(RecordInfo::try_from).collect(),
        other => Err(RpcError::malformed(format!(
            "record list is a {}, expected array",
            other.type_name()
        ))),
    }
}

/// Filter for domain.zone.count / domain.zone.list.
#[derive(Clone, Debug, Default)]
pub struct ZoneFilter {
    pub name: Option<String>,
}

impl ZoneFilter {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

impl From<&ZoneFilter> for Value {
    fn from(filter: &ZoneFilter) -> Self {
        Value::structure(
            filter
                .name
                .iter()
                .map(|name| ("name", Value::from(name.as_str()))),
        )
    }
}
