//! Event timestamps in backend-native and generic form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DomainError;

/// The backing store's native timestamp representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NativeTimestamp {
    pub seconds: i64,
    pub nanoseconds: u32,
}

impl NativeTimestamp {
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self {
            seconds: at.timestamp(),
            nanoseconds: at.timestamp_subsec_nanos(),
        }
    }

    pub fn to_datetime(self) -> Result<DateTime<Utc>, DomainError> {
        DateTime::from_timestamp(self.seconds, self.nanoseconds).ok_or(
            DomainError::InvalidTimestamp {
                seconds: self.seconds,
                nanoseconds: self.nanoseconds,
            },
        )
    }

    /// Wire form used inside native predicates.
    pub fn to_value(self) -> Value {
        serde_json::json!({ "seconds": self.seconds, "nanoseconds": self.nanoseconds })
    }

    /// Read a native timestamp from either its object form or an RFC3339 string.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(map) => {
                let seconds = map.get("seconds")?.as_i64()?;
                let nanoseconds = map.get("nanoseconds")?.as_u64()?;
                Some(Self {
                    seconds,
                    nanoseconds: u32::try_from(nanoseconds).ok()?,
                })
            }
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| Self::from_datetime(dt.with_timezone(&Utc))),
            _ => None,
        }
    }
}

/// An event's `at` value as read from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTime {
    Native(NativeTimestamp),
    Date(DateTime<Utc>),
}

impl EventTime {
    /// Convert native timestamps to dates; dates pass through untouched.
    pub fn normalized(&self) -> Result<Self, DomainError> {
        match self {
            Self::Native(ts) => ts.to_datetime().map(Self::Date),
            Self::Date(_) => Ok(self.clone()),
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native(_))
    }
}

impl From<DateTime<Utc>> for EventTime {
    fn from(at: DateTime<Utc>) -> Self {
        Self::Date(at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_native_converts_to_date() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let native = EventTime::Native(NativeTimestamp::from_datetime(at));
        assert_eq!(native.normalized().unwrap(), EventTime::Date(at));
    }

    #[test]
    fn test_date_is_left_untouched() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let date = EventTime::Date(at);
        assert_eq!(date.normalized().unwrap(), date);
    }

    #[test]
    fn test_deserializes_both_shapes() {
        let native: EventTime =
            serde_json::from_value(json!({"seconds": 1_700_000_000, "nanoseconds": 5})).unwrap();
        assert!(native.is_native());

        let date: EventTime = serde_json::from_value(json!("2024-01-15T10:30:00Z")).unwrap();
        assert!(!date.is_native());
    }

    #[test]
    fn test_out_of_range_native_is_rejected() {
        let native = NativeTimestamp {
            seconds: i64::MAX,
            nanoseconds: 0,
        };
        assert!(native.to_datetime().is_err());
    }

    #[test]
    fn test_from_value_reads_rfc3339_strings() {
        let ts = NativeTimestamp::from_value(&json!("1970-01-01T00:00:10Z")).unwrap();
        assert_eq!(ts.seconds, 10);
        assert!(NativeTimestamp::from_value(&json!("not-a-date")).is_none());
    }
}
