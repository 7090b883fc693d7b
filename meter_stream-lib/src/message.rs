use std::time::Duration;
use serde::{Deserialize, Serialize};

/// One synthetic meter reading, sent as a single JSON text frame per tick.
///
/// `duration` goes over the wire as signed nanoseconds:
/// `{"meter_id": 812, "count": 3, "duration": 7000000000}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub meter_id: u32,
    pub count:    u32,
    #[serde(with = "nanos")]
    pub duration: Duration,
}

/// `Duration` <-> i64 nanoseconds
mod nanos {
    use std::time::Duration;
    use serde::{Deserialize, Deserializer, Serializer, de, ser};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        let n = i64::try_from(d.as_nanos())
            .map_err(|_| <S::Error as ser::Error>::custom("duration overflows i64 nanoseconds"))?;
        s.serialize_i64(n)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let n = i64::deserialize(d)?;
        let n = u64::try_from(n).map_err(|_| <D::Error as de::Error>::custom("negative duration"))?;
        Ok(Duration::from_nanos(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_duration_as_nanoseconds() {
        let reading = Reading { meter_id: 812, count: 3, duration: Duration::from_secs(7) };
        let json = serde_json::to_string(&reading).unwrap();
        assert_eq!(json, r#"{"meter_id":812,"count":3,"duration":7000000000}"#);
    }

    #[test]
    fn rejects_negative_duration() {
        let err = serde_json::from_str::<Reading>(r#"{"meter_id":1,"count":0,"duration":-5}"#);
        assert!(err.is_err());
    }
}
