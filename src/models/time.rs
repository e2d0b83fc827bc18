use chrono::{NaiveTime, Timelike};

use crate::services::scheduling::SchedulingError;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Parses a wall-clock time written as `HH:MM`.
pub fn parse_hhmm(s: &str) -> Result<NaiveTime, SchedulingError> {
    let invalid = || SchedulingError::InvalidTime(s.to_string());

    let parts: Vec<&str> = s.trim().split(':').collect();
    if parts.len() != 2 {
        return Err(invalid());
    }
    let hour: u32 = parts[0].parse().map_err(|_| invalid())?;
    let minute: u32 = parts[1].parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

pub fn format_hhmm(t: &NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

pub fn minutes_of_day(t: &NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}

/// Serde adapter for `NaiveTime` fields carried as `HH:MM` strings.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_hhmm(t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_hhmm(&raw).map_err(serde::de::Error::custom)
    }
}

pub mod hhmm_option {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match t {
            Some(t) => s.serialize_some(&super::format_hhmm(t)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|raw| super::parse_hhmm(&raw))
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}
