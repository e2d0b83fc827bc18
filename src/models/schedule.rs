use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::time::{format_hhmm, parse_hhmm};
use crate::services::scheduling::SchedulingError;

const DAY_KEYS: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaySchedule {
    Off,
    Window { start: NaiveTime, end: NaiveTime },
}

/// Recurring weekly availability of one staff member.
///
/// Days that were never set count as off. A schedule with no days set at all
/// means no schedule has been configured for the staff member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    days: [Option<DaySchedule>; 7],
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(s: &str) -> Result<Self, SchedulingError> {
        serde_json::from_str(s).map_err(|e| SchedulingError::InvalidSchedule(e.to_string()))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn with_window(
        mut self,
        day: Weekday,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Self, SchedulingError> {
        if start >= end {
            return Err(SchedulingError::InvalidSchedule(format!(
                "{}: start {} is not before end {}",
                DAY_KEYS[day_index(day)],
                format_hhmm(&start),
                format_hhmm(&end)
            )));
        }
        self.days[day_index(day)] = Some(DaySchedule::Window { start, end });
        Ok(self)
    }

    pub fn with_day_off(mut self, day: Weekday) -> Self {
        self.days[day_index(day)] = Some(DaySchedule::Off);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.days.iter().all(Option::is_none)
    }

    pub fn day(&self, day: Weekday) -> DaySchedule {
        self.days[day_index(day)].unwrap_or(DaySchedule::Off)
    }

    pub fn window(&self, day: Weekday) -> Option<(NaiveTime, NaiveTime)> {
        match self.day(day) {
            DaySchedule::Window { start, end } => Some((start, end)),
            DaySchedule::Off => None,
        }
    }

    /// True when `time` falls inside the window for the weekday of `date`,
    /// both ends inclusive.
    pub fn is_working_at(&self, date: NaiveDate, time: NaiveTime) -> bool {
        self.window(date.weekday())
            .map(|(start, end)| start <= time && time <= end)
            .unwrap_or(false)
    }

    /// True when the whole `[start, end)` slot lies inside that day's window.
    pub fn fits(&self, date: NaiveDate, start: NaiveTime, end: NaiveTime) -> bool {
        self.window(date.weekday())
            .map(|(open, close)| open <= start && end <= close)
            .unwrap_or(false)
    }

    pub fn to_human_readable(&self) -> String {
        self.days
            .iter()
            .enumerate()
            .filter_map(|(i, day)| match day {
                Some(DaySchedule::Window { start, end }) => Some(format!(
                    "{}: {}-{}",
                    capitalize(DAY_KEYS[i]),
                    format_hhmm(start),
                    format_hhmm(end)
                )),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn day_index(day: Weekday) -> usize {
    day.num_days_from_monday() as usize
}

fn capitalize(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().to_string() + c.as_str(),
    }
}

// Wire form: {"mon": ["09:00", "17:00"], "sun": "off"}
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawDay {
    Window([String; 2]),
    Off(String),
}

impl Serialize for Schedule {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut raw = Vec::with_capacity(7);
        for (i, day) in self.days.iter().enumerate() {
            let value = match day {
                Some(DaySchedule::Window { start, end }) => {
                    RawDay::Window([format_hhmm(start), format_hhmm(end)])
                }
                Some(DaySchedule::Off) => RawDay::Off("off".to_string()),
                None => continue,
            };
            raw.push((DAY_KEYS[i], value));
        }
        s.collect_map(raw)
    }
}

impl<'de> Deserialize<'de> for Schedule {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw: BTreeMap<String, RawDay> = BTreeMap::deserialize(d)?;
        let mut schedule = Schedule::new();
        for (key, value) in raw {
            let day: Weekday = key
                .parse()
                .map_err(|_| serde::de::Error::custom(format!("invalid weekday: {key}")))?;
            schedule = match value {
                RawDay::Off(s) if s.eq_ignore_ascii_case("off") => schedule.with_day_off(day),
                RawDay::Off(s) => {
                    return Err(serde::de::Error::custom(format!(
                        "invalid schedule for {key}: {s}"
                    )))
                }
                RawDay::Window([start, end]) => {
                    let start = parse_hhmm(&start).map_err(serde::de::Error::custom)?;
                    let end = parse_hhmm(&end).map_err(serde::de::Error::custom)?;
                    schedule
                        .with_window(day, start, end)
                        .map_err(serde::de::Error::custom)?
                }
            };
        }
        Ok(schedule)
    }
}
