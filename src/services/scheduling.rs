use chrono::{Datelike, Duration, NaiveTime, Timelike};

use crate::models::time::{format_hhmm, minutes_of_day, MINUTES_PER_DAY};
use crate::models::{Appointment, AppointmentStatus, Schedule, Service};

#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("service {0} not found")]
    ServiceNotFound(i64),

    #[error("appointment starting at {start} with a {duration_minutes} minute service would end at or past midnight")]
    CrossesMidnight { start: String, duration_minutes: u32 },

    #[error("staff member is already booked for appointment {existing_id} at that time")]
    Conflict { existing_id: i64 },

    #[error("cannot move appointment from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("that time is outside the staff member's hours ({hours})")]
    OutsideSchedule { hours: String },

    #[error("invalid time: {0}")]
    InvalidTime(String),

    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),
}

/// Derives an appointment's end time from its service's duration.
///
/// Appointments must finish on the day they start: an end at or past
/// midnight is rejected rather than rolled over.
pub fn end_time(
    start: NaiveTime,
    service_id: i64,
    catalog: &[Service],
) -> Result<NaiveTime, SchedulingError> {
    let service = catalog
        .iter()
        .find(|s| s.id == service_id)
        .ok_or(SchedulingError::ServiceNotFound(service_id))?;

    let start = start.with_second(0).unwrap_or(start);
    if minutes_of_day(&start) + service.duration_minutes >= MINUTES_PER_DAY {
        return Err(SchedulingError::CrossesMidnight {
            start: format_hhmm(&start),
            duration_minutes: service.duration_minutes,
        });
    }

    Ok(start + Duration::minutes(service.duration_minutes as i64))
}

/// Whether two appointments hold the same staff member at overlapping times.
///
/// Slots are half-open, so back-to-back appointments do not conflict.
/// Cancelled appointments never conflict, and neither does an appointment
/// with itself.
pub fn has_conflict(a: &Appointment, b: &Appointment) -> bool {
    a.id != b.id
        && a.is_active()
        && b.is_active()
        && a.staff_id == b.staff_id
        && a.date == b.date
        && a.start_time < b.end_time
        && b.start_time < a.end_time
}

/// Earliest existing appointment that conflicts with `candidate`.
pub fn find_conflict<'a>(
    candidate: &Appointment,
    existing: &'a [Appointment],
) -> Option<&'a Appointment> {
    existing
        .iter()
        .filter(|e| has_conflict(candidate, e))
        .min_by_key(|e| (e.start_time, e.id))
}

/// Checks a candidate booking against the staff member's schedule and the
/// appointments already on their books.
///
/// `schedule` is `None` when schedule enforcement is disabled; an empty
/// schedule imposes no restriction either.
pub fn validate_booking(
    candidate: &Appointment,
    schedule: Option<&Schedule>,
    existing: &[Appointment],
    allow_overlap: bool,
) -> Result<(), SchedulingError> {
    if let Some(schedule) = schedule {
        if !schedule.is_empty()
            && !schedule.fits(candidate.date, candidate.start_time, candidate.end_time)
        {
            let hours = schedule.to_human_readable();
            return Err(SchedulingError::OutsideSchedule {
                hours: if hours.is_empty() {
                    format!("off on {}", candidate.date.weekday())
                } else {
                    hours
                },
            });
        }
    }

    if !allow_overlap {
        if let Some(conflict) = find_conflict(candidate, existing) {
            return Err(SchedulingError::Conflict {
                existing_id: conflict.id,
            });
        }
    }

    Ok(())
}
