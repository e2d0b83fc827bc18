use chrono::{NaiveDate, NaiveTime};

use crate::models::{Appointment, StaffMember};

/// Staff whose schedule has them working at `time` on `date`.
///
/// Days marked off, or missing from the schedule, exclude the staff member.
/// The window bounds are inclusive.
pub fn available_staff<'a>(
    date: NaiveDate,
    time: NaiveTime,
    roster: &'a [StaffMember],
) -> Vec<&'a StaffMember> {
    roster
        .iter()
        .filter(|member| member.schedule.is_working_at(date, time))
        .collect()
}

/// Like [`available_staff`], but also drops anyone already holding an active
/// appointment over `time`.
pub fn free_staff<'a>(
    date: NaiveDate,
    time: NaiveTime,
    roster: &'a [StaffMember],
    appointments: &[Appointment],
) -> Vec<&'a StaffMember> {
    available_staff(date, time, roster)
        .into_iter()
        .filter(|member| {
            !appointments.iter().any(|a| {
                a.is_active()
                    && a.staff_id == member.id
                    && a.date == date
                    && a.start_time <= time
                    && time < a.end_time
            })
        })
        .collect()
}
