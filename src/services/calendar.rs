use chrono::{Datelike, Days, Duration, NaiveDate, Weekday};
use serde::Serialize;

use crate::models::{Appointment, AppointmentStatus, Service};

#[derive(Debug, Clone, Serialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub weekday: String,
    pub appointments: Vec<Appointment>,
}

/// Seven day buckets, Monday through Sunday.
#[derive(Debug, Clone, Serialize)]
pub struct WeekView {
    pub week_start: NaiveDate,
    pub days: Vec<DayBucket>,
}

/// The Monday on or before `date`, or `None` past the calendar's lower bound.
pub fn week_start(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(date.weekday().num_days_from_monday() as u64))
}

/// First and last day of the week holding `reference`. `None` when either
/// falls outside the representable date range.
pub fn week_range(reference: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let start = week_start(reference)?;
    let end = start.checked_add_days(Days::new(6))?;
    Some((start, end))
}

/// Groups the appointments falling in the week of `reference` by day.
///
/// Always yields seven buckets. Each bucket is ordered by start time, then
/// id; appointments outside the week are dropped. Returns `None` for a week
/// that runs off the end of the calendar.
pub fn bucket_by_day(appointments: &[Appointment], reference: NaiveDate) -> Option<WeekView> {
    let (start, _) = week_range(reference)?;
    let mut days: Vec<DayBucket> = (0..7)
        .map(|offset| {
            let date = start + Duration::days(offset);
            DayBucket {
                date,
                weekday: weekday_name(date.weekday()).to_string(),
                appointments: Vec::new(),
            }
        })
        .collect();

    for appointment in appointments {
        let offset = (appointment.date - start).num_days();
        if (0..7).contains(&offset) {
            days[offset as usize].appointments.push(appointment.clone());
        }
    }

    for day in &mut days {
        day.appointments.sort_by_key(|a| (a.start_time, a.id));
    }

    Some(WeekView {
        week_start: start,
        days,
    })
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub fn generate_ics(appointment: &Appointment, service: Option<&Service>, business_name: &str) -> String {
    let mut out = String::from(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Salonbook//Appointments//EN\r\n",
    );
    write_event(&mut out, appointment, service, business_name);
    out.push_str("END:VCALENDAR\r\n");
    out
}

/// One calendar holding every appointment that has not been cancelled.
pub fn generate_feed(appointments: &[Appointment], catalog: &[Service], business_name: &str) -> String {
    let mut out = String::from(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Salonbook//Appointments//EN\r\n\
         X-WR-CALNAME:Appointments\r\n",
    );
    for appointment in appointments.iter().filter(|a| a.is_active()) {
        let service = catalog.iter().find(|s| s.id == appointment.service_id);
        write_event(&mut out, appointment, service, business_name);
    }
    out.push_str("END:VCALENDAR\r\n");
    out
}

fn write_event(out: &mut String, appointment: &Appointment, service: Option<&Service>, business_name: &str) {
    let dtstart = appointment.starts_at().format("%Y%m%dT%H%M%S").to_string();
    let dtend = appointment.ends_at().format("%Y%m%dT%H%M%S").to_string();
    let dtstamp = appointment
        .created_at
        .unwrap_or_else(|| appointment.starts_at())
        .format("%Y%m%dT%H%M%S")
        .to_string();
    let uid = format!("{}@salonbook", appointment.id);

    let summary = match service {
        Some(s) => format!("{} at {}", s.name, business_name),
        None => format!("Appointment at {}", business_name),
    };
    let summary = escape_text(&summary);
    let description = escape_text(
        appointment
            .notes
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or("No additional notes"),
    );
    let status = match appointment.status {
        AppointmentStatus::Cancelled => "CANCELLED",
        AppointmentStatus::Pending => "TENTATIVE",
        _ => "CONFIRMED",
    };

    out.push_str(&format!(
        "BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         DESCRIPTION:{description}\r\n\
         STATUS:{status}\r\n\
         END:VEVENT\r\n"
    ));
}

/// Escapes a TEXT property value (RFC 5545 section 3.3.11) so it stays on
/// one content line.
fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\\n");
            }
            '\n' => out.push_str("\\n"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}
