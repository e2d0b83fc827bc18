use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::errors::{AppError, AppResult};
use crate::models::time::format_hhmm;
use crate::models::{Appointment, AppointmentStatus};
use crate::repositories::{
    date, format_timestamp, int, opt_text, record_id, time, timestamp, Entity, Table,
};
use crate::store::{EntityType, Filter, Record};

impl Entity for Appointment {
    const ENTITY: EntityType = EntityType::Appointment;
    const FIELDS: &'static [&'static str] = &[
        "client_id_c",
        "clientId",
        "staff_id_c",
        "staffId",
        "service_id_c",
        "serviceId",
        "date_c",
        "date",
        "start_time_c",
        "startTime",
        "end_time_c",
        "endTime",
        "status_c",
        "status",
        "notes_c",
        "notes",
        "created_at_c",
        "createdAt",
        "updated_at_c",
        "updatedAt",
    ];

    fn from_record(record: &Record) -> AppResult<Self> {
        let id = record_id(record)?;
        let status = match opt_text(record, "status_c", "status") {
            Some(raw) => AppointmentStatus::parse(&raw)
                .ok_or_else(|| AppError::Store(format!("appointment {id} has status {raw}")))?,
            None => AppointmentStatus::Pending,
        };

        Ok(Appointment {
            id,
            client_id: int(record, "client_id_c", "clientId")?,
            staff_id: int(record, "staff_id_c", "staffId")?,
            service_id: int(record, "service_id_c", "serviceId")?,
            date: date(record, "date_c", "date")?,
            start_time: time(record, "start_time_c", "startTime")?,
            end_time: time(record, "end_time_c", "endTime")?,
            status,
            notes: opt_text(record, "notes_c", "notes"),
            created_at: timestamp(record, "created_at_c", "createdAt"),
            updated_at: timestamp(record, "updated_at_c", "updatedAt"),
        })
    }
}

/// Fields written for every stored appointment. Timestamps are added by the
/// caller.
fn to_record(appointment: &Appointment) -> Record {
    Record::new()
        .with("client_id_c", appointment.client_id)
        .with("staff_id_c", appointment.staff_id)
        .with("service_id_c", appointment.service_id)
        .with("date_c", appointment.date.format("%Y-%m-%d").to_string())
        .with("start_time_c", format_hhmm(&appointment.start_time))
        .with("end_time_c", format_hhmm(&appointment.end_time))
        .with("status_c", appointment.status.as_str())
        .with("notes_c", appointment.notes.clone())
}

/// Listing filters; every field is optional and they combine with AND.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub staff_id: Option<i64>,
    pub client_id: Option<i64>,
}

pub struct AppointmentRepository {
    table: Table<Appointment>,
}

impl AppointmentRepository {
    pub fn new(table: Table<Appointment>) -> Self {
        Self { table }
    }

    pub async fn list(&self) -> AppResult<Vec<Appointment>> {
        self.table.all().await
    }

    /// Ordered by date, start time and id.
    pub async fn search(&self, query: &AppointmentQuery) -> AppResult<Vec<Appointment>> {
        self.fetch(query, false).await
    }

    async fn fetch(&self, query: &AppointmentQuery, strict: bool) -> AppResult<Vec<Appointment>> {
        let mut filters = Vec::new();
        if let Some(staff_id) = query.staff_id {
            filters.push(Filter::eq("staff_id_c", staff_id).or_legacy("staffId"));
        }
        if let Some(client_id) = query.client_id {
            filters.push(Filter::eq("client_id_c", client_id).or_legacy("clientId"));
        }

        // Legacy dates may carry a time suffix, so the range is applied to
        // the parsed day rather than pushed down as a string comparison.
        let mut appointments = if strict {
            self.table.query_strict(&filters).await?
        } else {
            self.table.query(&filters).await?
        };
        appointments.retain(|a| {
            query.from.map_or(true, |from| a.date >= from) && query.to.map_or(true, |to| a.date <= to)
        });
        appointments.sort_by_key(|a| (a.date, a.start_time, a.id));
        Ok(appointments)
    }

    pub async fn in_range(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<Appointment>> {
        self.search(&AppointmentQuery {
            from: Some(from),
            to: Some(to),
            ..Default::default()
        })
        .await
    }

    /// The bookings a new appointment for `staff_id` on `day` is checked
    /// against. An unreadable record for this staff member is an error here,
    /// since it may hold the slot.
    pub async fn for_staff_on(&self, staff_id: i64, day: NaiveDate) -> AppResult<Vec<Appointment>> {
        self.fetch(
            &AppointmentQuery {
                from: Some(day),
                to: Some(day),
                staff_id: Some(staff_id),
                client_id: None,
            },
            true,
        )
        .await
    }

    pub async fn for_client(&self, client_id: i64) -> AppResult<Vec<Appointment>> {
        self.search(&AppointmentQuery {
            client_id: Some(client_id),
            ..Default::default()
        })
        .await
    }

    pub async fn get(&self, id: i64) -> AppResult<Appointment> {
        self.table.get(id).await
    }

    /// Stores a new appointment; the id on `draft` is ignored.
    pub async fn create(&self, draft: &Appointment) -> AppResult<Appointment> {
        let now = format_timestamp(Utc::now().naive_utc());
        self.table
            .insert(to_record(draft).with("created_at_c", now))
            .await
    }

    /// Overwrites the stored appointment with `appointment`'s fields.
    pub async fn save(&self, appointment: &Appointment) -> AppResult<Appointment> {
        let now = format_timestamp(Utc::now().naive_utc());
        self.table
            .update(appointment.id, to_record(appointment).with("updated_at_c", now))
            .await
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.table.delete(id).await
    }
}
