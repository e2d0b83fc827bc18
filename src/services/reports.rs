use std::collections::HashMap;

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Appointment, AppointmentStatus, Service};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportRange {
    Week,
    #[default]
    Month,
    Year,
    All,
}

impl ReportRange {
    pub fn contains(&self, reference: NaiveDate, date: NaiveDate) -> bool {
        match self {
            ReportRange::Week => reference.iso_week() == date.iso_week(),
            ReportRange::Month => {
                reference.year() == date.year() && reference.month() == date.month()
            }
            ReportRange::Year => reference.year() == date.year(),
            ReportRange::All => true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub confirmed: usize,
    pub completed: usize,
    pub cancelled: usize,
}

impl StatusCounts {
    fn add(&mut self, status: AppointmentStatus) {
        match status {
            AppointmentStatus::Pending => self.pending += 1,
            AppointmentStatus::Confirmed => self.confirmed += 1,
            AppointmentStatus::Completed => self.completed += 1,
            AppointmentStatus::Cancelled => self.cancelled += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServicePopularity {
    pub service_id: i64,
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRevenue {
    pub month: String,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub range: ReportRange,
    pub reference: NaiveDate,
    pub revenue: Decimal,
    pub appointment_count: usize,
    pub completed_count: usize,
    pub average_ticket: Decimal,
    pub status_counts: StatusCounts,
    pub popular_services: Vec<ServicePopularity>,
    pub monthly_revenue: Vec<MonthlyRevenue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub date: NaiveDate,
    pub todays_appointments: Vec<Appointment>,
    pub todays_revenue: Decimal,
    pub total_revenue: Decimal,
    pub pending_count: usize,
    pub active_clients: usize,
}

const POPULAR_SERVICES: usize = 5;
const REVENUE_MONTHS: u32 = 6;

/// Price of the service, or zero when it is no longer on the menu.
pub fn price_of(service_id: i64, catalog: &[Service]) -> Decimal {
    catalog
        .iter()
        .find(|s| s.id == service_id)
        .map(|s| s.price)
        .unwrap_or(Decimal::ZERO)
}

/// Revenue earned by completed appointments whose date matches `keep`.
fn completed_revenue<F>(appointments: &[Appointment], catalog: &[Service], keep: F) -> Decimal
where
    F: Fn(&Appointment) -> bool,
{
    appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Completed && keep(a))
        .map(|a| price_of(a.service_id, catalog))
        .sum()
}

pub fn revenue(
    appointments: &[Appointment],
    catalog: &[Service],
    range: ReportRange,
    reference: NaiveDate,
) -> Decimal {
    completed_revenue(appointments, catalog, |a| range.contains(reference, a.date))
}

pub fn summary(
    appointments: &[Appointment],
    catalog: &[Service],
    range: ReportRange,
    reference: NaiveDate,
) -> ReportSummary {
    let in_range: Vec<&Appointment> = appointments
        .iter()
        .filter(|a| range.contains(reference, a.date))
        .collect();

    let mut status_counts = StatusCounts::default();
    let mut per_service: HashMap<i64, usize> = HashMap::new();
    for appointment in &in_range {
        status_counts.add(appointment.status);
        *per_service.entry(appointment.service_id).or_default() += 1;
    }

    let revenue = revenue(appointments, catalog, range, reference);
    let average_ticket = if status_counts.completed == 0 {
        Decimal::ZERO
    } else {
        (revenue / Decimal::from(status_counts.completed)).round_dp(2)
    };

    let mut popular_services: Vec<ServicePopularity> = per_service
        .into_iter()
        .map(|(service_id, count)| ServicePopularity {
            service_id,
            name: catalog
                .iter()
                .find(|s| s.id == service_id)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| format!("Service {service_id}")),
            count,
        })
        .collect();
    popular_services.sort_by(|a, b| b.count.cmp(&a.count).then(a.service_id.cmp(&b.service_id)));
    popular_services.truncate(POPULAR_SERVICES);

    ReportSummary {
        range,
        reference,
        revenue,
        appointment_count: in_range.len(),
        completed_count: status_counts.completed,
        average_ticket,
        status_counts,
        popular_services,
        monthly_revenue: monthly_revenue(appointments, catalog, reference),
    }
}

/// Completed revenue for the last six calendar months, oldest first.
pub fn monthly_revenue(
    appointments: &[Appointment],
    catalog: &[Service],
    reference: NaiveDate,
) -> Vec<MonthlyRevenue> {
    let first_of_month = reference.with_day(1).unwrap_or(reference);

    let mut result: Vec<MonthlyRevenue> = (0..REVENUE_MONTHS)
        .filter_map(|i| first_of_month.checked_sub_months(Months::new(i)))
        .map(|month| MonthlyRevenue {
            month: month.format("%Y-%m").to_string(),
            revenue: revenue(appointments, catalog, ReportRange::Month, month),
        })
        .collect();

    result.reverse();
    result
}

pub fn dashboard(
    appointments: &[Appointment],
    catalog: &[Service],
    client_count: usize,
    today: NaiveDate,
) -> Dashboard {
    let mut todays_appointments: Vec<Appointment> = appointments
        .iter()
        .filter(|a| a.date == today)
        .cloned()
        .collect();
    todays_appointments.sort_by_key(|a| (a.start_time, a.id));

    Dashboard {
        date: today,
        todays_revenue: completed_revenue(appointments, catalog, |a| a.date == today),
        total_revenue: completed_revenue(appointments, catalog, |_| true),
        pending_count: appointments
            .iter()
            .filter(|a| a.status == AppointmentStatus::Pending)
            .count(),
        active_clients: client_count,
        todays_appointments,
    }
}
