use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OwnedMutexGuard;

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::models::time::format_hhmm;
use crate::models::{Appointment, AppointmentStatus, AppointmentUpdate, NewAppointment, StaffMember};
use crate::repositories::Repositories;
use crate::services::scheduling::{self, SchedulingError};

/// Which bookings may skip the overlap check and whether staff hours apply.
#[derive(Debug, Clone, Default)]
pub struct BookingPolicy {
    pub allow_double_booking: bool,
    pub double_booking_roles: Vec<String>,
    pub enforce_staff_schedule: bool,
}

impl From<&AppConfig> for BookingPolicy {
    fn from(config: &AppConfig) -> Self {
        Self {
            allow_double_booking: config.allow_double_booking,
            double_booking_roles: config.double_booking_roles.clone(),
            enforce_staff_schedule: config.enforce_staff_schedule,
        }
    }
}

impl BookingPolicy {
    /// Staff in a double-booking role always may overlap. Anyone else only
    /// when the request asks for it and the deployment allows it.
    pub fn allows_overlap(&self, staff: &StaffMember, requested: bool) -> bool {
        staff.has_role(&self.double_booking_roles) || (requested && self.allow_double_booking)
    }
}

/// One async mutex per id, created on first use.
#[derive(Default)]
struct KeyedLocks(Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>);

impl KeyedLocks {
    async fn lock(&self, key: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.0.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(key).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// Creates and mutates appointments.
///
/// The conflict check reads a staff member's appointments and then writes
/// the new one. Both steps run under a per-staff lock so two bookings for
/// the same person cannot interleave. Edits to an existing appointment also
/// hold its own lock from the read of its current state until the write.
/// Lock order is appointment, then staff.
pub struct BookingService {
    repos: Arc<Repositories>,
    policy: BookingPolicy,
    staff_locks: KeyedLocks,
    appointment_locks: KeyedLocks,
}

impl BookingService {
    pub fn new(repos: Arc<Repositories>, policy: BookingPolicy) -> Self {
        Self {
            repos,
            policy,
            staff_locks: KeyedLocks::default(),
            appointment_locks: KeyedLocks::default(),
        }
    }

    fn check(
        &self,
        candidate: &Appointment,
        staff: &StaffMember,
        existing: &[Appointment],
        requested_override: bool,
    ) -> Result<(), SchedulingError> {
        let schedule = self
            .policy
            .enforce_staff_schedule
            .then_some(&staff.schedule);
        let allow_overlap = self.policy.allows_overlap(staff, requested_override);

        if allow_overlap {
            if let Some(other) = scheduling::find_conflict(candidate, existing) {
                tracing::info!(
                    staff_id = staff.id,
                    overlapping_id = other.id,
                    "double booking permitted"
                );
            }
        }

        scheduling::validate_booking(candidate, schedule, existing, allow_overlap)
    }

    pub async fn create(&self, request: NewAppointment) -> AppResult<Appointment> {
        let status = request.status.unwrap_or(AppointmentStatus::Pending);
        if !matches!(
            status,
            AppointmentStatus::Pending | AppointmentStatus::Confirmed
        ) {
            return Err(AppError::Validation(format!(
                "new appointments must be pending or confirmed, not {status}"
            )));
        }

        if !self.repos.clients.exists(request.client_id).await? {
            return Err(AppError::NotFound(format!("client {}", request.client_id)));
        }
        let catalog = self.repos.services.list().await?;
        let end_time = scheduling::end_time(request.start_time, request.service_id, &catalog)?;
        let staff = self.repos.staff.get(request.staff_id).await?;

        let candidate = Appointment {
            id: 0,
            client_id: request.client_id,
            staff_id: request.staff_id,
            service_id: request.service_id,
            date: request.date,
            start_time: request.start_time,
            end_time,
            status,
            notes: request.notes.filter(|n| !n.trim().is_empty()),
            created_at: None,
            updated_at: None,
        };

        let _guard = self.staff_locks.lock(staff.id).await;
        let existing = self
            .repos
            .appointments
            .for_staff_on(staff.id, candidate.date)
            .await?;
        self.check(&candidate, &staff, &existing, request.allow_double_booking)?;

        let created = self.repos.appointments.create(&candidate).await?;
        tracing::info!(
            appointment_id = created.id,
            staff_id = created.staff_id,
            client_id = created.client_id,
            date = %created.date,
            start = %format_hhmm(&created.start_time),
            end = %format_hhmm(&created.end_time),
            "appointment booked"
        );
        Ok(created)
    }

    /// Applies a partial edit. Moving the appointment re-derives its end
    /// time and re-runs the schedule and conflict checks.
    pub async fn update(&self, id: i64, changes: AppointmentUpdate) -> AppResult<Appointment> {
        let _appointment_guard = self.appointment_locks.lock(id).await;
        let current = self.repos.appointments.get(id).await?;
        let reschedules = changes.reschedules(&current);

        if reschedules && current.status.is_terminal() {
            return Err(AppError::InvalidStatusTransition(format!(
                "cannot reschedule a {} appointment",
                current.status
            )));
        }

        let mut next = current.clone();
        if let Some(status) = changes.status.filter(|s| *s != current.status) {
            next.status = current.status.transition_to(status)?;
        }
        if let Some(client_id) = changes.client_id.filter(|c| *c != current.client_id) {
            if !self.repos.clients.exists(client_id).await? {
                return Err(AppError::NotFound(format!("client {client_id}")));
            }
            next.client_id = client_id;
        }
        if let Some(notes) = changes.notes {
            next.notes = Some(notes).filter(|n| !n.trim().is_empty());
        }

        if !reschedules {
            let saved = self.repos.appointments.save(&next).await?;
            tracing::info!(appointment_id = id, status = %saved.status, "appointment updated");
            return Ok(saved);
        }

        next.staff_id = changes.staff_id.unwrap_or(current.staff_id);
        next.service_id = changes.service_id.unwrap_or(current.service_id);
        next.date = changes.date.unwrap_or(current.date);
        next.start_time = changes.start_time.unwrap_or(current.start_time);

        let catalog = self.repos.services.list().await?;
        next.end_time = scheduling::end_time(next.start_time, next.service_id, &catalog)?;
        let staff = self.repos.staff.get(next.staff_id).await?;

        let _staff_guard = self.staff_locks.lock(staff.id).await;
        let existing = self
            .repos
            .appointments
            .for_staff_on(staff.id, next.date)
            .await?;
        self.check(&next, &staff, &existing, changes.allow_double_booking)?;

        let saved = self.repos.appointments.save(&next).await?;
        tracing::info!(
            appointment_id = id,
            staff_id = saved.staff_id,
            date = %saved.date,
            start = %format_hhmm(&saved.start_time),
            "appointment rescheduled"
        );
        Ok(saved)
    }

    pub async fn change_status(&self, id: i64, status: AppointmentStatus) -> AppResult<Appointment> {
        let _guard = self.appointment_locks.lock(id).await;
        let current = self.repos.appointments.get(id).await?;
        let mut next = current.clone();
        next.status = current.status.transition_to(status)?;

        let saved = self.repos.appointments.save(&next).await?;
        tracing::info!(
            appointment_id = id,
            from = %current.status,
            to = %saved.status,
            "appointment status changed"
        );
        Ok(saved)
    }

    /// Cancelling keeps the record; the slot frees up because cancelled
    /// appointments never conflict.
    pub async fn cancel(&self, id: i64) -> AppResult<Appointment> {
        self.change_status(id, AppointmentStatus::Cancelled).await
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let _guard = self.appointment_locks.lock(id).await;
        self.repos.appointments.delete(id).await?;
        tracing::info!(appointment_id = id, "appointment deleted");
        Ok(())
    }
}
