pub mod appointment;
pub mod client;
pub mod schedule;
pub mod service;
pub mod staff;
pub mod time;

pub use appointment::{Appointment, AppointmentStatus, AppointmentUpdate, NewAppointment};
pub use client::{Client, ClientInput};
pub use schedule::{DaySchedule, Schedule};
pub use service::{Service, ServiceInput};
pub use staff::{StaffInput, StaffMember};
