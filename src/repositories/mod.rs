//! Typed access to the record store.
//!
//! Each repository maps flat records to one model. Reads prefer the current
//! `*_c` field names and fall back to the legacy camelCase ones; writes only
//! ever use the current names. Every store call runs under the configured
//! timeout.

pub mod appointments;
pub mod clients;
pub mod services;
pub mod staff;

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::errors::{AppError, AppResult};
use crate::models::time::parse_hhmm;
use crate::store::{EntityType, Filter, Record, RecordStore, Scalar};

pub use appointments::AppointmentRepository;
pub use clients::ClientRepository;
pub use services::ServiceRepository;
pub use staff::StaffRepository;

/// A model persisted as a record of one entity type.
pub trait Entity: Sized {
    const ENTITY: EntityType;
    /// Current and legacy names of every field the model reads.
    const FIELDS: &'static [&'static str];

    fn from_record(record: &Record) -> AppResult<Self>;
}

/// Runs a store call, turning an expired budget into [`AppError::Timeout`].
pub async fn timed<T, F>(budget: Duration, what: &str, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(budget, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation = what, budget_ms = budget.as_millis() as u64, "record store call timed out");
            Err(AppError::Timeout(format!(
                "{what} took longer than {}ms",
                budget.as_millis()
            )))
        }
    }
}

/// Generic CRUD over one entity type.
pub struct Table<T> {
    store: Arc<dyn RecordStore>,
    timeout: Duration,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> Table<T> {
    pub fn new(store: Arc<dyn RecordStore>, timeout: Duration) -> Self {
        Self {
            store,
            timeout,
            _marker: PhantomData,
        }
    }

    fn decode_all(records: Vec<Record>) -> Vec<T> {
        records
            .iter()
            .filter_map(|record| match T::from_record(record) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!(entity = %T::ENTITY, id = ?record.id(), error = %e, "skipping malformed record");
                    None
                }
            })
            .collect()
    }

    pub async fn all(&self) -> AppResult<Vec<T>> {
        let records = timed(
            self.timeout,
            "fetch_all",
            self.store.fetch_all(T::ENTITY, T::FIELDS),
        )
        .await?;
        Ok(Self::decode_all(records))
    }

    pub async fn find(&self, id: i64) -> AppResult<Option<T>> {
        let record = timed(
            self.timeout,
            "fetch_by_id",
            self.store.fetch_by_id(T::ENTITY, id, T::FIELDS),
        )
        .await?;
        record.as_ref().map(T::from_record).transpose()
    }

    pub async fn get(&self, id: i64) -> AppResult<T> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {id}", T::ENTITY)))
    }

    pub async fn query(&self, filters: &[Filter]) -> AppResult<Vec<T>> {
        let records = timed(
            self.timeout,
            "query",
            self.store.query(T::ENTITY, T::FIELDS, filters),
        )
        .await?;
        Ok(Self::decode_all(records))
    }

    /// Like `query`, but an unreadable record fails the whole call instead
    /// of being skipped.
    pub async fn query_strict(&self, filters: &[Filter]) -> AppResult<Vec<T>> {
        let records = timed(
            self.timeout,
            "query",
            self.store.query(T::ENTITY, T::FIELDS, filters),
        )
        .await?;
        records.iter().map(T::from_record).collect()
    }

    pub async fn insert(&self, record: Record) -> AppResult<T> {
        let created = timed(self.timeout, "create", self.store.create(T::ENTITY, record)).await?;
        T::from_record(&created)
    }

    pub async fn update(&self, id: i64, record: Record) -> AppResult<T> {
        let updated = timed(
            self.timeout,
            "update",
            self.store.update(T::ENTITY, id, record),
        )
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {id}", T::ENTITY)))?;
        T::from_record(&updated)
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let deleted = timed(self.timeout, "delete", self.store.delete(T::ENTITY, &[id])).await?;
        if deleted.first().copied().unwrap_or(false) {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("{} {id}", T::ENTITY)))
        }
    }
}

/// All four repositories over one shared store.
pub struct Repositories {
    pub appointments: AppointmentRepository,
    pub clients: ClientRepository,
    pub services: ServiceRepository,
    pub staff: StaffRepository,
}

impl Repositories {
    pub fn new(store: Arc<dyn RecordStore>, timeout: Duration) -> Self {
        Self {
            appointments: AppointmentRepository::new(Table::new(store.clone(), timeout)),
            clients: ClientRepository::new(Table::new(store.clone(), timeout)),
            services: ServiceRepository::new(Table::new(store.clone(), timeout)),
            staff: StaffRepository::new(Table::new(store, timeout)),
        }
    }
}

// ── Field readers ──

fn malformed(record: &Record, field: &str, detail: &str) -> AppError {
    AppError::Store(format!(
        "record {} has {detail} field {field}",
        record
            .id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "?".to_string())
    ))
}

pub(crate) fn record_id(record: &Record) -> AppResult<i64> {
    record
        .id()
        .ok_or_else(|| AppError::Store("record without an id".to_string()))
}

pub(crate) fn opt_text(record: &Record, current: &str, legacy: &str) -> Option<String> {
    record
        .field(current, legacy)
        .and_then(Scalar::as_text)
        .filter(|s| !s.trim().is_empty())
}

pub(crate) fn text(record: &Record, current: &str, legacy: &str) -> AppResult<String> {
    opt_text(record, current, legacy).ok_or_else(|| malformed(record, current, "missing"))
}

pub(crate) fn int(record: &Record, current: &str, legacy: &str) -> AppResult<i64> {
    record
        .field(current, legacy)
        .ok_or_else(|| malformed(record, current, "missing"))?
        .as_i64()
        .ok_or_else(|| malformed(record, current, "non-integer"))
}

/// Dates may carry a time suffix (`2025-06-17T00:00:00Z`); only the day counts.
pub(crate) fn date(record: &Record, current: &str, legacy: &str) -> AppResult<NaiveDate> {
    let raw = text(record, current, legacy)?;
    let day = raw.get(..10).unwrap_or(&raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| malformed(record, current, "malformed"))
}

pub(crate) fn time(record: &Record, current: &str, legacy: &str) -> AppResult<NaiveTime> {
    let raw = text(record, current, legacy)?;
    parse_hhmm(&raw).map_err(|_| malformed(record, current, "malformed"))
}

/// Accepts RFC 3339 and SQLite's `YYYY-MM-DD HH:MM:SS`. Unparseable values
/// read as absent.
pub(crate) fn timestamp(record: &Record, current: &str, legacy: &str) -> Option<NaiveDateTime> {
    let raw = opt_text(record, current, legacy)?;
    chrono::DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

pub(crate) fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}
