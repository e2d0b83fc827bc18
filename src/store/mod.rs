//! Boundary to the record-storage collaborator.
//!
//! Every entity is persisted as a flat [`Record`] of scalar fields. The
//! scheduling core never sees records; the repositories map them to typed
//! models on the way in and out.

pub mod memory;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppResult;

pub use memory::MemoryStore;

pub const ID_FIELD: &str = "Id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityType {
    Appointment,
    Client,
    Service,
    Staff,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Appointment => "appointment",
            EntityType::Client => "client",
            EntityType::Service => "service",
            EntityType::Staff => "staff",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn is_blank(&self) -> bool {
        match self {
            Scalar::Null => true,
            Scalar::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(v) => Some(*v),
            Scalar::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            Scalar::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(v) => Some(*v as f64),
            Scalar::Float(v) => Some(*v),
            Scalar::Text(s) => s.trim().parse().ok(),
            Scalar::Null => None,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            Scalar::Null => None,
            Scalar::Int(v) => Some(v.to_string()),
            Scalar::Float(v) => Some(v.to_string()),
            Scalar::Text(s) => Some(s.clone()),
        }
    }

    fn compare(&self, other: &Scalar) -> Option<Ordering> {
        match (self, other) {
            (Scalar::Null, _) | (_, Scalar::Null) => None,
            (Scalar::Text(a), Scalar::Text(b)) => Some(a.cmp(b)),
            (Scalar::Int(a), Scalar::Int(b)) => Some(a.cmp(b)),
            (a, b) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(v as i64)
    }
}

impl From<u32> for Scalar {
    fn from(v: u32) -> Self {
        Scalar::Int(v as i64)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Text(v)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Scalar::Null)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Scalar>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> Option<i64> {
        self.0.get(ID_FIELD).and_then(Scalar::as_i64)
    }

    pub fn get(&self, field: &str) -> Option<&Scalar> {
        self.0.get(field)
    }

    pub fn set(&mut self, field: &str, value: impl Into<Scalar>) {
        self.0.insert(field.to_string(), value.into());
    }

    pub fn with(mut self, field: &str, value: impl Into<Scalar>) -> Self {
        self.set(field, value);
        self
    }

    pub fn remove(&mut self, field: &str) -> Option<Scalar> {
        self.0.remove(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reads a field under its current name, falling back to the legacy
    /// name when the current one is absent or blank.
    pub fn field(&self, current: &str, legacy: &str) -> Option<&Scalar> {
        self.0
            .get(current)
            .filter(|v| !v.is_blank())
            .or_else(|| self.0.get(legacy).filter(|v| !v.is_blank()))
    }

    /// Overwrites this record's fields with those of `other`.
    pub fn merge(&mut self, other: Record) {
        self.0.extend(other.0);
    }

    /// Keeps only the listed fields (plus the id). An empty list keeps all.
    pub fn project(&self, fields: &[&str]) -> Record {
        if fields.is_empty() {
            return self.clone();
        }
        Record(
            self.0
                .iter()
                .filter(|(k, _)| k.as_str() == ID_FIELD || fields.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Contains,
}

/// One condition of a query. All conditions passed to a query must hold.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub legacy: Option<String>,
    pub op: FilterOp,
    pub value: Scalar,
}

impl Filter {
    pub fn new(field: &str, op: FilterOp, value: impl Into<Scalar>) -> Self {
        Self {
            field: field.to_string(),
            legacy: None,
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: &str, value: impl Into<Scalar>) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    pub fn gte(field: &str, value: impl Into<Scalar>) -> Self {
        Self::new(field, FilterOp::Gte, value)
    }

    pub fn lte(field: &str, value: impl Into<Scalar>) -> Self {
        Self::new(field, FilterOp::Lte, value)
    }

    /// Also match records that only carry the field under `legacy`.
    pub fn or_legacy(mut self, legacy: &str) -> Self {
        self.legacy = Some(legacy.to_string());
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        let actual = match &self.legacy {
            Some(legacy) => record.field(&self.field, legacy),
            None => record.get(&self.field),
        };
        let Some(actual) = actual else {
            return self.op == FilterOp::Ne;
        };
        match self.op {
            FilterOp::Eq => actual.compare(&self.value) == Some(Ordering::Equal),
            FilterOp::Ne => actual.compare(&self.value) != Some(Ordering::Equal),
            FilterOp::Lt => actual.compare(&self.value) == Some(Ordering::Less),
            FilterOp::Lte => matches!(
                actual.compare(&self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOp::Gt => actual.compare(&self.value) == Some(Ordering::Greater),
            FilterOp::Gte => matches!(
                actual.compare(&self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOp::Contains => match (actual.as_text(), self.value.as_text()) {
                (Some(a), Some(b)) => a.to_lowercase().contains(&b.to_lowercase()),
                _ => false,
            },
        }
    }
}

pub fn matches_all(record: &Record, filters: &[Filter]) -> bool {
    filters.iter().all(|f| f.matches(record))
}

/// The record-storage collaborator consumed uniformly by every repository.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch_all(&self, entity: EntityType, fields: &[&str]) -> AppResult<Vec<Record>>;

    async fn fetch_by_id(
        &self,
        entity: EntityType,
        id: i64,
        fields: &[&str],
    ) -> AppResult<Option<Record>>;

    /// Stores a new record; the store assigns its id.
    async fn create(&self, entity: EntityType, record: Record) -> AppResult<Record>;

    /// Merges `record` into the stored one. `None` when no such id exists.
    async fn update(&self, entity: EntityType, id: i64, record: Record)
        -> AppResult<Option<Record>>;

    /// Returns, per requested id, whether a record was deleted.
    async fn delete(&self, entity: EntityType, ids: &[i64]) -> AppResult<Vec<bool>>;

    async fn query(
        &self,
        entity: EntityType,
        fields: &[&str],
        filters: &[Filter],
    ) -> AppResult<Vec<Record>>;
}
