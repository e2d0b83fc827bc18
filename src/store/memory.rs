use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::errors::{AppError, AppResult};
use crate::store::{matches_all, EntityType, Filter, Record, RecordStore, ID_FIELD};

type Tables = BTreeMap<EntityType, BTreeMap<i64, Record>>;

/// Process-local record store. Used by tests and by `STORE_BACKEND=memory`.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record as-is, keeping its id. Records without an id get the
    /// next free one.
    pub fn seed(&self, entity: EntityType, mut record: Record) -> AppResult<i64> {
        let mut tables = self.lock()?;
        let table = tables.entry(entity).or_default();
        let id = match record.id() {
            Some(id) => id,
            None => next_id(table),
        };
        record.set(ID_FIELD, id);
        table.insert(id, record);
        Ok(id)
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AppError::Store("memory store lock poisoned".to_string()))
    }
}

fn next_id(table: &BTreeMap<i64, Record>) -> i64 {
    table.keys().next_back().map(|id| id + 1).unwrap_or(1)
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn fetch_all(&self, entity: EntityType, fields: &[&str]) -> AppResult<Vec<Record>> {
        self.query(entity, fields, &[]).await
    }

    async fn fetch_by_id(
        &self,
        entity: EntityType,
        id: i64,
        fields: &[&str],
    ) -> AppResult<Option<Record>> {
        let tables = self.lock()?;
        Ok(tables
            .get(&entity)
            .and_then(|t| t.get(&id))
            .map(|r| r.project(fields)))
    }

    async fn create(&self, entity: EntityType, mut record: Record) -> AppResult<Record> {
        if record.is_empty() {
            return Err(AppError::Validation(format!("empty {entity} record")));
        }
        let mut tables = self.lock()?;
        let table = tables.entry(entity).or_default();
        let id = next_id(table);
        record.set(ID_FIELD, id);
        table.insert(id, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        entity: EntityType,
        id: i64,
        mut record: Record,
    ) -> AppResult<Option<Record>> {
        record.remove(ID_FIELD);
        let mut tables = self.lock()?;
        let Some(existing) = tables.get_mut(&entity).and_then(|t| t.get_mut(&id)) else {
            return Ok(None);
        };
        existing.merge(record);
        Ok(Some(existing.clone()))
    }

    async fn delete(&self, entity: EntityType, ids: &[i64]) -> AppResult<Vec<bool>> {
        let mut tables = self.lock()?;
        let table = tables.entry(entity).or_default();
        Ok(ids.iter().map(|id| table.remove(id).is_some()).collect())
    }

    async fn query(
        &self,
        entity: EntityType,
        fields: &[&str],
        filters: &[Filter],
    ) -> AppResult<Vec<Record>> {
        let tables = self.lock()?;
        Ok(tables
            .get(&entity)
            .map(|t| {
                t.values()
                    .filter(|r| matches_all(r, filters))
                    .map(|r| r.project(fields))
                    .collect()
            })
            .unwrap_or_default())
    }
}
