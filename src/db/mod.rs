pub mod migrations;
pub mod queries;

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context;
use async_trait::async_trait;
use rusqlite::Connection;

use crate::errors::{AppError, AppResult};
use crate::store::{matches_all, EntityType, Filter, Record, RecordStore, ID_FIELD};

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}

/// [`RecordStore`] backed by a single SQLite table of JSON-encoded records.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    pub fn open(path: &str) -> anyhow::Result<Self> {
        Ok(Self::new(init_db(path)?))
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Store("database lock poisoned".to_string()))
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn fetch_all(&self, entity: EntityType, fields: &[&str]) -> AppResult<Vec<Record>> {
        self.query(entity, fields, &[]).await
    }

    async fn fetch_by_id(
        &self,
        entity: EntityType,
        id: i64,
        fields: &[&str],
    ) -> AppResult<Option<Record>> {
        let conn = self.lock()?;
        Ok(queries::load_record(&conn, entity, id)?.map(|r| r.project(fields)))
    }

    async fn create(&self, entity: EntityType, mut record: Record) -> AppResult<Record> {
        if record.is_empty() {
            return Err(AppError::Validation(format!("empty {entity} record")));
        }
        let conn = self.lock()?;
        queries::insert_record(&conn, entity, &mut record)?;
        Ok(record)
    }

    async fn update(
        &self,
        entity: EntityType,
        id: i64,
        mut record: Record,
    ) -> AppResult<Option<Record>> {
        record.remove(ID_FIELD);
        let conn = self.lock()?;
        let Some(mut existing) = queries::load_record(&conn, entity, id)? else {
            return Ok(None);
        };
        existing.merge(record);
        queries::save_record(&conn, entity, id, &existing)?;
        Ok(Some(existing))
    }

    async fn delete(&self, entity: EntityType, ids: &[i64]) -> AppResult<Vec<bool>> {
        let conn = self.lock()?;
        ids.iter()
            .map(|id| queries::delete_record(&conn, entity, *id))
            .collect()
    }

    async fn query(
        &self,
        entity: EntityType,
        fields: &[&str],
        filters: &[Filter],
    ) -> AppResult<Vec<Record>> {
        let conn = self.lock()?;
        Ok(queries::load_records(&conn, entity)?
            .into_iter()
            .filter(|r| matches_all(r, filters))
            .map(|r| r.project(fields))
            .collect())
    }
}
