use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::AppResult;
use crate::store::{EntityType, Record, ID_FIELD};

// ── Records ──

pub fn load_records(conn: &Connection, entity: EntityType) -> AppResult<Vec<Record>> {
    let mut stmt =
        conn.prepare("SELECT id, fields FROM records WHERE entity = ?1 ORDER BY id ASC")?;

    let rows = stmt.query_map(params![entity.as_str()], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut records = vec![];
    for row in rows {
        let (id, fields) = row?;
        records.push(parse_record(id, &fields)?);
    }
    Ok(records)
}

pub fn load_record(conn: &Connection, entity: EntityType, id: i64) -> AppResult<Option<Record>> {
    let fields: Option<String> = conn
        .query_row(
            "SELECT fields FROM records WHERE entity = ?1 AND id = ?2",
            params![entity.as_str(), id],
            |row| row.get(0),
        )
        .optional()?;

    fields.map(|f| parse_record(id, &f)).transpose()
}

pub fn insert_record(conn: &Connection, entity: EntityType, record: &mut Record) -> AppResult<i64> {
    let id: i64 = conn.query_row(
        "SELECT COALESCE(MAX(id), 0) + 1 FROM records WHERE entity = ?1",
        params![entity.as_str()],
        |row| row.get(0),
    )?;
    record.set(ID_FIELD, id);
    let fields = serde_json::to_string(record)?;

    conn.execute(
        "INSERT INTO records (entity, id, fields) VALUES (?1, ?2, ?3)",
        params![entity.as_str(), id, fields],
    )?;
    Ok(id)
}

pub fn save_record(conn: &Connection, entity: EntityType, id: i64, record: &Record) -> AppResult<bool> {
    let fields = serde_json::to_string(record)?;
    let count = conn.execute(
        "UPDATE records SET fields = ?1, updated_at = datetime('now') WHERE entity = ?2 AND id = ?3",
        params![fields, entity.as_str(), id],
    )?;
    Ok(count > 0)
}

pub fn delete_record(conn: &Connection, entity: EntityType, id: i64) -> AppResult<bool> {
    let count = conn.execute(
        "DELETE FROM records WHERE entity = ?1 AND id = ?2",
        params![entity.as_str(), id],
    )?;
    Ok(count > 0)
}

fn parse_record(id: i64, fields: &str) -> AppResult<Record> {
    let mut record: Record = serde_json::from_str(fields)?;
    record.set(ID_FIELD, id);
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    #[test]
    fn test_insert_and_load() {
        let conn = setup_db();
        let mut record = Record::new().with("name_c", "Maya").with("role_c", "Stylist");
        let id = insert_record(&conn, EntityType::Staff, &mut record).unwrap();
        assert_eq!(id, 1);
        assert_eq!(record.id(), Some(1));

        let loaded = load_record(&conn, EntityType::Staff, 1).unwrap().unwrap();
        assert_eq!(loaded, record);
        assert!(load_record(&conn, EntityType::Client, 1).unwrap().is_none());
    }

    #[test]
    fn test_ids_are_per_entity() {
        let conn = setup_db();
        let mut a = Record::new().with("name_c", "A");
        let mut b = Record::new().with("name_c", "B");
        let mut c = Record::new().with("name_c", "C");
        assert_eq!(insert_record(&conn, EntityType::Client, &mut a).unwrap(), 1);
        assert_eq!(insert_record(&conn, EntityType::Client, &mut b).unwrap(), 2);
        assert_eq!(insert_record(&conn, EntityType::Service, &mut c).unwrap(), 1);
        assert_eq!(load_records(&conn, EntityType::Client).unwrap().len(), 2);
    }

    #[test]
    fn test_save_and_delete() {
        let conn = setup_db();
        let mut record = Record::new().with("name_c", "A");
        insert_record(&conn, EntityType::Client, &mut record).unwrap();

        record.set("phone_c", "555");
        assert!(save_record(&conn, EntityType::Client, 1, &record).unwrap());
        assert!(!save_record(&conn, EntityType::Client, 2, &record).unwrap());

        let loaded = load_record(&conn, EntityType::Client, 1).unwrap().unwrap();
        assert_eq!(loaded.get("phone_c").and_then(|v| v.as_text()), Some("555".to_string()));

        assert!(delete_record(&conn, EntityType::Client, 1).unwrap());
        assert!(!delete_record(&conn, EntityType::Client, 1).unwrap());
    }
}
