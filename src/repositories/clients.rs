use crate::errors::AppResult;
use crate::models::{Client, ClientInput};
use crate::repositories::{opt_text, record_id, text, Entity, Table};
use crate::store::{EntityType, Record};

impl Entity for Client {
    const ENTITY: EntityType = EntityType::Client;
    const FIELDS: &'static [&'static str] = &[
        "name_c",
        "name",
        "phone_c",
        "phone",
        "email_c",
        "email",
        "preferences_c",
        "preferences",
        "notes_c",
        "notes",
    ];

    fn from_record(record: &Record) -> AppResult<Self> {
        Ok(Client {
            id: record_id(record)?,
            name: text(record, "name_c", "name")?,
            phone: text(record, "phone_c", "phone")?,
            email: opt_text(record, "email_c", "email"),
            preferences: opt_text(record, "preferences_c", "preferences"),
            notes: opt_text(record, "notes_c", "notes"),
        })
    }
}

fn to_record(input: ClientInput) -> Record {
    Record::new()
        .with("name_c", input.name.trim())
        .with("phone_c", input.phone.trim())
        .with("email_c", input.email)
        .with("preferences_c", input.preferences)
        .with("notes_c", input.notes)
}

pub struct ClientRepository {
    table: Table<Client>,
}

impl ClientRepository {
    pub fn new(table: Table<Client>) -> Self {
        Self { table }
    }

    /// All clients, or those matching `search` by name, email or phone.
    pub async fn list(&self, search: Option<&str>) -> AppResult<Vec<Client>> {
        let mut clients = self.table.all().await?;
        if let Some(term) = search {
            clients.retain(|c| c.matches(term));
        }
        Ok(clients)
    }

    pub async fn get(&self, id: i64) -> AppResult<Client> {
        self.table.get(id).await
    }

    pub async fn exists(&self, id: i64) -> AppResult<bool> {
        Ok(self.table.find(id).await?.is_some())
    }

    pub async fn count(&self) -> AppResult<usize> {
        Ok(self.table.all().await?.len())
    }

    pub async fn create(&self, input: ClientInput) -> AppResult<Client> {
        input.validate()?;
        self.table.insert(to_record(input)).await
    }

    pub async fn update(&self, id: i64, input: ClientInput) -> AppResult<Client> {
        input.validate()?;
        self.table.update(id, to_record(input)).await
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.table.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::store::{MemoryStore, ID_FIELD};
    use std::sync::Arc;
    use std::time::Duration;

    fn repo_with(store: MemoryStore) -> ClientRepository {
        ClientRepository::new(Table::new(Arc::new(store), Duration::from_secs(1)))
    }

    fn input(name: &str, phone: &str) -> ClientInput {
        ClientInput {
            name: name.to_string(),
            phone: phone.to_string(),
            email: None,
            preferences: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_search() {
        let repo = repo_with(MemoryStore::new());
        repo.create(input("Sarah Johnson", "555-1234")).await.unwrap();
        repo.create(input("Michael Chen", "555-9876")).await.unwrap();

        assert_eq!(repo.list(None).await.unwrap().len(), 2);
        let found = repo.list(Some("chen")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Michael Chen");
        assert_eq!(repo.list(Some("1234")).await.unwrap()[0].name, "Sarah Johnson");
    }

    #[tokio::test]
    async fn test_reads_legacy_records() {
        let store = MemoryStore::new();
        store
            .seed(
                EntityType::Client,
                Record::new()
                    .with(ID_FIELD, 5)
                    .with("name", "Old Name")
                    .with("name_c", "New Name")
                    .with("phone", "555-0000")
                    .with("preferences", "Quiet appointments"),
            )
            .unwrap();
        let client = repo_with(store).get(5).await.unwrap();
        assert_eq!(client.name, "New Name");
        assert_eq!(client.phone, "555-0000");
        assert_eq!(client.preferences.as_deref(), Some("Quiet appointments"));
    }

    #[tokio::test]
    async fn test_invalid_input_rejected() {
        let repo = repo_with(MemoryStore::new());
        let err = repo.create(input("", "555")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
