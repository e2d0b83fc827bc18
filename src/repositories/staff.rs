use crate::errors::{AppError, AppResult};
use crate::models::{Schedule, StaffInput, StaffMember};
use crate::repositories::{opt_text, record_id, text, Entity, Table};
use crate::store::{EntityType, Record};

impl Entity for StaffMember {
    const ENTITY: EntityType = EntityType::Staff;
    const FIELDS: &'static [&'static str] = &[
        "name_c",
        "name",
        "role_c",
        "role",
        "email_c",
        "email",
        "phone_c",
        "phone",
        "schedule_c",
        "schedule",
    ];

    fn from_record(record: &Record) -> AppResult<Self> {
        let id = record_id(record)?;
        let schedule = match opt_text(record, "schedule_c", "schedule") {
            Some(raw) => Schedule::from_json(&raw)
                .map_err(|e| AppError::Store(format!("staff {id} has a malformed schedule: {e}")))?,
            None => Schedule::new(),
        };

        Ok(StaffMember {
            id,
            name: text(record, "name_c", "name")?,
            role: opt_text(record, "role_c", "role").unwrap_or_default(),
            email: opt_text(record, "email_c", "email"),
            phone: opt_text(record, "phone_c", "phone"),
            schedule,
        })
    }
}

fn to_record(input: StaffInput) -> Record {
    Record::new()
        .with("name_c", input.name.trim())
        .with("role_c", input.role.trim())
        .with("email_c", input.email)
        .with("phone_c", input.phone)
        .with("schedule_c", input.schedule.to_json())
}

pub struct StaffRepository {
    table: Table<StaffMember>,
}

impl StaffRepository {
    pub fn new(table: Table<StaffMember>) -> Self {
        Self { table }
    }

    pub async fn list(&self) -> AppResult<Vec<StaffMember>> {
        self.table.all().await
    }

    pub async fn by_role(&self, role: &str) -> AppResult<Vec<StaffMember>> {
        let wanted = [role.trim().to_lowercase()];
        let mut staff = self.table.all().await?;
        staff.retain(|s| s.has_role(&wanted));
        Ok(staff)
    }

    pub async fn get(&self, id: i64) -> AppResult<StaffMember> {
        self.table.get(id).await
    }

    pub async fn create(&self, input: StaffInput) -> AppResult<StaffMember> {
        input.validate()?;
        self.table.insert(to_record(input)).await
    }

    pub async fn update(&self, id: i64, input: StaffInput) -> AppResult<StaffMember> {
        input.validate()?;
        self.table.update(id, to_record(input)).await
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.table.delete(id).await
    }
}
