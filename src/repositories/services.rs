use std::str::FromStr;

use rust_decimal::Decimal;

use crate::errors::{AppError, AppResult};
use crate::models::{Service, ServiceInput};
use crate::repositories::{int, opt_text, record_id, text, Entity, Table};
use crate::store::{EntityType, Filter, FilterOp, Record, Scalar};

impl Entity for Service {
    const ENTITY: EntityType = EntityType::Service;
    const FIELDS: &'static [&'static str] = &[
        "name_c",
        "name",
        "category_c",
        "category",
        "description_c",
        "description",
        "price_c",
        "price",
        "duration_c",
        "duration",
    ];

    fn from_record(record: &Record) -> AppResult<Self> {
        let id = record_id(record)?;
        let price = match record.field("price_c", "price") {
            Some(Scalar::Int(v)) => Decimal::from(*v),
            Some(Scalar::Float(v)) => Decimal::try_from(*v)
                .map_err(|_| AppError::Store(format!("service {id} has a malformed price")))?,
            Some(Scalar::Text(s)) => Decimal::from_str(s.trim())
                .map_err(|_| AppError::Store(format!("service {id} has a malformed price")))?,
            _ => Decimal::ZERO,
        };
        let duration = int(record, "duration_c", "duration")?;
        let duration_minutes = u32::try_from(duration)
            .ok()
            .filter(|d| *d > 0)
            .ok_or_else(|| AppError::Store(format!("service {id} has duration {duration}")))?;

        Ok(Service {
            id,
            name: text(record, "name_c", "name")?,
            category: opt_text(record, "category_c", "category").unwrap_or_default(),
            description: opt_text(record, "description_c", "description"),
            price,
            duration_minutes,
        })
    }
}

fn to_record(input: ServiceInput) -> Record {
    Record::new()
        .with("name_c", input.name.trim())
        .with("category_c", input.category.trim())
        .with("description_c", input.description)
        .with("price_c", input.price.to_string())
        .with("duration_c", input.duration_minutes)
}

pub struct ServiceRepository {
    table: Table<Service>,
}

impl ServiceRepository {
    pub fn new(table: Table<Service>) -> Self {
        Self { table }
    }

    /// The full catalog.
    pub async fn list(&self) -> AppResult<Vec<Service>> {
        self.table.all().await
    }

    pub async fn by_category(&self, category: &str) -> AppResult<Vec<Service>> {
        let mut services = self
            .table
            .query(&[Filter::new("category_c", FilterOp::Contains, category).or_legacy("category")])
            .await?;
        services.retain(|s| s.category.eq_ignore_ascii_case(category.trim()));
        Ok(services)
    }

    pub async fn get(&self, id: i64) -> AppResult<Service> {
        self.table.get(id).await
    }

    pub async fn create(&self, input: ServiceInput) -> AppResult<Service> {
        input.validate()?;
        self.table.insert(to_record(input)).await
    }

    pub async fn update(&self, id: i64, input: ServiceInput) -> AppResult<Service> {
        input.validate()?;
        self.table.update(id, to_record(input)).await
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.table.delete(id).await
    }
}
