use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::part::{self, Entity as Part};
use crate::errors::ServiceError;

#[derive(Debug, Clone)]
pub struct CreatePart {
    pub part_number: String,
    pub name: String,
    pub unit: String,
    pub min_qty: i32,
    pub max_qty: i32,
}

#[derive(Debug, Clone, Default)]
pub struct UpdatePart {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub min_qty: Option<i32>,
    pub max_qty: Option<i32>,
}

/// Spare-part catalog. Stock balances live in `inventory_levels`; the
/// `stock_qty` column on a part is the legacy central-site mirror and is
/// written only by the inventory service.
#[derive(Clone)]
pub struct PartService {
    db: Arc<DatabaseConnection>,
}

impl PartService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create_part(&self, cmd: CreatePart) -> Result<part::Model, ServiceError> {
        if cmd.part_number.trim().is_empty() || cmd.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Part number and name must not be empty".into(),
            ));
        }
        Self::check_thresholds(cmd.min_qty, cmd.max_qty)?;

        let existing = Part::find()
            .filter(part::Column::PartNumber.eq(&cmd.part_number))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Part number '{}' already exists",
                cmd.part_number
            )));
        }

        let now = Utc::now();
        let new_part = part::ActiveModel {
            id: Set(Uuid::new_v4()),
            part_number: Set(cmd.part_number),
            name: Set(cmd.name),
            unit: Set(cmd.unit),
            stock_qty: Set(0),
            min_qty: Set(cmd.min_qty),
            max_qty: Set(cmd.max_qty),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = new_part.insert(&*self.db).await?;
        info!(part_id = %created.id, part_number = %created.part_number, "part created");
        Ok(created)
    }

    pub async fn list_parts(&self) -> Result<Vec<part::Model>, ServiceError> {
        Ok(Part::find()
            .order_by_asc(part::Column::PartNumber)
            .all(&*self.db)
            .await?)
    }

    pub async fn get_part(&self, id: Uuid) -> Result<part::Model, ServiceError> {
        Part::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Part not found".into()))
    }

    #[instrument(skip(self))]
    pub async fn update_part(&self, id: Uuid, cmd: UpdatePart) -> Result<part::Model, ServiceError> {
        let found = self.get_part(id).await?;

        let min_qty = cmd.min_qty.unwrap_or(found.min_qty);
        let max_qty = cmd.max_qty.unwrap_or(found.max_qty);
        Self::check_thresholds(min_qty, max_qty)?;

        let mut active: part::ActiveModel = found.into();
        if let Some(name) = cmd.name {
            if name.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Part name must not be empty".into(),
                ));
            }
            active.name = Set(name);
        }
        if let Some(unit) = cmd.unit {
            active.unit = Set(unit);
        }
        active.min_qty = Set(min_qty);
        active.max_qty = Set(max_qty);
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_part(&self, id: Uuid) -> Result<(), ServiceError> {
        let found = self.get_part(id).await?;
        found.delete(&*self.db).await?;
        info!(part_id = %id, "part deleted");
        Ok(())
    }

    fn check_thresholds(min_qty: i32, max_qty: i32) -> Result<(), ServiceError> {
        if min_qty < 0 || max_qty < 0 {
            return Err(ServiceError::ValidationError(
                "Stock thresholds must not be negative".into(),
            ));
        }
        if min_qty > max_qty {
            return Err(ServiceError::ValidationError(
                "min_qty must not exceed max_qty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_validation() {
        assert!(PartService::check_thresholds(0, 0).is_ok());
        assert!(PartService::check_thresholds(2, 10).is_ok());
        assert!(PartService::check_thresholds(5, 2).is_err());
        assert!(PartService::check_thresholds(-1, 2).is_err());
        assert!(PartService::check_thresholds(0, -2).is_err());
    }
}
