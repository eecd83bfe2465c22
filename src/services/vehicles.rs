//! Golf-cart fleet records. Edits, transfers, and deletions append to the
//! serial-number history so the trail outlives the vehicle row.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::{
    golf_course::Entity as GolfCourse,
    serial_history::{self, Entity as SerialHistory, SerialEvent},
    vehicle::{self, Entity as Vehicle, VehicleStatus},
};
use crate::errors::ServiceError;

#[derive(Debug, Clone)]
pub struct CreateVehicle {
    pub serial_number: String,
    pub model: String,
    pub course_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateVehicle {
    pub model: Option<String>,
    pub status: Option<VehicleStatus>,
}

#[derive(Clone)]
pub struct VehicleService {
    db: Arc<DatabaseConnection>,
}

impl VehicleService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create_vehicle(
        &self,
        cmd: CreateVehicle,
    ) -> Result<vehicle::Model, ServiceError> {
        if cmd.serial_number.trim().is_empty() || cmd.model.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Serial number and model must not be empty".into(),
            ));
        }

        let existing = Vehicle::find()
            .filter(vehicle::Column::SerialNumber.eq(&cmd.serial_number))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Serial number '{}' already exists",
                cmd.serial_number
            )));
        }

        if let Some(course_id) = cmd.course_id {
            self.require_course(course_id).await?;
        }

        let now = Utc::now();
        let new_vehicle = vehicle::ActiveModel {
            id: Set(Uuid::new_v4()),
            serial_number: Set(cmd.serial_number),
            model: Set(cmd.model),
            course_id: Set(cmd.course_id),
            status: Set(VehicleStatus::Active.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = new_vehicle.insert(&*self.db).await?;
        info!(vehicle_id = %created.id, serial = %created.serial_number, "vehicle created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn list_vehicles(
        &self,
        course_id: Option<Uuid>,
    ) -> Result<Vec<vehicle::Model>, ServiceError> {
        let mut query = Vehicle::find().order_by_asc(vehicle::Column::SerialNumber);
        if let Some(course_id) = course_id {
            query = query.filter(vehicle::Column::CourseId.eq(course_id));
        }
        Ok(query.all(&*self.db).await?)
    }

    pub async fn get_vehicle(&self, id: Uuid) -> Result<vehicle::Model, ServiceError> {
        Vehicle::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Vehicle not found".into()))
    }

    #[instrument(skip(self))]
    pub async fn update_vehicle(
        &self,
        id: Uuid,
        cmd: UpdateVehicle,
        actor: Uuid,
    ) -> Result<vehicle::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let found = Vehicle::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Vehicle not found".into()))?;

        let serial = found.serial_number.clone();
        let detail = json!({
            "model": { "old": found.model, "new": cmd.model },
            "status": { "old": found.status, "new": cmd.status.map(|s| s.as_str()) },
        });

        let mut active: vehicle::ActiveModel = found.into();
        if let Some(model) = cmd.model.clone() {
            if model.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Vehicle model must not be empty".into(),
                ));
            }
            active.model = Set(model);
        }
        if let Some(status) = cmd.status {
            active.status = Set(status.as_str().to_string());
        }
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await?;

        Self::append_history(&txn, &serial, SerialEvent::Edited, detail, actor).await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Move a vehicle to another course, or back to the central depot
    /// (`to_course: None`).
    #[instrument(skip(self))]
    pub async fn transfer_vehicle(
        &self,
        id: Uuid,
        to_course: Option<Uuid>,
        actor: Uuid,
    ) -> Result<vehicle::Model, ServiceError> {
        if let Some(course_id) = to_course {
            self.require_course(course_id).await?;
        }

        let txn = self.db.begin().await?;

        let found = Vehicle::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Vehicle not found".into()))?;

        if found.course_id == to_course {
            return Err(ServiceError::InvalidOperation(
                "Source and Destination must be different".into(),
            ));
        }

        let serial = found.serial_number.clone();
        let detail = json!({
            "course_id": { "old": found.course_id, "new": to_course },
        });

        let mut active: vehicle::ActiveModel = found.into();
        active.course_id = Set(to_course);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await?;

        Self::append_history(&txn, &serial, SerialEvent::Transferred, detail, actor).await?;

        txn.commit().await?;

        info!(vehicle_id = %id, to = ?to_course, "vehicle transferred");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_vehicle(&self, id: Uuid, actor: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let found = Vehicle::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Vehicle not found".into()))?;

        let serial = found.serial_number.clone();
        let detail = json!({ "model": found.model, "course_id": found.course_id });
        found.delete(&txn).await?;

        Self::append_history(&txn, &serial, SerialEvent::Deleted, detail, actor).await?;

        txn.commit().await?;

        info!(vehicle_id = %id, "vehicle deleted");
        Ok(())
    }

    /// Full event trail for a serial number, oldest first.
    pub async fn serial_history(
        &self,
        serial_number: &str,
    ) -> Result<Vec<serial_history::Model>, ServiceError> {
        Ok(SerialHistory::find()
            .filter(serial_history::Column::SerialNumber.eq(serial_number))
            .order_by_asc(serial_history::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    async fn require_course(&self, course_id: Uuid) -> Result<(), ServiceError> {
        GolfCourse::find_by_id(course_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Course not found".into()))?;
        Ok(())
    }

    async fn append_history<C>(
        conn: &C,
        serial_number: &str,
        event: SerialEvent,
        detail: serde_json::Value,
        actor: Uuid,
    ) -> Result<(), ServiceError>
    where
        C: ConnectionTrait,
    {
        let entry = serial_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            serial_number: Set(serial_number.to_string()),
            event_type: Set(event.as_str().to_string()),
            detail: Set(detail),
            performed_by: Set(actor),
            ..Default::default()
        };
        entry.insert(conn).await?;
        Ok(())
    }
}
