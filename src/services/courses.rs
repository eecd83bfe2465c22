use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::golf_course::{self, Entity as GolfCourse};
use crate::errors::ServiceError;

#[derive(Debug, Clone)]
pub struct CreateCourse {
    pub name: String,
    pub code: String,
    pub address: Option<String>,
    pub contact_phone: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateCourse {
    pub name: Option<String>,
    pub address: Option<String>,
    pub contact_phone: Option<String>,
}

/// Golf courses double as stock locations and vehicle home sites.
#[derive(Clone)]
pub struct CourseService {
    db: Arc<DatabaseConnection>,
}

impl CourseService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create_course(
        &self,
        cmd: CreateCourse,
    ) -> Result<golf_course::Model, ServiceError> {
        if cmd.name.trim().is_empty() || cmd.code.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Course name and code must not be empty".into(),
            ));
        }

        let existing = GolfCourse::find()
            .filter(golf_course::Column::Code.eq(&cmd.code))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Course code '{}' already exists",
                cmd.code
            )));
        }

        let now = Utc::now();
        let new_course = golf_course::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(cmd.name),
            code: Set(cmd.code),
            address: Set(cmd.address),
            contact_phone: Set(cmd.contact_phone),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = new_course.insert(&*self.db).await?;
        info!(course_id = %created.id, code = %created.code, "course created");
        Ok(created)
    }

    pub async fn list_courses(&self) -> Result<Vec<golf_course::Model>, ServiceError> {
        Ok(GolfCourse::find()
            .order_by_asc(golf_course::Column::Code)
            .all(&*self.db)
            .await?)
    }

    pub async fn get_course(&self, id: Uuid) -> Result<golf_course::Model, ServiceError> {
        GolfCourse::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Course not found".into()))
    }

    #[instrument(skip(self))]
    pub async fn update_course(
        &self,
        id: Uuid,
        cmd: UpdateCourse,
    ) -> Result<golf_course::Model, ServiceError> {
        let found = self.get_course(id).await?;
        let mut active: golf_course::ActiveModel = found.into();

        if let Some(name) = cmd.name {
            if name.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Course name must not be empty".into(),
                ));
            }
            active.name = Set(name);
        }
        if let Some(address) = cmd.address {
            active.address = Set(Some(address));
        }
        if let Some(contact_phone) = cmd.contact_phone {
            active.contact_phone = Set(Some(contact_phone));
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_course(&self, id: Uuid) -> Result<(), ServiceError> {
        let found = self.get_course(id).await?;
        found.delete(&*self.db).await?;
        info!(course_id = %id, "course deleted");
        Ok(())
    }
}
