use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::entities::notification::{self, Entity as Notification};
use crate::errors::ServiceError;

/// Per-user in-app notifications.
#[derive(Clone)]
pub struct NotificationService {
    db: Arc<DatabaseConnection>,
}

impl NotificationService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append a notification on the caller's connection, so callers can
    /// include it in their own transaction.
    pub(crate) async fn push<C>(
        conn: &C,
        user_id: Uuid,
        title: &str,
        message: &str,
    ) -> Result<notification::Model, ServiceError>
    where
        C: ConnectionTrait,
    {
        let entry = notification::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            title: Set(title.to_string()),
            message: Set(message.to_string()),
            read: Set(false),
            created_at: Set(Utc::now()),
        };
        Ok(entry.insert(conn).await?)
    }

    pub async fn notify(
        &self,
        user_id: Uuid,
        title: &str,
        message: &str,
    ) -> Result<notification::Model, ServiceError> {
        Self::push(&*self.db, user_id, title, message).await
    }

    /// Newest first, unread and read alike.
    #[instrument(skip(self))]
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<notification::Model>, ServiceError> {
        Ok(Notification::find()
            .filter(notification::Column::UserId.eq(user_id))
            .order_by_desc(notification::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Mark read or unread. Scoped to the owner; anything else is a 404.
    #[instrument(skip(self))]
    pub async fn set_read(
        &self,
        id: Uuid,
        user_id: Uuid,
        read: bool,
    ) -> Result<notification::Model, ServiceError> {
        let found = Notification::find_by_id(id)
            .filter(notification::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Notification not found".into()))?;

        let mut active: notification::ActiveModel = found.into();
        active.read = Set(read);
        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<(), ServiceError> {
        let found = Notification::find_by_id(id)
            .filter(notification::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Notification not found".into()))?;

        found.delete(&*self.db).await?;
        Ok(())
    }
}
