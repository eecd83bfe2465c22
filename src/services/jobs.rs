//! Maintenance jobs: lifecycle, requisition (PRR) and work-report (MWR)
//! code generation, and parts consumption.
//!
//! Both code generators are read-then-write over an indexed prefix; there
//! is no uniqueness constraint, so two racing requests for the same prefix
//! can collide. That matches the behavior the fleet depends on today and
//! is left as-is.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::{
    job::{self, Entity as Job, JobStatus},
    part::Entity as PartEntity,
    parts_usage_log::{self, Entity as PartsUsageLog},
    vehicle::Entity as Vehicle,
};
use crate::errors::ServiceError;
use crate::services::inventory::{InventoryService, REF_JOB_USAGE};
use crate::services::notifications::NotificationService;

const PRR_PREFIX: &str = "PRR";
const MWR_PREFIX: &str = "MWR";

#[derive(Debug, Clone)]
pub struct CreateJob {
    pub vehicle_id: Uuid,
    pub description: String,
    pub priority: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub created_by: Uuid,
}

#[derive(Debug, Clone)]
pub struct UpdateJob {
    pub description: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<Option<Uuid>>,
}

#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub vehicle_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
}

/// Result of a requisition-number request.
#[derive(Debug, Clone)]
pub struct RequisitionOutcome {
    pub job_id: Uuid,
    pub prr_number: String,
    pub message: &'static str,
}

#[derive(Clone)]
pub struct JobService {
    db: Arc<DatabaseConnection>,
}

impl JobService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create_job(&self, cmd: CreateJob) -> Result<job::Model, ServiceError> {
        if cmd.description.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Description must not be empty".into(),
            ));
        }

        let vehicle = Vehicle::find_by_id(cmd.vehicle_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Vehicle not found".into()))?;

        let now = Utc::now();
        let new_job = job::ActiveModel {
            id: Set(Uuid::new_v4()),
            vehicle_id: Set(vehicle.id),
            course_id: Set(vehicle.course_id),
            description: Set(cmd.description),
            priority: Set(cmd.priority),
            status: Set(JobStatus::Pending.as_str().to_string()),
            prr_number: Set(None),
            mwr_code: Set(None),
            assigned_to: Set(cmd.assigned_to),
            created_by: Set(cmd.created_by),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = new_job.insert(&*self.db).await?;
        info!(job_id = %created.id, vehicle_id = %created.vehicle_id, "job created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn list_jobs(&self, filter: JobFilter) -> Result<Vec<job::Model>, ServiceError> {
        let mut query = Job::find().order_by_desc(job::Column::CreatedAt);
        if let Some(status) = filter.status {
            query = query.filter(job::Column::Status.eq(status.as_str()));
        }
        if let Some(vehicle_id) = filter.vehicle_id {
            query = query.filter(job::Column::VehicleId.eq(vehicle_id));
        }
        if let Some(course_id) = filter.course_id {
            query = query.filter(job::Column::CourseId.eq(course_id));
        }

        Ok(query.all(&*self.db).await?)
    }

    pub async fn get_job(&self, id: Uuid) -> Result<job::Model, ServiceError> {
        Job::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Job not found".into()))
    }

    #[instrument(skip(self))]
    pub async fn update_job(&self, id: Uuid, cmd: UpdateJob) -> Result<job::Model, ServiceError> {
        let found = self.get_job(id).await?;
        let mut active: job::ActiveModel = found.into();

        if let Some(description) = cmd.description {
            if description.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Description must not be empty".into(),
                ));
            }
            active.description = Set(description);
        }
        if let Some(priority) = cmd.priority {
            active.priority = Set(Some(priority));
        }
        if let Some(assigned_to) = cmd.assigned_to {
            active.assigned_to = Set(assigned_to);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_job(&self, id: Uuid) -> Result<(), ServiceError> {
        let found = self.get_job(id).await?;
        found.delete(&*self.db).await?;
        Ok(())
    }

    /// Move a job through its lifecycle. Completion assigns the monthly
    /// work-report code if the job does not already carry one. The job
    /// creator is notified when somebody else changes the status.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: Uuid,
        new_status: JobStatus,
        actor: Uuid,
    ) -> Result<job::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let found = Job::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Job not found".into()))?;

        let current = found.status().ok_or_else(|| {
            ServiceError::InternalError(format!("Job {} has corrupt status '{}'", id, found.status))
        })?;
        if !current.can_transition_to(new_status) {
            return Err(ServiceError::InvalidStatus(format!(
                "Cannot change status from '{}' to '{}'",
                current.as_str(),
                new_status.as_str()
            )));
        }

        let creator = found.created_by;
        let had_mwr = found.mwr_code.is_some();

        let mut active: job::ActiveModel = found.into();
        active.status = Set(new_status.as_str().to_string());
        if new_status == JobStatus::Completed && !had_mwr {
            active.mwr_code = Set(Some(Self::next_mwr_code(&txn).await?));
        }
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await?;

        if creator != actor {
            NotificationService::push(
                &txn,
                creator,
                "Job status updated",
                &format!("Job {} is now '{}'", updated.id, new_status.as_str()),
            )
            .await?;
        }

        txn.commit().await?;

        info!(job_id = %updated.id, status = new_status.as_str(), "job status changed");
        Ok(updated)
    }

    /// Issue or return the purchase-requisition number for an approved job.
    ///
    /// Idempotent: a job that already carries a number gets the same one
    /// back and nothing is written.
    #[instrument(skip(self))]
    pub async fn generate_requisition_number(
        &self,
        job_id: Uuid,
    ) -> Result<RequisitionOutcome, ServiceError> {
        let txn = self.db.begin().await?;

        let found = Job::find_by_id(job_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Job not found".into()))?;

        if found.status() != Some(JobStatus::Approved) {
            return Err(ServiceError::InvalidStatus(
                "Requisition numbers can only be generated for approved jobs".into(),
            ));
        }

        if let Some(existing) = found.prr_number.clone() {
            return Ok(RequisitionOutcome {
                job_id,
                prr_number: existing,
                message: "Using existing requisition number",
            });
        }

        let prefix = format!("{}-{}-", PRR_PREFIX, Utc::now().format("%y%m%d"));
        let taken = Job::find()
            .filter(job::Column::PrrNumber.starts_with(&prefix))
            .count(&txn)
            .await?;
        let code = format!("{}{:04}", prefix, taken + 1);

        let mut active: job::ActiveModel = found.into();
        active.prr_number = Set(Some(code.clone()));
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;

        txn.commit().await?;

        info!(job_id = %job_id, prr = %code, "requisition number generated");
        Ok(RequisitionOutcome {
            job_id,
            prr_number: code,
            message: "Generated new requisition number",
        })
    }

    /// Next monthly work-report code, `MWR-YYMM-NNN`. The caller persists
    /// it; the completion path in [`update_status`](Self::update_status)
    /// does so automatically.
    pub async fn next_mwr_code<C>(conn: &C) -> Result<String, ServiceError>
    where
        C: ConnectionTrait,
    {
        let prefix = format!("{}-{}-", MWR_PREFIX, Utc::now().format("%y%m"));

        let latest = Job::find()
            .filter(job::Column::MwrCode.starts_with(&prefix))
            .order_by_desc(job::Column::MwrCode)
            .limit(1)
            .one(conn)
            .await?;

        let next = latest
            .and_then(|j| j.mwr_code)
            .and_then(|code| code.strip_prefix(&prefix).and_then(|n| n.parse::<u32>().ok()))
            .map(|n| n + 1)
            .unwrap_or(1);

        Ok(format!("{}{:03}", prefix, next))
    }

    /// Record parts consumed by an in-progress job: one usage-log row and a
    /// stock issue at the job's course location, in one transaction.
    #[instrument(skip(self))]
    pub async fn record_parts_usage(
        &self,
        job_id: Uuid,
        part_id: Uuid,
        quantity: i32,
        actor: Uuid,
    ) -> Result<parts_usage_log::Model, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::InvalidInput("Invalid Input".into()));
        }

        let txn = self.db.begin().await?;

        let found = Job::find_by_id(job_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Job not found".into()))?;
        if found.status() != Some(JobStatus::InProgress) {
            return Err(ServiceError::InvalidOperation(
                "Parts usage can only be recorded for a job in progress".into(),
            ));
        }

        let part = PartEntity::find_by_id(part_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Part not found".into()))?;

        InventoryService::issue_stock(
            &txn,
            part,
            found.course_id,
            quantity,
            None,
            REF_JOB_USAGE,
            Some(job_id),
            actor,
        )
        .await?;

        let entry = parts_usage_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            job_id: Set(job_id),
            part_id: Set(part_id),
            quantity: Set(quantity),
            recorded_by: Set(actor),
            created_at: Set(Utc::now()),
        };
        let logged = entry.insert(&txn).await?;

        txn.commit().await?;
        Ok(logged)
    }

    /// Usage history for one job.
    pub async fn parts_usage(
        &self,
        job_id: Uuid,
    ) -> Result<Vec<parts_usage_log::Model>, ServiceError> {
        // 404 for unknown job rather than an empty list
        self.get_job(job_id).await?;
        Ok(PartsUsageLog::find()
            .filter(parts_usage_log::Column::JobId.eq(job_id))
            .order_by_desc(parts_usage_log::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }
}
