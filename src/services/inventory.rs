//! Multi-location spare-parts stock.
//!
//! Every balance change goes through this service so the append-only ledger
//! and the legacy `parts.stock_qty` aggregate stay consistent with the
//! `inventory_levels` rows. A location of `None` is the central site.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::{
    inventory_level::{self, Entity as InventoryLevel},
    part::{self, Entity as PartEntity},
    stock_transaction::{self, Entity as StockTransaction, TransactionType},
};
use crate::errors::ServiceError;

/// Ledger reference for a manually requested transfer.
pub const REF_MANUAL_TRANSFER: &str = "manual_transfer";
/// Ledger reference for direct stock receipt/issue.
pub const REF_MANUAL: &str = "manual";
/// Ledger reference for parts consumed by a maintenance job.
pub const REF_JOB_USAGE: &str = "job_usage";

/// Move `quantity` of a part from one location to another.
#[derive(Debug, Clone)]
pub struct TransferStock {
    pub part_id: Uuid,
    pub from_location: Option<Uuid>,
    pub to_location: Option<Uuid>,
    pub quantity: i32,
    pub actor: Uuid,
}

/// Receive into or issue from a single location.
#[derive(Debug, Clone)]
pub struct StockMovement {
    pub part_id: Uuid,
    pub location: Option<Uuid>,
    pub quantity: i32,
    pub actor: Uuid,
}

#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
}

impl InventoryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Atomically move stock between two locations, appending an OUT and an
    /// IN ledger entry. Rolls back entirely on any failure; the
    /// insufficient-stock check runs before any mutation.
    #[instrument(skip(self))]
    pub async fn transfer_stock(&self, cmd: TransferStock) -> Result<(), ServiceError> {
        if cmd.quantity <= 0 {
            return Err(ServiceError::InvalidInput("Invalid Input".into()));
        }
        if cmd.from_location == cmd.to_location {
            return Err(ServiceError::InvalidOperation(
                "Source and Destination must be different".into(),
            ));
        }

        let txn = self.db.begin().await?;

        let part = PartEntity::find_by_id(cmd.part_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Part not found".into()))?;

        let (part, _) = Self::issue_stock(
            &txn,
            part,
            cmd.from_location,
            cmd.quantity,
            cmd.to_location,
            REF_MANUAL_TRANSFER,
            None,
            cmd.actor,
        )
        .await?;

        Self::receive_stock(
            &txn,
            part,
            cmd.to_location,
            cmd.quantity,
            REF_MANUAL_TRANSFER,
            None,
            cmd.actor,
        )
        .await?;

        txn.commit().await?;

        info!(
            part_id = %cmd.part_id,
            from = ?cmd.from_location,
            to = ?cmd.to_location,
            quantity = cmd.quantity,
            "stock transferred"
        );
        Ok(())
    }

    /// Receive stock into a location (IN ledger entry).
    #[instrument(skip(self))]
    pub async fn stock_in(
        &self,
        cmd: StockMovement,
    ) -> Result<inventory_level::Model, ServiceError> {
        if cmd.quantity <= 0 {
            return Err(ServiceError::InvalidInput("Invalid Input".into()));
        }

        let txn = self.db.begin().await?;
        let part = PartEntity::find_by_id(cmd.part_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Part not found".into()))?;

        let (_, level) = Self::receive_stock(
            &txn,
            part,
            cmd.location,
            cmd.quantity,
            REF_MANUAL,
            None,
            cmd.actor,
        )
        .await?;

        txn.commit().await?;
        Ok(level)
    }

    /// Issue stock out of a location (OUT ledger entry).
    #[instrument(skip(self))]
    pub async fn stock_out(
        &self,
        cmd: StockMovement,
    ) -> Result<inventory_level::Model, ServiceError> {
        if cmd.quantity <= 0 {
            return Err(ServiceError::InvalidInput("Invalid Input".into()));
        }

        let txn = self.db.begin().await?;
        let part = PartEntity::find_by_id(cmd.part_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Part not found".into()))?;

        let (_, level) = Self::issue_stock(
            &txn,
            part,
            cmd.location,
            cmd.quantity,
            None,
            REF_MANUAL,
            None,
            cmd.actor,
        )
        .await?;

        txn.commit().await?;
        Ok(level)
    }

    /// List balance rows, optionally filtered by part and/or location.
    /// `location` of `Some(None)` selects the central site.
    #[instrument(skip(self))]
    pub async fn levels(
        &self,
        part_id: Option<Uuid>,
        location: Option<Option<Uuid>>,
    ) -> Result<Vec<inventory_level::Model>, ServiceError> {
        let mut query = InventoryLevel::find();
        if let Some(part_id) = part_id {
            query = query.filter(inventory_level::Column::PartId.eq(part_id));
        }
        match location {
            Some(Some(course_id)) => {
                query = query.filter(inventory_level::Column::LocationId.eq(course_id));
            }
            Some(None) => {
                query = query.filter(inventory_level::Column::LocationId.is_null());
            }
            None => {}
        }

        Ok(query.all(&*self.db).await?)
    }

    /// Ledger query, newest first.
    #[instrument(skip(self))]
    pub async fn transactions(
        &self,
        part_id: Option<Uuid>,
        limit: u64,
    ) -> Result<Vec<stock_transaction::Model>, ServiceError> {
        let mut query = StockTransaction::find()
            .order_by_desc(stock_transaction::Column::CreatedAt)
            .limit(limit);
        if let Some(part_id) = part_id {
            query = query.filter(stock_transaction::Column::PartId.eq(part_id));
        }

        Ok(query.all(&*self.db).await?)
    }

    /// Deduct stock at a location and append an OUT ledger entry.
    ///
    /// Runs on the caller's connection so job consumption can share a
    /// transaction with its usage log. Central issues mirror the delta onto
    /// the legacy `parts.stock_qty` aggregate.
    pub(crate) async fn issue_stock<C>(
        conn: &C,
        part: part::Model,
        location: Option<Uuid>,
        quantity: i32,
        destination: Option<Uuid>,
        reference_type: &str,
        reference_id: Option<Uuid>,
        actor: Uuid,
    ) -> Result<(part::Model, inventory_level::Model), ServiceError>
    where
        C: ConnectionTrait,
    {
        let level = Self::find_level(conn, part.id, location).await?;
        let available = level.as_ref().map(|l| l.quantity).unwrap_or(0);
        if available < quantity {
            return Err(ServiceError::InsufficientStock(format!(
                "Insufficient stock at source (Available: {})",
                available
            )));
        }
        // available >= quantity > 0, so the row exists
        let level = level.ok_or_else(|| {
            ServiceError::InsufficientStock("Insufficient stock at source (Available: 0)".into())
        })?;

        let previous = level.quantity;
        let new_balance = previous - quantity;

        let mut active: inventory_level::ActiveModel = level.into();
        active.quantity = Set(new_balance);
        active.updated_at = Set(Utc::now());
        let level = active.update(conn).await?;

        let part = if location.is_none() {
            Self::apply_central_delta(conn, part, -quantity).await?
        } else {
            part
        };

        Self::append_ledger(
            conn,
            part.id,
            TransactionType::Out,
            quantity,
            previous,
            new_balance,
            location,
            destination,
            reference_type,
            reference_id,
            actor,
        )
        .await?;

        Ok((part, level))
    }

    /// Add stock at a location, creating the balance row on first receipt,
    /// and append an IN ledger entry.
    pub(crate) async fn receive_stock<C>(
        conn: &C,
        part: part::Model,
        location: Option<Uuid>,
        quantity: i32,
        reference_type: &str,
        reference_id: Option<Uuid>,
        actor: Uuid,
    ) -> Result<(part::Model, inventory_level::Model), ServiceError>
    where
        C: ConnectionTrait,
    {
        let existing = Self::find_level(conn, part.id, location).await?;
        let now = Utc::now();

        let (previous, level) = match existing {
            Some(level) => {
                let previous = level.quantity;
                let mut active: inventory_level::ActiveModel = level.into();
                active.quantity = Set(previous + quantity);
                active.updated_at = Set(now);
                (previous, active.update(conn).await?)
            }
            None => {
                let active = inventory_level::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    part_id: Set(part.id),
                    location_id: Set(location),
                    quantity: Set(quantity),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                (0, active.insert(conn).await?)
            }
        };

        let part = if location.is_none() {
            Self::apply_central_delta(conn, part, quantity).await?
        } else {
            part
        };

        Self::append_ledger(
            conn,
            part.id,
            TransactionType::In,
            quantity,
            previous,
            previous + quantity,
            location,
            None,
            reference_type,
            reference_id,
            actor,
        )
        .await?;

        Ok((part, level))
    }

    async fn find_level<C>(
        conn: &C,
        part_id: Uuid,
        location: Option<Uuid>,
    ) -> Result<Option<inventory_level::Model>, ServiceError>
    where
        C: ConnectionTrait,
    {
        let mut query = InventoryLevel::find().filter(inventory_level::Column::PartId.eq(part_id));
        query = match location {
            Some(course_id) => query.filter(inventory_level::Column::LocationId.eq(course_id)),
            None => query.filter(inventory_level::Column::LocationId.is_null()),
        };

        Ok(query.one(conn).await?)
    }

    /// Single writer path for the legacy central aggregate. Only ever
    /// called for central-site movements, alongside the matching
    /// `inventory_levels` update in the same transaction.
    async fn apply_central_delta<C>(
        conn: &C,
        part: part::Model,
        delta: i32,
    ) -> Result<part::Model, ServiceError>
    where
        C: ConnectionTrait,
    {
        let new_qty = part.stock_qty + delta;
        let mut active: part::ActiveModel = part.into();
        active.stock_qty = Set(new_qty);
        active.updated_at = Set(Utc::now());
        Ok(active.update(conn).await?)
    }

    #[allow(clippy::too_many_arguments)]
    async fn append_ledger<C>(
        conn: &C,
        part_id: Uuid,
        tx_type: TransactionType,
        quantity: i32,
        previous_quantity: i32,
        new_quantity: i32,
        location: Option<Uuid>,
        destination: Option<Uuid>,
        reference_type: &str,
        reference_id: Option<Uuid>,
        actor: Uuid,
    ) -> Result<(), ServiceError>
    where
        C: ConnectionTrait,
    {
        let entry = stock_transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            part_id: Set(part_id),
            tx_type: Set(tx_type.as_str().to_string()),
            quantity: Set(quantity),
            previous_quantity: Set(previous_quantity),
            new_quantity: Set(new_quantity),
            location_id: Set(location),
            destination_location_id: Set(destination),
            reference_type: Set(reference_type.to_string()),
            reference_id: Set(reference_id),
            created_by: Set(actor),
            ..Default::default()
        };
        entry.insert(conn).await?;
        Ok(())
    }
}
