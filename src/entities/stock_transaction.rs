use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a single balance change. A transfer is recorded as an
/// OUT row at the source and an IN row at the destination, so there is
/// no separate transfer direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    In,
    Out,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::In => "IN",
            TransactionType::Out => "OUT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "IN" => Some(TransactionType::In),
            "OUT" => Some(TransactionType::Out),
            _ => None,
        }
    }
}

/// One immutable stock ledger entry. Rows are appended, never mutated or
/// deleted; a transfer appends two of them (OUT side, then IN side).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub part_id: Uuid,
    pub tx_type: String,
    pub quantity: i32,
    pub previous_quantity: i32,
    pub new_quantity: i32,
    /// Location the change applied to; None means the central site.
    pub location_id: Option<Uuid>,
    /// For the OUT side of a transfer, where the stock went.
    pub destination_location_id: Option<Uuid>,
    pub reference_type: String,
    pub reference_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if let ActiveValue::NotSet = active_model.created_at {
            active_model.created_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_type_round_trips_through_its_wire_form() {
        for ty in [TransactionType::In, TransactionType::Out] {
            assert_eq!(TransactionType::parse(ty.as_str()), Some(ty));
        }
    }

    #[test]
    fn unknown_transaction_types_are_rejected() {
        assert_eq!(TransactionType::parse("TRANSFER"), None);
        assert_eq!(TransactionType::parse("in"), None);
        assert_eq!(TransactionType::parse(""), None);
    }
}
