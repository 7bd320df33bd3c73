//! Transaction primitives.
//!
//! A `Transaction` is a single dated income or expense. Rows materialized
//! from a recurring plan carry [`RECURRING_PAYMENT_METHOD`] and
//! `is_recurring = true`.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Payment method stamped on transactions generated from a recurring plan.
pub const RECURRING_PAYMENT_METHOD: &str = "Recorrente";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::Validation(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: String,
    pub description: String,
    pub amount_minor: i64,
    pub kind: TransactionKind,
    pub date: NaiveDate,
    pub payment_method: Option<String>,
    pub is_recurring: bool,
    pub category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: String,
        description: String,
        amount_minor: i64,
        kind: TransactionKind,
        date: NaiveDate,
        payment_method: Option<String>,
        is_recurring: bool,
        category_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        let description = description.trim().to_string();
        if description.is_empty() {
            return Err(EngineError::Validation(
                "description must not be empty".to_string(),
            ));
        }
        if amount_minor <= 0 {
            return Err(EngineError::Validation(
                "amount_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            description,
            amount_minor,
            kind,
            date,
            payment_method,
            is_recurring,
            category_id,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub description: String,
    pub amount_minor: i64,
    pub kind: String,
    pub date: Date,
    pub payment_method: Option<String>,
    pub is_recurring: bool,
    pub category_id: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Categories,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            user_id: ActiveValue::Set(tx.user_id.clone()),
            description: ActiveValue::Set(tx.description.clone()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            date: ActiveValue::Set(tx.date),
            payment_method: ActiveValue::Set(tx.payment_method.clone()),
            is_recurring: ActiveValue::Set(tx.is_recurring),
            category_id: ActiveValue::Set(tx.category_id.map(|id| id.to_string())),
            created_at: ActiveValue::Set(tx.created_at),
            updated_at: ActiveValue::Set(tx.updated_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("Transação não encontrada".to_string()))?,
            user_id: model.user_id,
            description: model.description,
            amount_minor: model.amount_minor,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            date: model.date,
            payment_method: model.payment_method,
            is_recurring: model.is_recurring,
            category_id: model.category_id.and_then(|id| Uuid::parse_str(&id).ok()),
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
