//! Installment rows for card purchases.
//!
//! A purchase is never stored as a single row: it is expanded into one
//! `CardExpense` per installment at creation time (see
//! [`crate::invoices::allocate_installments`]), all sharing a group id.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, invoices::InvoiceMonth};

/// One installment of a card purchase, assigned to an invoice month.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardExpense {
    pub id: Uuid,
    pub credit_card_id: Uuid,
    pub user_id: String,
    /// Shared by every installment of one purchase.
    pub group_id: Uuid,
    pub description: String,
    /// The full purchase amount; not divided across installments.
    pub amount_minor: i64,
    pub purchase_date: NaiveDate,
    pub installment_count: u32,
    /// 1-based position within the group.
    pub installment_no: u32,
    pub invoice_month: InvoiceMonth,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "card_expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub credit_card_id: String,
    pub user_id: String,
    pub group_id: String,
    pub description: String,
    pub amount_minor: i64,
    pub purchase_date: Date,
    pub installment_count: i32,
    pub installment_no: i32,
    pub invoice_month: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cards::Entity",
        from = "Column::CreditCardId",
        to = "super::cards::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    CreditCards,
}

impl Related<super::cards::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreditCards.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&CardExpense> for ActiveModel {
    fn from(expense: &CardExpense) -> Self {
        Self {
            id: ActiveValue::Set(expense.id.to_string()),
            credit_card_id: ActiveValue::Set(expense.credit_card_id.to_string()),
            user_id: ActiveValue::Set(expense.user_id.clone()),
            group_id: ActiveValue::Set(expense.group_id.to_string()),
            description: ActiveValue::Set(expense.description.clone()),
            amount_minor: ActiveValue::Set(expense.amount_minor),
            purchase_date: ActiveValue::Set(expense.purchase_date),
            installment_count: ActiveValue::Set(expense.installment_count as i32),
            installment_no: ActiveValue::Set(expense.installment_no as i32),
            invoice_month: ActiveValue::Set(expense.invoice_month.to_string()),
            created_at: ActiveValue::Set(expense.created_at),
        }
    }
}

impl TryFrom<Model> for CardExpense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let not_found = || EngineError::NotFound("Despesa não encontrada".to_string());
        Ok(Self {
            id: Uuid::parse_str(&model.id).map_err(|_| not_found())?,
            credit_card_id: Uuid::parse_str(&model.credit_card_id).map_err(|_| not_found())?,
            user_id: model.user_id,
            group_id: Uuid::parse_str(&model.group_id).map_err(|_| not_found())?,
            description: model.description,
            amount_minor: model.amount_minor,
            purchase_date: model.purchase_date,
            installment_count: u32::try_from(model.installment_count).unwrap_or(1),
            installment_no: u32::try_from(model.installment_no).unwrap_or(1),
            invoice_month: model.invoice_month.parse()?,
            created_at: model.created_at,
        })
    }
}
