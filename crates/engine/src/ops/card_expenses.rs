//! Card expense (installment) operations.
//!
//! Mutations are gated by the invoice state: every affected row's own invoice
//! month must still be open, and group-scoped changes run inside one database
//! transaction so a single closed installment rejects the whole group with
//! nothing applied.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    CardExpense, CreditCard, EngineError, ResultEngine, card_expenses,
    invoices::{self, CardPurchase, InvoiceMonth},
};

use super::{Engine, ensure_positive_amount, normalize_required_text, with_tx};

/// Whether a mutation targets one installment or the whole purchase group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MutationScope {
    #[default]
    Single,
    Group,
}

/// A card purchase as submitted, before installment fan-out.
#[derive(Clone, Debug)]
pub struct NewCardExpense {
    pub description: String,
    pub amount_minor: i64,
    pub purchase_date: NaiveDate,
    /// Absent or 0 means a single installment.
    pub installments: Option<u32>,
}

/// Partial installment update; unset fields keep their value.
#[derive(Clone, Debug, Default)]
pub struct ExpensePatch {
    pub description: Option<String>,
    pub amount_minor: Option<i64>,
}

/// One month's invoice: its rows, total and open/closed state.
#[derive(Clone, Debug)]
pub struct CardInvoice {
    pub invoice_month: InvoiceMonth,
    pub is_closed: bool,
    pub closing_day: u8,
    pub total_minor: i64,
    pub expenses: Vec<CardExpense>,
}

impl Engine {
    /// Registers a purchase, fanning it out into installment rows.
    pub async fn create_card_expense(
        &self,
        card_id: Uuid,
        user_id: &str,
        new: NewCardExpense,
        now: DateTime<Utc>,
    ) -> ResultEngine<Vec<CardExpense>> {
        let card = self.card(card_id, user_id).await?;
        let description = normalize_required_text(&new.description, "description")?;
        ensure_positive_amount(new.amount_minor)?;

        let purchase = CardPurchase {
            description,
            amount_minor: new.amount_minor,
            purchase_date: new.purchase_date,
            installments: new.installments.unwrap_or(1),
        };
        let rows =
            invoices::allocate_installments(card.id, user_id, &purchase, card.closing_day, now);

        with_tx!(self, |tx| {
            let result: ResultEngine<Vec<CardExpense>> = async {
                for row in &rows {
                    card_expenses::ActiveModel::from(row).insert(&tx).await?;
                }
                Ok(rows)
            }
            .await;
            result
        })
    }

    /// All installment rows of a card, newest invoice first.
    pub async fn list_card_expenses(
        &self,
        card_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Vec<CardExpense>> {
        let card = self.card(card_id, user_id).await?;

        let models = card_expenses::Entity::find()
            .filter(card_expenses::Column::CreditCardId.eq(card.id.to_string()))
            .filter(card_expenses::Column::UserId.eq(user_id))
            .order_by_desc(card_expenses::Column::InvoiceMonth)
            .order_by_asc(card_expenses::Column::InstallmentNo)
            .all(&self.database)
            .await?;

        models.into_iter().map(CardExpense::try_from).collect()
    }

    /// Updates one installment or its whole group, provided every affected
    /// invoice is still open. All-or-nothing: runs in one transaction.
    pub async fn update_card_expense(
        &self,
        card_id: Uuid,
        expense_id: Uuid,
        user_id: &str,
        patch: ExpensePatch,
        scope: MutationScope,
        now: DateTime<Utc>,
    ) -> ResultEngine<Vec<CardExpense>> {
        let card = self.card(card_id, user_id).await?;

        let description = match patch.description {
            Some(description) => Some(normalize_required_text(&description, "description")?),
            None => None,
        };
        if let Some(amount_minor) = patch.amount_minor {
            ensure_positive_amount(amount_minor)?;
        }

        with_tx!(self, |tx| {
            let result: ResultEngine<Vec<CardExpense>> = async {
                let mut targets = affected_expenses(&tx, &card, expense_id, user_id, scope).await?;
                for expense in &targets {
                    invoices::ensure_invoice_open(card.closing_day, expense.invoice_month, now)?;
                }

                for expense in &mut targets {
                    if let Some(description) = &description {
                        expense.description = description.clone();
                    }
                    if let Some(amount_minor) = patch.amount_minor {
                        expense.amount_minor = amount_minor;
                    }

                    let model = card_expenses::ActiveModel {
                        id: ActiveValue::Set(expense.id.to_string()),
                        description: ActiveValue::Set(expense.description.clone()),
                        amount_minor: ActiveValue::Set(expense.amount_minor),
                        ..Default::default()
                    };
                    model.update(&tx).await?;
                }
                Ok(targets)
            }
            .await;
            result
        })
    }

    /// Removes one installment or its whole group under the same gate and
    /// transaction rules as [`Engine::update_card_expense`].
    pub async fn remove_card_expense(
        &self,
        card_id: Uuid,
        expense_id: Uuid,
        user_id: &str,
        scope: MutationScope,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        let card = self.card(card_id, user_id).await?;

        with_tx!(self, |tx| {
            let result: ResultEngine<()> = async {
                let targets = affected_expenses(&tx, &card, expense_id, user_id, scope).await?;
                for expense in &targets {
                    invoices::ensure_invoice_open(card.closing_day, expense.invoice_month, now)?;
                }

                for expense in &targets {
                    let model = card_expenses::ActiveModel {
                        id: ActiveValue::Set(expense.id.to_string()),
                        ..Default::default()
                    };
                    model.delete(&tx).await?;
                }
                Ok(())
            }
            .await;
            result
        })
    }

    /// The invoice for one month: rows, total and recomputed open/closed
    /// state as of `now`.
    pub async fn card_invoice(
        &self,
        card_id: Uuid,
        user_id: &str,
        month: InvoiceMonth,
        now: DateTime<Utc>,
    ) -> ResultEngine<CardInvoice> {
        let card = self.card(card_id, user_id).await?;

        let models = card_expenses::Entity::find()
            .filter(card_expenses::Column::CreditCardId.eq(card.id.to_string()))
            .filter(card_expenses::Column::UserId.eq(user_id))
            .filter(card_expenses::Column::InvoiceMonth.eq(month.to_string()))
            .order_by_asc(card_expenses::Column::PurchaseDate)
            .order_by_asc(card_expenses::Column::InstallmentNo)
            .all(&self.database)
            .await?;

        let expenses: Vec<CardExpense> = models
            .into_iter()
            .map(CardExpense::try_from)
            .collect::<ResultEngine<_>>()?;
        let total_minor = expenses.iter().map(|e| e.amount_minor).sum();

        Ok(CardInvoice {
            invoice_month: month,
            is_closed: invoices::is_invoice_closed(card.closing_day, month, now),
            closing_day: card.closing_day,
            total_minor,
            expenses,
        })
    }
}

/// Loads the rows a scoped mutation touches: just the target installment, or
/// every installment sharing its group id.
async fn affected_expenses<C: ConnectionTrait>(
    conn: &C,
    card: &CreditCard,
    expense_id: Uuid,
    user_id: &str,
    scope: MutationScope,
) -> ResultEngine<Vec<CardExpense>> {
    let model = card_expenses::Entity::find_by_id(expense_id.to_string())
        .filter(card_expenses::Column::CreditCardId.eq(card.id.to_string()))
        .filter(card_expenses::Column::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or_else(|| EngineError::NotFound("Despesa não encontrada".to_string()))?;
    let expense = CardExpense::try_from(model)?;

    match scope {
        MutationScope::Single => Ok(vec![expense]),
        MutationScope::Group => {
            let models = card_expenses::Entity::find()
                .filter(card_expenses::Column::CreditCardId.eq(card.id.to_string()))
                .filter(card_expenses::Column::UserId.eq(user_id))
                .filter(card_expenses::Column::GroupId.eq(expense.group_id.to_string()))
                .order_by_asc(card_expenses::Column::InstallmentNo)
                .all(conn)
                .await?;

            if models.is_empty() {
                return Err(EngineError::NotFound(
                    "Grupo de parcelas não encontrado".to_string(),
                ));
            }
            models.into_iter().map(CardExpense::try_from).collect()
        }
    }
}
