//! Transaction operations.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, Transaction, TransactionKind, transactions};

use super::{Engine, Page, ensure_positive_amount, normalize_required_text, page_bounds};

/// Attributes for a new transaction.
#[derive(Clone, Debug)]
pub struct NewTransaction {
    pub description: String,
    pub amount_minor: i64,
    pub kind: TransactionKind,
    pub date: NaiveDate,
    pub payment_method: Option<String>,
    pub category_id: Option<Uuid>,
}

/// Partial transaction update. Double-`Option` fields distinguish "leave
/// unchanged" from "clear".
#[derive(Clone, Debug, Default)]
pub struct TransactionPatch {
    pub description: Option<String>,
    pub amount_minor: Option<i64>,
    pub kind: Option<TransactionKind>,
    pub date: Option<NaiveDate>,
    pub payment_method: Option<Option<String>>,
    pub category_id: Option<Option<Uuid>>,
}

/// Filters for listing transactions.
///
/// `from` and `to` are inclusive calendar dates.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransactionListFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub kind: Option<TransactionKind>,
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from > to
    {
        return Err(EngineError::Validation(
            "invalid range: from must be <= to".to_string(),
        ));
    }
    Ok(())
}

impl Engine {
    pub async fn create_transaction(
        &self,
        user_id: &str,
        new: NewTransaction,
        now: DateTime<Utc>,
    ) -> ResultEngine<Transaction> {
        if let Some(category_id) = new.category_id {
            self.category(category_id, user_id).await?;
        }

        let tx = Transaction::new(
            user_id.to_string(),
            new.description,
            new.amount_minor,
            new.kind,
            new.date,
            new.payment_method,
            false,
            new.category_id,
            now,
        )?;

        transactions::ActiveModel::from(&tx).insert(&self.database).await?;
        Ok(tx)
    }

    pub async fn list_transactions(
        &self,
        user_id: &str,
        filter: TransactionListFilter,
        page: Option<u64>,
        page_size: Option<u64>,
    ) -> ResultEngine<Page<Transaction>> {
        validate_list_filter(&filter)?;
        let (page, page_size) = page_bounds(page, page_size);

        let mut query = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id));
        if let Some(from) = filter.from {
            query = query.filter(transactions::Column::Date.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(transactions::Column::Date.lte(to));
        }
        if let Some(kind) = filter.kind {
            query = query.filter(transactions::Column::Kind.eq(kind.as_str()));
        }

        let total = query.clone().count(&self.database).await?;
        let models = query
            .order_by_desc(transactions::Column::Date)
            .order_by_desc(transactions::Column::CreatedAt)
            .offset((page - 1) * page_size)
            .limit(page_size)
            .all(&self.database)
            .await?;

        let items = models
            .into_iter()
            .map(Transaction::try_from)
            .collect::<ResultEngine<_>>()?;
        Ok(Page::new(items, page, page_size, total))
    }

    /// Returns a transaction owned by the caller, or `NotFound`.
    pub async fn transaction(&self, tx_id: Uuid, user_id: &str) -> ResultEngine<Transaction> {
        let model = transactions::Entity::find_by_id(tx_id.to_string())
            .filter(transactions::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound("Transação não encontrada".to_string()))?;

        Transaction::try_from(model)
    }

    pub async fn update_transaction(
        &self,
        tx_id: Uuid,
        user_id: &str,
        patch: TransactionPatch,
        now: DateTime<Utc>,
    ) -> ResultEngine<Transaction> {
        let mut tx = self.transaction(tx_id, user_id).await?;

        if let Some(description) = patch.description {
            tx.description = normalize_required_text(&description, "description")?;
        }
        if let Some(amount_minor) = patch.amount_minor {
            ensure_positive_amount(amount_minor)?;
            tx.amount_minor = amount_minor;
        }
        if let Some(kind) = patch.kind {
            tx.kind = kind;
        }
        if let Some(date) = patch.date {
            tx.date = date;
        }
        if let Some(payment_method) = patch.payment_method {
            tx.payment_method = payment_method;
        }
        if let Some(category_id) = patch.category_id {
            if let Some(id) = category_id {
                self.category(id, user_id).await?;
            }
            tx.category_id = category_id;
        }
        tx.updated_at = now;

        transactions::ActiveModel::from(&tx).update(&self.database).await?;
        Ok(tx)
    }

    pub async fn delete_transaction(&self, tx_id: Uuid, user_id: &str) -> ResultEngine<()> {
        let tx = self.transaction(tx_id, user_id).await?;

        let model = transactions::ActiveModel {
            id: ActiveValue::Set(tx.id.to_string()),
            ..Default::default()
        };
        model.delete(&self.database).await?;
        Ok(())
    }
}
