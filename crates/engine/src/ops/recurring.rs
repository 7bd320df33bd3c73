//! Recurring expense plan operations.
//!
//! Creating a bounded plan with a category materializes its projected
//! occurrences as expense transactions, in the same database transaction as
//! the plan insert.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Transaction, TransactionKind,
    recurring::{self, DateWindow, Frequency, PlanKind, RecurringPlan},
    transactions::{self, RECURRING_PAYMENT_METHOD},
};

use super::{Engine, Page, ensure_positive_amount, normalize_required_text, page_bounds, with_tx};

/// Attributes for a new plan.
#[derive(Clone, Debug)]
pub struct NewRecurringPlan {
    pub description: String,
    pub amount_minor: i64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub frequency: Frequency,
    pub custom_interval_days: Option<u32>,
    pub total_installments: u32,
    pub current_installment: Option<u32>,
    pub kind: PlanKind,
    pub category_id: Option<Uuid>,
}

/// Partial plan update. Double-`Option` fields distinguish "leave unchanged"
/// from "clear".
#[derive(Clone, Debug, Default)]
pub struct RecurringPlanPatch {
    pub description: Option<String>,
    pub amount_minor: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub frequency: Option<Frequency>,
    pub custom_interval_days: Option<Option<u32>>,
    pub total_installments: Option<u32>,
    pub current_installment: Option<u32>,
    pub kind: Option<PlanKind>,
    pub category_id: Option<Option<Uuid>>,
}

/// Listing filter on plan start dates.
#[derive(Clone, Copy, Debug, Default)]
pub struct RecurringListFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Engine {
    pub async fn create_recurring_plan(
        &self,
        user_id: &str,
        new: NewRecurringPlan,
        now: DateTime<Utc>,
    ) -> ResultEngine<RecurringPlan> {
        let plan = RecurringPlan {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            description: normalize_required_text(&new.description, "description")?,
            amount_minor: new.amount_minor,
            start_date: new.start_date,
            end_date: new.end_date,
            frequency: new.frequency,
            custom_interval_days: new.custom_interval_days,
            total_installments: new.total_installments,
            current_installment: new.current_installment.unwrap_or(0),
            kind: new.kind,
            category_id: new.category_id,
            created_at: now,
            updated_at: now,
        };
        plan.validate()?;

        if let Some(category_id) = plan.category_id {
            self.category(category_id, user_id).await?;
        }

        with_tx!(self, |tx| {
            let result: ResultEngine<RecurringPlan> = async {
                recurring::ActiveModel::from(&plan).insert(&tx).await?;

                // Materialize expense transactions for bounded, categorized
                // plans; unbounded plans are projected on demand instead.
                if plan.total_installments > 0
                    && let Some(category_id) = plan.category_id
                {
                    for date in recurring::project(&plan, None) {
                        let row = Transaction::new(
                            plan.user_id.clone(),
                            plan.description.clone(),
                            plan.amount_minor,
                            TransactionKind::Expense,
                            date,
                            Some(RECURRING_PAYMENT_METHOD.to_string()),
                            true,
                            Some(category_id),
                            now,
                        )?;
                        transactions::ActiveModel::from(&row).insert(&tx).await?;
                    }
                }
                Ok(plan)
            }
            .await;
            result
        })
    }

    pub async fn list_recurring_plans(
        &self,
        user_id: &str,
        filter: RecurringListFilter,
        page: Option<u64>,
        page_size: Option<u64>,
    ) -> ResultEngine<Page<RecurringPlan>> {
        let (page, page_size) = page_bounds(page, page_size);

        let mut query = recurring::Entity::find()
            .filter(recurring::Column::UserId.eq(user_id));
        if let Some(from) = filter.start_date {
            query = query.filter(recurring::Column::StartDate.gte(from));
        }
        if let Some(to) = filter.end_date {
            query = query.filter(recurring::Column::StartDate.lte(to));
        }

        let total = query.clone().count(&self.database).await?;
        let models = query
            .order_by_desc(recurring::Column::CreatedAt)
            .offset((page - 1) * page_size)
            .limit(page_size)
            .all(&self.database)
            .await?;

        let items = models
            .into_iter()
            .map(RecurringPlan::try_from)
            .collect::<ResultEngine<_>>()?;
        Ok(Page::new(items, page, page_size, total))
    }

    /// Returns a plan owned by the caller, or `NotFound`.
    pub async fn recurring_plan(
        &self,
        plan_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<RecurringPlan> {
        let model = recurring::Entity::find_by_id(plan_id.to_string())
            .filter(recurring::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound("Recurring expense not found".to_string()))?;

        RecurringPlan::try_from(model)
    }

    pub async fn update_recurring_plan(
        &self,
        plan_id: Uuid,
        user_id: &str,
        patch: RecurringPlanPatch,
        now: DateTime<Utc>,
    ) -> ResultEngine<RecurringPlan> {
        let mut plan = self.recurring_plan(plan_id, user_id).await?;

        if let Some(description) = patch.description {
            plan.description = normalize_required_text(&description, "description")?;
        }
        if let Some(amount_minor) = patch.amount_minor {
            ensure_positive_amount(amount_minor)?;
            plan.amount_minor = amount_minor;
        }
        if let Some(start_date) = patch.start_date {
            plan.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            plan.end_date = end_date;
        }
        if let Some(frequency) = patch.frequency {
            plan.frequency = frequency;
        }
        if let Some(custom_interval_days) = patch.custom_interval_days {
            plan.custom_interval_days = custom_interval_days;
        }
        if let Some(total_installments) = patch.total_installments {
            plan.total_installments = total_installments;
        }
        if let Some(current_installment) = patch.current_installment {
            plan.current_installment = current_installment;
        }
        if let Some(kind) = patch.kind {
            plan.kind = kind;
        }
        if let Some(category_id) = patch.category_id {
            if let Some(id) = category_id {
                self.category(id, user_id).await?;
            }
            plan.category_id = category_id;
        }
        plan.updated_at = now;
        plan.validate()?;

        recurring::ActiveModel::from(&plan).update(&self.database).await?;
        Ok(plan)
    }

    pub async fn delete_recurring_plan(&self, plan_id: Uuid, user_id: &str) -> ResultEngine<()> {
        let plan = self.recurring_plan(plan_id, user_id).await?;

        let model = recurring::ActiveModel {
            id: ActiveValue::Set(plan.id.to_string()),
            ..Default::default()
        };
        model.delete(&self.database).await?;
        Ok(())
    }

    /// Projects a plan's occurrences, optionally restricted to a window.
    pub async fn plan_occurrences(
        &self,
        plan_id: Uuid,
        user_id: &str,
        window: Option<DateWindow>,
    ) -> ResultEngine<Vec<NaiveDate>> {
        if let Some(window) = window
            && window.from > window.to
        {
            return Err(EngineError::Validation(
                "invalid window: from must be <= to".to_string(),
            ));
        }

        let plan = self.recurring_plan(plan_id, user_id).await?;
        Ok(recurring::project(&plan, window))
    }
}
