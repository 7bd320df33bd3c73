//! Dashboard aggregation.

use chrono::NaiveDate;
use sea_orm::{Statement, Value, prelude::*};

use crate::{ResultEngine, TransactionKind};

use super::Engine;

/// Totals over the caller's transactions within an optional date range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DashboardSummary {
    pub income_minor: i64,
    pub expense_minor: i64,
    pub balance_minor: i64,
}

impl Engine {
    /// Sums income and expenses SQL-side; `from`/`to` are inclusive dates.
    pub async fn dashboard_summary(
        &self,
        user_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> ResultEngine<DashboardSummary> {
        let income_minor = self.sum_transactions(user_id, TransactionKind::Income, from, to).await?;
        let expense_minor = self.sum_transactions(user_id, TransactionKind::Expense, from, to).await?;

        Ok(DashboardSummary {
            income_minor,
            expense_minor,
            balance_minor: income_minor - expense_minor,
        })
    }

    async fn sum_transactions(
        &self,
        user_id: &str,
        kind: TransactionKind,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> ResultEngine<i64> {
        let backend = self.database.get_database_backend();

        let mut sql = String::from(
            "SELECT COALESCE(SUM(amount_minor), 0) AS sum \
             FROM transactions \
             WHERE user_id = ? AND kind = ?",
        );
        let mut values: Vec<Value> = vec![user_id.into(), kind.as_str().into()];
        if let Some(from) = from {
            sql.push_str(" AND date >= ?");
            values.push(from.into());
        }
        if let Some(to) = to {
            sql.push_str(" AND date <= ?");
            values.push(to.into());
        }

        let stmt = Statement::from_sql_and_values(backend, sql, values);
        let row = self.database.query_one(stmt).await?;
        Ok(row.and_then(|r| r.try_get("", "sum").ok()).unwrap_or(0))
    }
}
