//! Dashboard API endpoints.

use api_types::dashboard::{DashboardSummaryView, SummaryQuery};
use axum::{
    Extension, Json,
    extract::{Query, State},
};
use engine::Money;

use crate::{ServerError, server::ServerState, user};

pub async fn summary(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<DashboardSummaryView>, ServerError> {
    let summary = state
        .engine
        .dashboard_summary(&user.username, query.from, query.to)
        .await?;

    Ok(Json(DashboardSummaryView {
        balance: Money::new(summary.balance_minor).to_decimal_string(),
        total_income: Money::new(summary.income_minor).to_decimal_string(),
        total_expense: Money::new(summary.expense_minor).to_decimal_string(),
    }))
}
