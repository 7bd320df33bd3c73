//! Card expense (installment) API endpoints.

use api_types::card_expense::{
    CardExpenseNew, CardExpenseUpdate, CardExpenseView, CardExpensesResponse, CardInvoiceView,
    ExpenseScope, InvoiceQuery, ScopeQuery,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{InvoiceMonth, Money, MutationScope};
use uuid::Uuid;

use crate::{ServerError, parse_amount, server::ServerState, user};

fn map_expense(expense: engine::CardExpense) -> CardExpenseView {
    CardExpenseView {
        id: expense.id,
        credit_card_id: expense.credit_card_id,
        group_id: expense.group_id,
        description: expense.description,
        amount: Money::new(expense.amount_minor).to_decimal_string(),
        purchase_date: expense.purchase_date,
        installment_count: expense.installment_count,
        installment_no: expense.installment_no,
        invoice_month: expense.invoice_month.to_string(),
        created_at: expense.created_at,
    }
}

fn map_scope(scope: Option<ExpenseScope>) -> MutationScope {
    match scope.unwrap_or_default() {
        ExpenseScope::Single => MutationScope::Single,
        ExpenseScope::Group => MutationScope::Group,
    }
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(card_id): Path<Uuid>,
    Json(payload): Json<CardExpenseNew>,
) -> Result<(StatusCode, Json<CardExpensesResponse>), ServerError> {
    let expenses = state
        .engine
        .create_card_expense(
            card_id,
            &user.username,
            engine::NewCardExpense {
                description: payload.description,
                amount_minor: parse_amount(&payload.amount)?,
                purchase_date: payload.purchase_date,
                installments: payload.installments,
            },
            Utc::now(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CardExpensesResponse {
            expenses: expenses.into_iter().map(map_expense).collect(),
        }),
    ))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(card_id): Path<Uuid>,
) -> Result<Json<CardExpensesResponse>, ServerError> {
    let expenses = state
        .engine
        .list_card_expenses(card_id, &user.username)
        .await?
        .into_iter()
        .map(map_expense)
        .collect();

    Ok(Json(CardExpensesResponse { expenses }))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((card_id, expense_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<ScopeQuery>,
    Json(payload): Json<CardExpenseUpdate>,
) -> Result<Json<CardExpensesResponse>, ServerError> {
    let amount_minor = match payload.amount.as_deref() {
        Some(value) => Some(parse_amount(value)?),
        None => None,
    };

    let expenses = state
        .engine
        .update_card_expense(
            card_id,
            expense_id,
            &user.username,
            engine::ExpensePatch {
                description: payload.description,
                amount_minor,
            },
            map_scope(query.scope),
            Utc::now(),
        )
        .await?;

    Ok(Json(CardExpensesResponse {
        expenses: expenses.into_iter().map(map_expense).collect(),
    }))
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((card_id, expense_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<ScopeQuery>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .remove_card_expense(
            card_id,
            expense_id,
            &user.username,
            map_scope(query.scope),
            Utc::now(),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn invoice(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(card_id): Path<Uuid>,
    Query(query): Query<InvoiceQuery>,
) -> Result<Json<CardInvoiceView>, ServerError> {
    let month: InvoiceMonth = query.month.parse()?;

    let invoice = state
        .engine
        .card_invoice(card_id, &user.username, month, Utc::now())
        .await?;

    Ok(Json(CardInvoiceView {
        invoice_month: invoice.invoice_month.to_string(),
        is_closed: invoice.is_closed,
        closing_day: invoice.closing_day,
        total: Money::new(invoice.total_minor).to_decimal_string(),
        expenses: invoice.expenses.into_iter().map(map_expense).collect(),
    }))
}
