//! Transactions API endpoints.

use api_types::transaction::{
    TransactionKind as ApiKind, TransactionListQuery, TransactionListResponse, TransactionNew,
    TransactionUpdate, TransactionView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{Money, TransactionKind};
use uuid::Uuid;

use crate::{ServerError, parse_amount, server::ServerState, user};

fn map_kind(kind: ApiKind) -> TransactionKind {
    match kind {
        ApiKind::Income => TransactionKind::Income,
        ApiKind::Expense => TransactionKind::Expense,
    }
}

fn map_kind_back(kind: TransactionKind) -> ApiKind {
    match kind {
        TransactionKind::Income => ApiKind::Income,
        TransactionKind::Expense => ApiKind::Expense,
    }
}

fn map_transaction(tx: engine::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        description: tx.description,
        amount: Money::new(tx.amount_minor).to_decimal_string(),
        kind: map_kind_back(tx.kind),
        date: tx.date,
        payment_method: tx.payment_method,
        is_recurring: tx.is_recurring,
        category_id: tx.category_id,
        created_at: tx.created_at,
        updated_at: tx.updated_at,
    }
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let tx = state
        .engine
        .create_transaction(
            &user.username,
            engine::NewTransaction {
                description: payload.description,
                amount_minor: parse_amount(&payload.amount)?,
                kind: map_kind(payload.kind),
                date: payload.date,
                payment_method: payload.payment_method,
                category_id: payload.category_id,
            },
            Utc::now(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(map_transaction(tx))))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let page = state
        .engine
        .list_transactions(
            &user.username,
            engine::TransactionListFilter {
                from: query.from,
                to: query.to,
                kind: query.kind.map(map_kind),
            },
            query.page,
            query.page_size,
        )
        .await?;

    Ok(Json(TransactionListResponse {
        items: page.items.into_iter().map(map_transaction).collect(),
        page: page.page,
        page_size: page.page_size,
        total: page.total,
        total_pages: page.total_pages,
    }))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(tx_id): Path<Uuid>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    let amount_minor = match payload.amount.as_deref() {
        Some(value) => Some(parse_amount(value)?),
        None => None,
    };

    let tx = state
        .engine
        .update_transaction(
            tx_id,
            &user.username,
            engine::TransactionPatch {
                description: payload.description,
                amount_minor,
                kind: payload.kind.map(map_kind),
                date: payload.date,
                payment_method: payload.payment_method,
                category_id: payload.category_id,
            },
            Utc::now(),
        )
        .await?;

    Ok(Json(map_transaction(tx)))
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(tx_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_transaction(tx_id, &user.username)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
