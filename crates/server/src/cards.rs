//! Credit card API endpoints.

use api_types::card::{CardListResponse, CardNew, CardUpdate, CardView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::Money;
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn map_card(card: engine::CreditCard) -> CardView {
    CardView {
        id: card.id,
        name: card.name,
        brand: card.brand,
        last_four_digits: card.last_four_digits,
        credit_limit: Money::new(card.credit_limit_minor).to_decimal_string(),
        closing_day: card.closing_day,
        due_day: card.due_day,
        created_at: card.created_at,
        updated_at: card.updated_at,
    }
}

/// Credit limits may legitimately be zero, so they skip the positive-amount
/// rule applied to purchases.
fn parse_credit_limit(value: &str) -> Result<i64, ServerError> {
    let limit: Money = value.parse()?;
    Ok(limit.minor())
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<CardNew>,
) -> Result<(StatusCode, Json<CardView>), ServerError> {
    let card = state
        .engine
        .create_card(
            &user.username,
            engine::NewCard {
                name: payload.name,
                brand: payload.brand,
                last_four_digits: payload.last_four_digits,
                credit_limit_minor: parse_credit_limit(&payload.credit_limit)?,
                closing_day: payload.closing_day,
                due_day: payload.due_day,
            },
            Utc::now(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(map_card(card))))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<CardListResponse>, ServerError> {
    let credit_cards = state
        .engine
        .list_cards(&user.username)
        .await?
        .into_iter()
        .map(map_card)
        .collect();

    Ok(Json(CardListResponse { credit_cards }))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(card_id): Path<Uuid>,
) -> Result<Json<CardView>, ServerError> {
    let card = state.engine.card(card_id, &user.username).await?;
    Ok(Json(map_card(card)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(card_id): Path<Uuid>,
    Json(payload): Json<CardUpdate>,
) -> Result<Json<CardView>, ServerError> {
    let credit_limit_minor = match payload.credit_limit.as_deref() {
        Some(value) => Some(parse_credit_limit(value)?),
        None => None,
    };

    let card = state
        .engine
        .update_card(
            card_id,
            &user.username,
            engine::CardPatch {
                name: payload.name,
                brand: payload.brand,
                last_four_digits: payload.last_four_digits,
                credit_limit_minor,
                closing_day: payload.closing_day,
                due_day: payload.due_day,
            },
            Utc::now(),
        )
        .await?;

    Ok(Json(map_card(card)))
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(card_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_card(card_id, &user.username).await?;
    Ok(StatusCode::NO_CONTENT)
}
