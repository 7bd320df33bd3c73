//! Recurring expense API endpoints.

use api_types::recurring::{
    OccurrencesQuery, OccurrencesResponse, RecurringFrequency, RecurringKind, RecurringListQuery,
    RecurringListResponse, RecurringNew, RecurringUpdate, RecurringView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{NaiveDate, Utc};
use engine::{DateWindow, Frequency, Money, PlanKind};
use uuid::Uuid;

use crate::{ServerError, parse_amount, server::ServerState, user};

fn map_frequency(frequency: RecurringFrequency) -> Frequency {
    match frequency {
        RecurringFrequency::Monthly => Frequency::Monthly,
        RecurringFrequency::Yearly => Frequency::Yearly,
        RecurringFrequency::Custom => Frequency::Custom,
    }
}

fn map_frequency_back(frequency: Frequency) -> RecurringFrequency {
    match frequency {
        Frequency::Monthly => RecurringFrequency::Monthly,
        Frequency::Yearly => RecurringFrequency::Yearly,
        Frequency::Custom => RecurringFrequency::Custom,
    }
}

fn map_kind(kind: RecurringKind) -> PlanKind {
    match kind {
        RecurringKind::Financing => PlanKind::Financing,
        RecurringKind::Loan => PlanKind::Loan,
        RecurringKind::Subscription => PlanKind::Subscription,
        RecurringKind::Other => PlanKind::Other,
    }
}

fn map_kind_back(kind: PlanKind) -> RecurringKind {
    match kind {
        PlanKind::Financing => RecurringKind::Financing,
        PlanKind::Loan => RecurringKind::Loan,
        PlanKind::Subscription => RecurringKind::Subscription,
        PlanKind::Other => RecurringKind::Other,
    }
}

fn map_plan(plan: engine::RecurringPlan) -> RecurringView {
    RecurringView {
        id: plan.id,
        description: plan.description,
        amount: Money::new(plan.amount_minor).to_decimal_string(),
        start_date: plan.start_date,
        end_date: plan.end_date,
        frequency: map_frequency_back(plan.frequency),
        custom_interval_days: plan.custom_interval_days,
        total_installments: plan.total_installments,
        current_installment: plan.current_installment,
        kind: map_kind_back(plan.kind),
        category_id: plan.category_id,
        created_at: plan.created_at,
        updated_at: plan.updated_at,
    }
}

fn window_from_bounds(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Option<DateWindow>, ServerError> {
    match (from, to) {
        (Some(from), Some(to)) => Ok(Some(DateWindow { from, to })),
        (None, None) => Ok(None),
        _ => Err(ServerError::Generic(
            "from and to must be provided together".to_string(),
        )),
    }
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<RecurringNew>,
) -> Result<(StatusCode, Json<RecurringView>), ServerError> {
    let plan = state
        .engine
        .create_recurring_plan(
            &user.username,
            engine::NewRecurringPlan {
                description: payload.description,
                amount_minor: parse_amount(&payload.amount)?,
                start_date: payload.start_date,
                end_date: payload.end_date,
                frequency: map_frequency(payload.frequency),
                custom_interval_days: payload.custom_interval_days,
                total_installments: payload.total_installments.unwrap_or(0),
                current_installment: payload.current_installment,
                kind: map_kind(payload.kind),
                category_id: payload.category_id,
            },
            Utc::now(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(map_plan(plan))))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<RecurringListQuery>,
) -> Result<Json<RecurringListResponse>, ServerError> {
    let page = state
        .engine
        .list_recurring_plans(
            &user.username,
            engine::RecurringListFilter {
                start_date: query.start_date,
                end_date: query.end_date,
            },
            query.page,
            query.page_size,
        )
        .await?;

    Ok(Json(RecurringListResponse {
        items: page.items.into_iter().map(map_plan).collect(),
        page: page.page,
        page_size: page.page_size,
        total: page.total,
        total_pages: page.total_pages,
    }))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(plan_id): Path<Uuid>,
) -> Result<Json<RecurringView>, ServerError> {
    let plan = state.engine.recurring_plan(plan_id, &user.username).await?;
    Ok(Json(map_plan(plan)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(plan_id): Path<Uuid>,
    Json(payload): Json<RecurringUpdate>,
) -> Result<Json<RecurringView>, ServerError> {
    let amount_minor = match payload.amount.as_deref() {
        Some(value) => Some(parse_amount(value)?),
        None => None,
    };

    let plan = state
        .engine
        .update_recurring_plan(
            plan_id,
            &user.username,
            engine::RecurringPlanPatch {
                description: payload.description,
                amount_minor,
                start_date: payload.start_date,
                end_date: payload.end_date,
                frequency: payload.frequency.map(map_frequency),
                custom_interval_days: payload.custom_interval_days,
                total_installments: payload.total_installments,
                current_installment: payload.current_installment,
                kind: payload.kind.map(map_kind),
                category_id: payload.category_id,
            },
            Utc::now(),
        )
        .await?;

    Ok(Json(map_plan(plan)))
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(plan_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_recurring_plan(plan_id, &user.username)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn occurrences(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(plan_id): Path<Uuid>,
    Query(query): Query<OccurrencesQuery>,
) -> Result<Json<OccurrencesResponse>, ServerError> {
    let window = window_from_bounds(query.from, query.to)?;

    let occurrences = state
        .engine
        .plan_occurrences(plan_id, &user.username, window)
        .await?;

    Ok(Json(OccurrencesResponse { occurrences }))
}
