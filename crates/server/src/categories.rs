//! Categories API endpoints.

use api_types::category::{
    CategoryKind as ApiKind, CategoryListResponse, CategoryNew, CategoryUpdate, CategoryView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::CategoryKind;
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn map_kind(kind: ApiKind) -> CategoryKind {
    match kind {
        ApiKind::Income => CategoryKind::Income,
        ApiKind::Expense => CategoryKind::Expense,
    }
}

fn map_kind_back(kind: CategoryKind) -> ApiKind {
    match kind {
        CategoryKind::Income => ApiKind::Income,
        CategoryKind::Expense => ApiKind::Expense,
    }
}

fn map_category(category: engine::Category) -> CategoryView {
    CategoryView {
        id: category.id,
        name: category.name,
        kind: map_kind_back(category.kind),
        icon: category.icon,
        color: category.color,
        created_at: category.created_at,
    }
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<CategoryNew>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let category = state
        .engine
        .create_category(
            &user.username,
            engine::NewCategory {
                name: payload.name,
                kind: map_kind(payload.kind),
                icon: payload.icon,
                color: payload.color,
            },
            Utc::now(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(map_category(category))))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<CategoryListResponse>, ServerError> {
    let categories = state
        .engine
        .list_categories(&user.username)
        .await?
        .into_iter()
        .map(map_category)
        .collect();

    Ok(Json(CategoryListResponse { categories }))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<CategoryUpdate>,
) -> Result<Json<CategoryView>, ServerError> {
    let category = state
        .engine
        .update_category(
            category_id,
            &user.username,
            engine::CategoryPatch {
                name: payload.name,
                kind: payload.kind.map(map_kind),
                icon: payload.icon,
                color: payload.color,
            },
        )
        .await?;

    Ok(Json(map_category(category)))
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_category(category_id, &user.username)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
