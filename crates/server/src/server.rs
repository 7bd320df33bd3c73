use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{card_expenses, cards, categories, dashboard, recurring, transactions, user};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

async fn auth(
    auth_header: TypedHeader<Authorization<Basic>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user: Option<user::Model> = user::Entity::find()
        .filter(user::Column::Username.eq(auth_header.username()))
        .filter(user::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let Some(user) = user else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Builds the authenticated API router over an engine and its database.
pub fn router(engine: Engine, db: DatabaseConnection) -> Router {
    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };
    router_with_state(state)
}

fn router_with_state(state: ServerState) -> Router {
    Router::new()
        .route("/credit-cards", post(cards::create).get(cards::list))
        .route(
            "/credit-cards/{id}",
            get(cards::get).put(cards::update).delete(cards::remove),
        )
        .route(
            "/credit-cards/{id}/expenses",
            post(card_expenses::create).get(card_expenses::list),
        )
        .route(
            "/credit-cards/{card_id}/expenses/{expense_id}",
            axum::routing::put(card_expenses::update).delete(card_expenses::remove),
        )
        .route("/credit-cards/{id}/invoice", get(card_expenses::invoice))
        .route(
            "/recurring-expenses",
            post(recurring::create).get(recurring::list),
        )
        .route(
            "/recurring-expenses/{id}",
            get(recurring::get)
                .put(recurring::update)
                .delete(recurring::remove),
        )
        .route(
            "/recurring-expenses/{id}/occurrences",
            get(recurring::occurrences),
        )
        .route(
            "/transactions",
            post(transactions::create).get(transactions::list),
        )
        .route(
            "/transactions/{id}",
            axum::routing::put(transactions::update).delete(transactions::remove),
        )
        .route(
            "/categories",
            post(categories::create).get(categories::list),
        )
        .route(
            "/categories/{id}",
            axum::routing::put(categories::update).delete(categories::remove),
        )
        .route("/dashboard/summary", get(dashboard::summary))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine, db: DatabaseConnection) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(engine, db)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
