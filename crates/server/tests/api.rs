use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::Engine as _;
use http_body_util::BodyExt;
use sea_orm::{ConnectionTrait, Database, Statement};
use serde_json::{Value, json};
use tower::ServiceExt;

use migration::MigratorTrait;

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password) VALUES (?, ?)",
        vec!["alice".into(), "password".into()],
    ))
    .await
    .unwrap();

    let engine = engine::Engine::builder().database(db.clone()).build();
    server::router(engine, db)
}

fn basic_auth() -> String {
    let token = base64::engine::general_purpose::STANDARD.encode("alice:password");
    format!("Basic {token}")
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, basic_auth());

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create_card(app: &Router, closing_day: u8) -> String {
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/credit-cards",
            Some(json!({
                "name": "Nubank",
                "brand": "Mastercard",
                "last_four_digits": "4242",
                "credit_limit": "800.00",
                "closing_day": closing_day,
                "due_day": 17,
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn requests_without_credentials_are_unauthorized() {
    let app = app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/credit-cards")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn purchase_creates_installments_and_invoice_totals_them() {
    let app = app().await;
    let card_id = create_card(&app, 10).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/credit-cards/{card_id}/expenses"),
            Some(json!({
                "description": "Notebook",
                "amount": "300.00",
                "purchase_date": "2020-01-15",
                "installments": 3,
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    let months: Vec<&str> = body["expenses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["invoice_month"].as_str().unwrap())
        .collect();
    assert_eq!(months, ["2020-02", "2020-03", "2020-04"]);
    assert!(
        body["expenses"]
            .as_array()
            .unwrap()
            .iter()
            .all(|e| e["amount"] == "300.00")
    );

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/credit-cards/{card_id}/invoice?month=2020-02"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let invoice = json_body(response).await;
    assert_eq!(invoice["invoice_month"], "2020-02");
    assert_eq!(invoice["total"], "300.00");
    assert_eq!(invoice["closing_day"], 10);
    assert_eq!(invoice["is_closed"], true);
}

#[tokio::test]
async fn mutating_a_closed_invoice_returns_conflict_envelope() {
    let app = app().await;
    let card_id = create_card(&app, 10).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/credit-cards/{card_id}/expenses"),
            Some(json!({
                "description": "Notebook",
                "amount": "300.00",
                "purchase_date": "2020-01-15",
                "installments": 3,
            })),
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    let expense_id = body["expenses"][0]["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/credit-cards/{card_id}/expenses/{expense_id}?scope=group"),
            Some(json!({ "amount": "350.00" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let error = json_body(response).await;
    assert_eq!(error["status"], "fail");
    assert_eq!(
        error["message"],
        "Fatura fechada. Esta despesa não pode mais ser alterada."
    );
    assert!(error["details"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn open_invoice_expenses_can_be_edited_and_removed() {
    let app = app().await;
    // Closing day 1: today's purchases always land on an open invoice.
    let card_id = create_card(&app, 1).await;
    let today = chrono::Utc::now().date_naive();

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/credit-cards/{card_id}/expenses"),
            Some(json!({
                "description": "Mercado",
                "amount": "120.50",
                "purchase_date": today.to_string(),
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    let expense_id = body["expenses"][0]["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/credit-cards/{card_id}/expenses/{expense_id}"),
            Some(json!({ "description": "Mercado do mês" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["expenses"][0]["description"], "Mercado do mês");

    let response = app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/credit-cards/{card_id}/expenses/{expense_id}"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn malformed_month_and_amount_are_bad_requests() {
    let app = app().await;
    let card_id = create_card(&app, 10).await;

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/credit-cards/{card_id}/invoice?month=2025-13"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/credit-cards/{card_id}/expenses"),
            Some(json!({
                "description": "Mercado",
                "amount": "10.123",
                "purchase_date": "2025-01-15",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_card_is_not_found() {
    let app = app().await;

    let response = app
        .oneshot(request(
            "GET",
            "/credit-cards/00000000-0000-0000-0000-000000000000",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let error = json_body(response).await;
    assert_eq!(error["status"], "fail");
}

#[tokio::test]
async fn recurring_plan_materializes_transactions_over_http() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/categories",
            Some(json!({ "name": "Transporte", "kind": "EXPENSE" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let category = json_body(response).await;
    let category_id = category["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/recurring-expenses",
            Some(json!({
                "description": "Financiamento do carro",
                "amount": "850.00",
                "start_date": "2025-01-10",
                "frequency": "MONTHLY",
                "total_installments": 12,
                "kind": "FINANCING",
                "category_id": category_id,
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let plan = json_body(response).await;
    let plan_id = plan["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(request("GET", "/transactions?page_size=100", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["total"], 12);
    assert!(
        body["items"]
            .as_array()
            .unwrap()
            .iter()
            .all(|tx| tx["payment_method"] == "Recorrente" && tx["is_recurring"] == true)
    );

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/recurring-expenses/{plan_id}/occurrences?from=2025-03-01&to=2025-03-31"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["occurrences"], json!(["2025-03-10"]));
}

#[tokio::test]
async fn custom_frequency_without_interval_is_rejected_over_http() {
    let app = app().await;

    let response = app
        .oneshot(request(
            "POST",
            "/recurring-expenses",
            Some(json!({
                "description": "Assinatura",
                "amount": "19.90",
                "start_date": "2025-01-10",
                "frequency": "CUSTOM",
                "kind": "SUBSCRIPTION",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error = json_body(response).await;
    assert_eq!(error["status"], "fail");
}

#[tokio::test]
async fn dashboard_summarizes_income_and_expenses() {
    let app = app().await;

    for (description, amount, kind) in [
        ("Salário", "5000.00", "INCOME"),
        ("Aluguel", "1500.00", "EXPENSE"),
        ("Mercado", "800.50", "EXPENSE"),
    ] {
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/transactions",
                Some(json!({
                    "description": description,
                    "amount": amount,
                    "kind": kind,
                    "date": "2025-06-15",
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            "/dashboard/summary?from=2025-06-01&to=2025-06-30",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["total_income"], "5000.00");
    assert_eq!(body["total_expense"], "2300.50");
    assert_eq!(body["balance"], "2699.50");

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            "/dashboard/summary?from=2030-01-01&to=2030-12-31",
            None,
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["balance"], "0.00");
}
