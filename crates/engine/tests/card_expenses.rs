use chrono::{NaiveDate, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    Engine, EngineError, ExpensePatch, MutationScope, NewCard, NewCardExpense,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for username in ["alice", "bob"] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password) VALUES (?, ?)",
            vec![username.into(), "password".into()],
        ))
        .await
        .unwrap();
    }
    let engine = Engine::builder().database(db.clone()).build();
    (engine, db)
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn new_card(closing_day: u8) -> NewCard {
    NewCard {
        name: "Nubank".to_string(),
        brand: "Mastercard".to_string(),
        last_four_digits: "4242".to_string(),
        credit_limit_minor: 800_000,
        closing_day,
        due_day: 17,
    }
}

fn purchase_in_three() -> NewCardExpense {
    NewCardExpense {
        description: "Notebook".to_string(),
        amount_minor: 30000,
        purchase_date: date(2025, 1, 15),
        installments: Some(3),
    }
}

#[tokio::test]
async fn purchase_fans_out_into_consecutive_invoices() {
    let (engine, _db) = engine_with_db().await;
    let now = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();

    let card = engine.create_card("alice", new_card(10), now).await.unwrap();
    let rows = engine
        .create_card_expense(card.id, "alice", purchase_in_three(), now)
        .await
        .unwrap();

    let months: Vec<String> = rows.iter().map(|r| r.invoice_month.to_string()).collect();
    assert_eq!(months, ["2025-02", "2025-03", "2025-04"]);
    assert!(rows.iter().all(|r| r.amount_minor == 30000));
    assert!(rows.iter().all(|r| r.group_id == rows[0].group_id));

    let listed = engine.list_card_expenses(card.id, "alice").await.unwrap();
    assert_eq!(listed.len(), 3);
}

#[tokio::test]
async fn group_update_is_rejected_whole_when_one_invoice_is_closed() {
    let (engine, _db) = engine_with_db().await;
    let created = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();

    let card = engine.create_card("alice", new_card(10), created).await.unwrap();
    let rows = engine
        .create_card_expense(card.id, "alice", purchase_in_three(), created)
        .await
        .unwrap();

    // 2025-03-05: the February invoice closed on Feb 10; March and April are
    // still open.
    let now = Utc.with_ymd_and_hms(2025, 3, 5, 12, 0, 0).unwrap();
    let open_installment = rows
        .iter()
        .find(|r| r.invoice_month.to_string() == "2025-03")
        .unwrap();

    let err = engine
        .update_card_expense(
            card.id,
            open_installment.id,
            "alice",
            ExpensePatch {
                description: Some("Notebook gamer".to_string()),
                amount_minor: Some(35000),
            },
            MutationScope::Group,
            now,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    // Nothing changed, not even the rows whose own invoices were open.
    let listed = engine.list_card_expenses(card.id, "alice").await.unwrap();
    assert!(listed.iter().all(|r| r.description == "Notebook"));
    assert!(listed.iter().all(|r| r.amount_minor == 30000));
}

#[tokio::test]
async fn single_scope_gates_only_the_target_invoice() {
    let (engine, _db) = engine_with_db().await;
    let created = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();

    let card = engine.create_card("alice", new_card(10), created).await.unwrap();
    let rows = engine
        .create_card_expense(card.id, "alice", purchase_in_three(), created)
        .await
        .unwrap();
    let now = Utc.with_ymd_and_hms(2025, 3, 5, 12, 0, 0).unwrap();

    let closed_installment = rows
        .iter()
        .find(|r| r.invoice_month.to_string() == "2025-02")
        .unwrap();
    let open_installment = rows
        .iter()
        .find(|r| r.invoice_month.to_string() == "2025-03")
        .unwrap();

    let err = engine
        .update_card_expense(
            card.id,
            closed_installment.id,
            "alice",
            ExpensePatch {
                description: None,
                amount_minor: Some(35000),
            },
            MutationScope::Single,
            now,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    let updated = engine
        .update_card_expense(
            card.id,
            open_installment.id,
            "alice",
            ExpensePatch {
                description: None,
                amount_minor: Some(35000),
            },
            MutationScope::Single,
            now,
        )
        .await
        .unwrap();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].amount_minor, 35000);

    let listed = engine.list_card_expenses(card.id, "alice").await.unwrap();
    let untouched = listed
        .iter()
        .filter(|r| r.amount_minor == 30000)
        .count();
    assert_eq!(untouched, 2);
}

#[tokio::test]
async fn group_removal_deletes_every_installment_while_open() {
    let (engine, _db) = engine_with_db().await;
    let created = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();

    let card = engine.create_card("alice", new_card(10), created).await.unwrap();
    let rows = engine
        .create_card_expense(card.id, "alice", purchase_in_three(), created)
        .await
        .unwrap();

    // Before any invoice closes, the whole group can go.
    let now = Utc.with_ymd_and_hms(2025, 1, 20, 12, 0, 0).unwrap();
    engine
        .remove_card_expense(card.id, rows[0].id, "alice", MutationScope::Group, now)
        .await
        .unwrap();

    let listed = engine.list_card_expenses(card.id, "alice").await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn group_removal_is_rejected_once_an_invoice_closed() {
    let (engine, _db) = engine_with_db().await;
    let created = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();

    let card = engine.create_card("alice", new_card(10), created).await.unwrap();
    let rows = engine
        .create_card_expense(card.id, "alice", purchase_in_three(), created)
        .await
        .unwrap();

    let now = Utc.with_ymd_and_hms(2025, 3, 5, 12, 0, 0).unwrap();
    let err = engine
        .remove_card_expense(card.id, rows[2].id, "alice", MutationScope::Group, now)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    let listed = engine.list_card_expenses(card.id, "alice").await.unwrap();
    assert_eq!(listed.len(), 3);
}

#[tokio::test]
async fn invoice_reports_rows_total_and_state() {
    let (engine, _db) = engine_with_db().await;
    let created = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();

    let card = engine.create_card("alice", new_card(10), created).await.unwrap();
    engine
        .create_card_expense(card.id, "alice", purchase_in_three(), created)
        .await
        .unwrap();
    engine
        .create_card_expense(
            card.id,
            "alice",
            NewCardExpense {
                description: "Mercado".to_string(),
                amount_minor: 12050,
                purchase_date: date(2025, 1, 20),
                installments: None,
            },
            created,
        )
        .await
        .unwrap();

    let now = Utc.with_ymd_and_hms(2025, 1, 25, 12, 0, 0).unwrap();
    let invoice = engine
        .card_invoice(card.id, "alice", "2025-02".parse().unwrap(), now)
        .await
        .unwrap();

    // First installment of the purchase plus the single-installment expense.
    assert_eq!(invoice.expenses.len(), 2);
    assert_eq!(invoice.total_minor, 30000 + 12050);
    assert_eq!(invoice.closing_day, 10);
    assert!(!invoice.is_closed);

    let later = Utc.with_ymd_and_hms(2025, 2, 11, 0, 0, 0).unwrap();
    let closed = engine
        .card_invoice(card.id, "alice", "2025-02".parse().unwrap(), later)
        .await
        .unwrap();
    assert!(closed.is_closed);
}

#[tokio::test]
async fn cards_are_scoped_to_their_owner() {
    let (engine, _db) = engine_with_db().await;
    let now = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();

    let card = engine.create_card("alice", new_card(10), now).await.unwrap();

    let err = engine.card(card.id, "bob").await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    let err = engine
        .create_card_expense(card.id, "bob", purchase_in_three(), now)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    let err = engine.card(Uuid::new_v4(), "alice").await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}
