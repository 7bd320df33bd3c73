//! Initial schema migration - creates all tables from scratch.
//!
//! - `users`: authentication
//! - `categories`: income/expense labels per user
//! - `credit_cards`: billing attributes (closing day, due day, limit)
//! - `card_expenses`: one row per purchase installment, keyed to an invoice month
//! - `recurring_expenses`: recurring expense plans
//! - `transactions`: dated income/expense rows, some materialized from plans

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Username,
    Password,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    UserId,
    Name,
    Kind,
    Icon,
    Color,
    CreatedAt,
}

#[derive(Iden)]
enum CreditCards {
    Table,
    Id,
    UserId,
    Name,
    Brand,
    LastFourDigits,
    CreditLimitMinor,
    ClosingDay,
    DueDay,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum CardExpenses {
    Table,
    Id,
    CreditCardId,
    UserId,
    GroupId,
    Description,
    AmountMinor,
    PurchaseDate,
    InstallmentCount,
    InstallmentNo,
    InvoiceMonth,
    CreatedAt,
}

#[derive(Iden)]
enum RecurringExpenses {
    Table,
    Id,
    UserId,
    Description,
    AmountMinor,
    StartDate,
    EndDate,
    Frequency,
    CustomIntervalDays,
    TotalInstallments,
    CurrentInstallment,
    Kind,
    CategoryId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    UserId,
    Description,
    AmountMinor,
    Kind,
    Date,
    PaymentMethod,
    IsRecurring,
    CategoryId,
    CreatedAt,
    UpdatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Categories
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::UserId).string().not_null())
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::Kind).string().not_null())
                    .col(ColumnDef::new(Categories::Icon).string())
                    .col(ColumnDef::new(Categories::Color).string())
                    .col(
                        ColumnDef::new(Categories::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-categories-user_id")
                            .from(Categories::Table, Categories::UserId)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-user_id-name-unique")
                    .table(Categories::Table)
                    .col(Categories::UserId)
                    .col(Categories::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Credit Cards
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(CreditCards::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CreditCards::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CreditCards::UserId).string().not_null())
                    .col(ColumnDef::new(CreditCards::Name).string().not_null())
                    .col(ColumnDef::new(CreditCards::Brand).string().not_null())
                    .col(
                        ColumnDef::new(CreditCards::LastFourDigits)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CreditCards::CreditLimitMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CreditCards::ClosingDay).integer().not_null())
                    .col(ColumnDef::new(CreditCards::DueDay).integer().not_null())
                    .col(
                        ColumnDef::new(CreditCards::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CreditCards::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-credit_cards-user_id")
                            .from(CreditCards::Table, CreditCards::UserId)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-credit_cards-user_id")
                    .table(CreditCards::Table)
                    .col(CreditCards::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Card Expenses (installment rows)
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(CardExpenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CardExpenses::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CardExpenses::CreditCardId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CardExpenses::UserId).string().not_null())
                    .col(ColumnDef::new(CardExpenses::GroupId).string().not_null())
                    .col(
                        ColumnDef::new(CardExpenses::Description)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CardExpenses::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CardExpenses::PurchaseDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CardExpenses::InstallmentCount)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(CardExpenses::InstallmentNo)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(CardExpenses::InvoiceMonth)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CardExpenses::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-card_expenses-credit_card_id")
                            .from(CardExpenses::Table, CardExpenses::CreditCardId)
                            .to(CreditCards::Table, CreditCards::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-card_expenses-user_id")
                            .from(CardExpenses::Table, CardExpenses::UserId)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-card_expenses-card-invoice_month")
                    .table(CardExpenses::Table)
                    .col(CardExpenses::CreditCardId)
                    .col(CardExpenses::InvoiceMonth)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-card_expenses-group_id")
                    .table(CardExpenses::Table)
                    .col(CardExpenses::GroupId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Recurring Expenses
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(RecurringExpenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RecurringExpenses::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RecurringExpenses::UserId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurringExpenses::Description)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurringExpenses::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurringExpenses::StartDate)
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RecurringExpenses::EndDate).date())
                    .col(
                        ColumnDef::new(RecurringExpenses::Frequency)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurringExpenses::CustomIntervalDays).integer(),
                    )
                    .col(
                        ColumnDef::new(RecurringExpenses::TotalInstallments)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(RecurringExpenses::CurrentInstallment)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(RecurringExpenses::Kind).string().not_null())
                    .col(ColumnDef::new(RecurringExpenses::CategoryId).string())
                    .col(
                        ColumnDef::new(RecurringExpenses::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurringExpenses::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-recurring_expenses-user_id")
                            .from(RecurringExpenses::Table, RecurringExpenses::UserId)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-recurring_expenses-category_id")
                            .from(RecurringExpenses::Table, RecurringExpenses::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-recurring_expenses-user_id-start_date")
                    .table(RecurringExpenses::Table)
                    .col(RecurringExpenses::UserId)
                    .col(RecurringExpenses::StartDate)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::UserId).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::Description)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(ColumnDef::new(Transactions::Date).date().not_null())
                    .col(ColumnDef::new(Transactions::PaymentMethod).string())
                    .col(
                        ColumnDef::new(Transactions::IsRecurring)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Transactions::CategoryId).string())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-user_id")
                            .from(Transactions::Table, Transactions::UserId)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-category_id")
                            .from(Transactions::Table, Transactions::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-user_id-date")
                    .table(Transactions::Table)
                    .col(Transactions::UserId)
                    .col(Transactions::Date)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecurringExpenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CardExpenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CreditCards::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
