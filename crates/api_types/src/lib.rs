use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod card {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CardNew {
        pub name: String,
        pub brand: String,
        pub last_four_digits: String,
        /// Decimal amount string with up to 2 fraction digits, e.g. `"800.00"`.
        pub credit_limit: String,
        /// Day of month (1–31) after which purchases roll into the next invoice.
        pub closing_day: u8,
        pub due_day: u8,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CardUpdate {
        pub name: Option<String>,
        pub brand: Option<String>,
        pub last_four_digits: Option<String>,
        pub credit_limit: Option<String>,
        pub closing_day: Option<u8>,
        pub due_day: Option<u8>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CardView {
        pub id: Uuid,
        pub name: String,
        pub brand: String,
        pub last_four_digits: String,
        pub credit_limit: String,
        pub closing_day: u8,
        pub due_day: u8,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CardListResponse {
        pub credit_cards: Vec<CardView>,
    }
}

pub mod card_expense {
    use super::*;

    /// Whether a mutation targets one installment or the whole purchase group.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ExpenseScope {
        #[default]
        Single,
        Group,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CardExpenseNew {
        pub description: String,
        /// Decimal amount string with up to 2 fraction digits.
        pub amount: String,
        pub purchase_date: NaiveDate,
        /// Defaults to 1 when absent or 0.
        pub installments: Option<u32>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CardExpenseUpdate {
        pub description: Option<String>,
        pub amount: Option<String>,
    }

    /// `?scope=single|group`, defaulting to `single`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ScopeQuery {
        pub scope: Option<ExpenseScope>,
    }

    /// `?month=YYYY-MM`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct InvoiceQuery {
        pub month: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CardExpenseView {
        pub id: Uuid,
        pub credit_card_id: Uuid,
        pub group_id: Uuid,
        pub description: String,
        pub amount: String,
        pub purchase_date: NaiveDate,
        pub installment_count: u32,
        /// 1-based position within the group.
        pub installment_no: u32,
        /// `YYYY-MM`.
        pub invoice_month: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CardExpensesResponse {
        pub expenses: Vec<CardExpenseView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CardInvoiceView {
        pub invoice_month: String,
        pub is_closed: bool,
        pub closing_day: u8,
        pub total: String,
        pub expenses: Vec<CardExpenseView>,
    }
}

pub mod recurring {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum RecurringFrequency {
        Monthly,
        Yearly,
        Custom,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum RecurringKind {
        Financing,
        Loan,
        Subscription,
        Other,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecurringNew {
        pub description: String,
        /// Decimal amount string with up to 2 fraction digits.
        pub amount: String,
        pub start_date: NaiveDate,
        pub end_date: Option<NaiveDate>,
        pub frequency: RecurringFrequency,
        /// Required (> 0) when `frequency` is `CUSTOM`.
        pub custom_interval_days: Option<u32>,
        /// 0 or absent = unbounded.
        pub total_installments: Option<u32>,
        /// Occurrences already materialized elsewhere; projection resumes
        /// past this prefix.
        pub current_installment: Option<u32>,
        pub kind: RecurringKind,
        pub category_id: Option<Uuid>,
    }

    /// Partial update. For nullable fields, an absent key leaves the value
    /// unchanged while an explicit `null` clears it.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct RecurringUpdate {
        pub description: Option<String>,
        pub amount: Option<String>,
        pub start_date: Option<NaiveDate>,
        #[serde(default)]
        pub end_date: Option<Option<NaiveDate>>,
        pub frequency: Option<RecurringFrequency>,
        #[serde(default)]
        pub custom_interval_days: Option<Option<u32>>,
        pub total_installments: Option<u32>,
        pub current_installment: Option<u32>,
        pub kind: Option<RecurringKind>,
        #[serde(default)]
        pub category_id: Option<Option<Uuid>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecurringView {
        pub id: Uuid,
        pub description: String,
        pub amount: String,
        pub start_date: NaiveDate,
        pub end_date: Option<NaiveDate>,
        pub frequency: RecurringFrequency,
        pub custom_interval_days: Option<u32>,
        pub total_installments: u32,
        pub current_installment: u32,
        pub kind: RecurringKind,
        pub category_id: Option<Uuid>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct RecurringListQuery {
        pub page: Option<u64>,
        pub page_size: Option<u64>,
        pub start_date: Option<NaiveDate>,
        pub end_date: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecurringListResponse {
        pub items: Vec<RecurringView>,
        pub page: u64,
        pub page_size: u64,
        pub total: u64,
        pub total_pages: u64,
    }

    /// Inclusive window for occurrence projection; both bounds optional.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct OccurrencesQuery {
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OccurrencesResponse {
        pub occurrences: Vec<NaiveDate>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum TransactionKind {
        Income,
        Expense,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub description: String,
        /// Decimal amount string with up to 2 fraction digits.
        pub amount: String,
        pub kind: TransactionKind,
        pub date: NaiveDate,
        pub payment_method: Option<String>,
        pub category_id: Option<Uuid>,
    }

    /// Partial update. For nullable fields, an absent key leaves the value
    /// unchanged while an explicit `null` clears it.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub description: Option<String>,
        pub amount: Option<String>,
        pub kind: Option<TransactionKind>,
        pub date: Option<NaiveDate>,
        #[serde(default)]
        pub payment_method: Option<Option<String>>,
        #[serde(default)]
        pub category_id: Option<Option<Uuid>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub description: String,
        pub amount: String,
        pub kind: TransactionKind,
        pub date: NaiveDate,
        pub payment_method: Option<String>,
        pub is_recurring: bool,
        pub category_id: Option<Uuid>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionListQuery {
        pub page: Option<u64>,
        pub page_size: Option<u64>,
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
        pub kind: Option<TransactionKind>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub items: Vec<TransactionView>,
        pub page: u64,
        pub page_size: u64,
        pub total: u64,
        pub total_pages: u64,
    }
}

pub mod category {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum CategoryKind {
        Income,
        Expense,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
        pub kind: CategoryKind,
        pub icon: Option<String>,
        pub color: Option<String>,
    }

    /// Partial update. For nullable fields, an absent key leaves the value
    /// unchanged while an explicit `null` clears it.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        pub name: Option<String>,
        pub kind: Option<CategoryKind>,
        #[serde(default)]
        pub icon: Option<Option<String>>,
        #[serde(default)]
        pub color: Option<Option<String>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub name: String,
        pub kind: CategoryKind,
        pub icon: Option<String>,
        pub color: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryListResponse {
        pub categories: Vec<CategoryView>,
    }
}

pub mod dashboard {
    use super::*;

    /// Inclusive date range; both bounds optional.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct SummaryQuery {
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DashboardSummaryView {
        pub balance: String,
        pub total_income: String,
        pub total_expense: String,
    }
}
