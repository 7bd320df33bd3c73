use sea_orm::DatabaseConnection;

use crate::{EngineError, ResultEngine};

mod card_expenses;
mod cards;
mod categories;
mod dashboard;
mod recurring;
mod transactions;

pub use card_expenses::{CardInvoice, ExpensePatch, MutationScope, NewCardExpense};
pub use cards::{CardPatch, NewCard};
pub use categories::{CategoryPatch, NewCategory};
pub use dashboard::DashboardSummary;
pub use recurring::{NewRecurringPlan, RecurringListFilter, RecurringPlanPatch};
pub use transactions::{NewTransaction, TransactionListFilter, TransactionPatch};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Stateless handle over the database; every operation receives the caller
/// and, where the invoice gate or materialization is involved, the current
/// instant.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// One page of a paginated listing.
#[derive(Clone, Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    fn new(items: Vec<T>, page: u64, page_size: u64, total: u64) -> Self {
        Self {
            items,
            page,
            page_size,
            total,
            total_pages: total.div_ceil(page_size).max(1),
        }
    }
}

fn page_bounds(page: Option<u64>, page_size: Option<u64>) -> (u64, u64) {
    let page = page.unwrap_or(1).max(1);
    let page_size = page_size.unwrap_or(20).clamp(1, 100);
    (page, page_size)
}

fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn ensure_positive_amount(amount_minor: i64) -> ResultEngine<()> {
    if amount_minor <= 0 {
        return Err(EngineError::Validation(
            "amount_minor must be > 0".to_string(),
        ));
    }
    Ok(())
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> Engine {
        Engine {
            database: self.database,
        }
    }
}
