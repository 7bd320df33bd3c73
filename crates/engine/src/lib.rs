//! Core domain of the finance tracker: credit-card invoice allocation, the
//! open/closed invoice gate, recurring occurrence projection, and the
//! database-backed operations around them.
//!
//! The three calculations are pure functions over plain values; persistence
//! and the current instant are supplied by the caller on every operation.

pub use cards::CreditCard;
pub use card_expenses::CardExpense;
pub use categories::{Category, CategoryKind};
pub use error::EngineError;
pub use invoices::{
    CardPurchase, InvoiceMonth, allocate_installments, ensure_invoice_open, is_invoice_closed,
};
pub use money::Money;
pub use ops::{
    CardInvoice, CardPatch, CategoryPatch, DashboardSummary, Engine, EngineBuilder, ExpensePatch,
    MutationScope, NewCard, NewCardExpense, NewCategory, NewRecurringPlan, NewTransaction, Page,
    RecurringListFilter, RecurringPlanPatch, TransactionListFilter, TransactionPatch,
};
pub use recurring::{DateWindow, Frequency, PlanKind, RecurringPlan, project};
pub use transactions::{RECURRING_PAYMENT_METHOD, Transaction, TransactionKind};

mod card_expenses;
mod cards;
mod categories;
mod error;
mod invoices;
mod money;
mod ops;
mod recurring;
mod transactions;

type ResultEngine<T> = Result<T, EngineError>;
