//! Invoice month arithmetic for card purchases.
//!
//! A purchase belongs to the invoice of its own calendar month while its day
//! is on or before the card's closing day; past the closing day it rolls into
//! the next month. Multi-installment purchases fan out into one row per
//! installment, one invoice month apart.
//!
//! An invoice closes automatically and irreversibly once "now" passes its
//! closing instant; there is no stored state, the decision is recomputed from
//! `(closing_day, invoice_month, now)` on every call.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, card_expenses::CardExpense};

/// A `YYYY-MM` billing period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InvoiceMonth {
    year: i32,
    month: u32,
}

impl InvoiceMonth {
    pub fn new(year: i32, month: u32) -> ResultEngine<Self> {
        if !(1..=9999).contains(&year) || !(1..=12).contains(&month) {
            return Err(EngineError::Validation(format!(
                "invalid invoice month: {year:04}-{month:02}"
            )));
        }
        Ok(Self { year, month })
    }

    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// The invoice month a purchase belongs to.
    ///
    /// On the closing day itself the purchase still belongs to the current
    /// month; one day later it rolls into the next month.
    #[must_use]
    pub fn for_purchase(purchase_date: NaiveDate, closing_day: u8) -> Self {
        let base = Self {
            year: purchase_date.year(),
            month: purchase_date.month(),
        };
        if purchase_date.day() > u32::from(closing_day) {
            base.plus_months(1)
        } else {
            base
        }
    }

    /// Advances by whole calendar months, rolling over year boundaries.
    #[must_use]
    pub fn plus_months(self, months: u32) -> Self {
        let zero_based = self.month - 1 + months;
        Self {
            year: self.year + (zero_based / 12) as i32,
            month: zero_based % 12 + 1,
        }
    }

    /// Number of days in this month.
    #[must_use]
    pub fn days(self) -> u32 {
        match self.month {
            2 => {
                let leap = (self.year % 4 == 0 && self.year % 100 != 0) || self.year % 400 == 0;
                if leap { 29 } else { 28 }
            }
            4 | 6 | 9 | 11 => 30,
            _ => 31,
        }
    }

    /// Last instant at which this invoice is still open: the card's closing
    /// day (clamped to the month's length, so closing day 31 in February
    /// resolves to the 28th/29th) at `23:59:59.999` UTC.
    #[must_use]
    pub fn closing_instant(self, closing_day: u8) -> DateTime<Utc> {
        let day = u32::from(closing_day).clamp(1, self.days());
        // year and month are range-checked at construction, day is clamped
        // to the month's length, so the chained lookups cannot fail.
        NaiveDate::from_ymd_opt(self.year, self.month, day)
            .and_then(|date| date.and_hms_milli_opt(23, 59, 59, 999))
            .unwrap_or_default()
            .and_utc()
    }
}

impl fmt::Display for InvoiceMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for InvoiceMonth {
    type Err = EngineError;

    /// Parses the `YYYY-MM` wire shape (four digits, dash, two digits).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::Validation(format!("invalid invoice month: {s}"));

        let (year_str, month_str) = s.split_once('-').ok_or_else(invalid)?;
        if year_str.len() != 4
            || month_str.len() != 2
            || !year_str.chars().all(|c| c.is_ascii_digit())
            || !month_str.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let year: i32 = year_str.parse().map_err(|_| invalid())?;
        let month: u32 = month_str.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

/// Immutable facts about a card purchase, before installment fan-out.
#[derive(Clone, Debug)]
pub struct CardPurchase {
    pub description: String,
    pub amount_minor: i64,
    pub purchase_date: NaiveDate,
    /// Number of installments; 0 is treated as 1.
    pub installments: u32,
}

/// Fans a purchase out into its installment rows.
///
/// All rows share one freshly generated group id; installment numbers are
/// 1-based and invoice months are consecutive starting at the purchase's base
/// month. Every row carries the **full** purchase amount: amounts are never
/// split across installments.
#[must_use]
pub fn allocate_installments(
    card_id: Uuid,
    user_id: &str,
    purchase: &CardPurchase,
    closing_day: u8,
    created_at: DateTime<Utc>,
) -> Vec<CardExpense> {
    let installments = purchase.installments.max(1);
    let group_id = Uuid::new_v4();
    let base = InvoiceMonth::for_purchase(purchase.purchase_date, closing_day);

    (1..=installments)
        .map(|installment_no| CardExpense {
            id: Uuid::new_v4(),
            credit_card_id: card_id,
            user_id: user_id.to_string(),
            group_id,
            description: purchase.description.clone(),
            amount_minor: purchase.amount_minor,
            purchase_date: purchase.purchase_date,
            installment_count: installments,
            installment_no,
            invoice_month: base.plus_months(installment_no - 1),
            created_at,
        })
        .collect()
}

/// Returns `true` when `now` is strictly past the invoice's closing instant.
#[must_use]
pub fn is_invoice_closed(closing_day: u8, invoice_month: InvoiceMonth, now: DateTime<Utc>) -> bool {
    now > invoice_month.closing_instant(closing_day)
}

/// Gate for installment mutations: fails with a conflict once the invoice has
/// closed.
pub fn ensure_invoice_open(
    closing_day: u8,
    invoice_month: InvoiceMonth,
    now: DateTime<Utc>,
) -> ResultEngine<()> {
    if is_invoice_closed(closing_day, invoice_month, now) {
        return Err(EngineError::Conflict(
            "Fatura fechada. Esta despesa não pode mais ser alterada.".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn month(year: i32, month: u32) -> InvoiceMonth {
        InvoiceMonth::new(year, month).unwrap()
    }

    fn purchase(amount_minor: i64, purchase_date: NaiveDate, installments: u32) -> CardPurchase {
        CardPurchase {
            description: "Mercado".to_string(),
            amount_minor,
            purchase_date,
            installments,
        }
    }

    #[test]
    fn purchase_on_closing_day_stays_in_current_month() {
        assert_eq!(
            InvoiceMonth::for_purchase(date(2025, 3, 10), 10),
            month(2025, 3)
        );
    }

    #[test]
    fn purchase_after_closing_day_rolls_to_next_month() {
        assert_eq!(
            InvoiceMonth::for_purchase(date(2025, 3, 11), 10),
            month(2025, 4)
        );
    }

    #[test]
    fn base_month_rolls_over_year_boundary() {
        assert_eq!(
            InvoiceMonth::for_purchase(date(2025, 12, 15), 10),
            month(2026, 1)
        );
    }

    #[test]
    fn plus_months_crosses_years() {
        assert_eq!(month(2025, 11).plus_months(3), month(2026, 2));
        assert_eq!(month(2025, 1).plus_months(24), month(2027, 1));
        assert_eq!(month(2025, 6).plus_months(0), month(2025, 6));
    }

    #[test]
    fn parse_and_format_round_trip() {
        let parsed: InvoiceMonth = "2025-02".parse().unwrap();
        assert_eq!(parsed, month(2025, 2));
        assert_eq!(parsed.to_string(), "2025-02");
    }

    #[test]
    fn parse_rejects_malformed_months() {
        assert!("2025-13".parse::<InvoiceMonth>().is_err());
        assert!("2025-00".parse::<InvoiceMonth>().is_err());
        assert!("2025-2".parse::<InvoiceMonth>().is_err());
        assert!("25-02".parse::<InvoiceMonth>().is_err());
        assert!("2025/02".parse::<InvoiceMonth>().is_err());
        assert!("garbage".parse::<InvoiceMonth>().is_err());
    }

    #[test]
    fn installments_fan_out_into_consecutive_months() {
        let card_id = Uuid::new_v4();
        let rows = allocate_installments(
            card_id,
            "alice",
            &purchase(30000, date(2025, 1, 15), 3),
            10,
            Utc.timestamp_opt(0, 0).unwrap(),
        );

        assert_eq!(rows.len(), 3);
        let months: Vec<String> = rows.iter().map(|r| r.invoice_month.to_string()).collect();
        assert_eq!(months, ["2025-02", "2025-03", "2025-04"]);
        let numbers: Vec<u32> = rows.iter().map(|r| r.installment_no).collect();
        assert_eq!(numbers, [1, 2, 3]);
        assert!(rows.iter().all(|r| r.group_id == rows[0].group_id));
        assert!(rows.iter().all(|r| r.installment_count == 3));
        // The full amount is repeated on every row, never divided.
        assert!(rows.iter().all(|r| r.amount_minor == 30000));
    }

    #[test]
    fn zero_installments_defaults_to_one() {
        let rows = allocate_installments(
            Uuid::new_v4(),
            "alice",
            &purchase(1000, date(2025, 6, 1), 0),
            10,
            Utc::now(),
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].installment_no, 1);
        assert_eq!(rows[0].installment_count, 1);
    }

    #[test]
    fn closing_day_clamps_to_short_months() {
        // February 2025 has 28 days; closing day 31 resolves to the 28th.
        let feb = month(2025, 2);
        let closed_after = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let still_open = Utc.with_ymd_and_hms(2025, 2, 28, 18, 0, 0).unwrap();

        assert!(is_invoice_closed(31, feb, closed_after));
        assert!(!is_invoice_closed(31, feb, still_open));
    }

    #[test]
    fn invoice_closes_strictly_after_the_closing_instant() {
        let may = month(2025, 5);
        let instant = may.closing_instant(10);
        assert!(!is_invoice_closed(10, may, instant));
        assert!(is_invoice_closed(
            10,
            may,
            instant + chrono::Duration::milliseconds(1)
        ));
    }

    #[test]
    fn ensure_open_rejects_closed_invoices() {
        let jan = month(2025, 1);
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

        let err = ensure_invoice_open(10, jan, now).unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));

        assert!(ensure_invoice_open(10, month(2025, 6), now).is_ok());
    }
}
