//! The module contains the `CreditCard` struct and its implementation.
//!
//! A credit card carries the billing attributes the invoice calculations
//! depend on: the closing day decides which invoice a purchase lands on, the
//! due day is informational.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// A credit card owned by a user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreditCard {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub brand: String,
    pub last_four_digits: String,
    pub credit_limit_minor: i64,
    /// Day of month (1–31) after which purchases roll into the next invoice.
    pub closing_day: u8,
    /// Day of month (1–31) the invoice is due. Constant per card.
    pub due_day: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn validate_billing_day(value: u8, label: &str) -> ResultEngine<()> {
    if !(1..=31).contains(&value) {
        return Err(EngineError::Validation(format!(
            "{label} must be between 1 and 31"
        )));
    }
    Ok(())
}

impl CreditCard {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: String,
        name: String,
        brand: String,
        last_four_digits: String,
        credit_limit_minor: i64,
        closing_day: u8,
        due_day: u8,
        now: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(EngineError::Validation(
                "card name must not be empty".to_string(),
            ));
        }
        if last_four_digits.len() != 4 || !last_four_digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(EngineError::Validation(
                "last_four_digits must be exactly 4 digits".to_string(),
            ));
        }
        if credit_limit_minor < 0 {
            return Err(EngineError::Validation(
                "credit_limit must not be negative".to_string(),
            ));
        }
        validate_billing_day(closing_day, "closing_day")?;
        validate_billing_day(due_day, "due_day")?;

        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            brand: brand.trim().to_string(),
            last_four_digits,
            credit_limit_minor,
            closing_day,
            due_day,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "credit_cards")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub brand: String,
    pub last_four_digits: String,
    pub credit_limit_minor: i64,
    pub closing_day: i32,
    pub due_day: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::card_expenses::Entity")]
    CardExpenses,
}

impl Related<super::card_expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CardExpenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&CreditCard> for ActiveModel {
    fn from(card: &CreditCard) -> Self {
        Self {
            id: ActiveValue::Set(card.id.to_string()),
            user_id: ActiveValue::Set(card.user_id.clone()),
            name: ActiveValue::Set(card.name.clone()),
            brand: ActiveValue::Set(card.brand.clone()),
            last_four_digits: ActiveValue::Set(card.last_four_digits.clone()),
            credit_limit_minor: ActiveValue::Set(card.credit_limit_minor),
            closing_day: ActiveValue::Set(i32::from(card.closing_day)),
            due_day: ActiveValue::Set(i32::from(card.due_day)),
            created_at: ActiveValue::Set(card.created_at),
            updated_at: ActiveValue::Set(card.updated_at),
        }
    }
}

impl TryFrom<Model> for CreditCard {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let not_found = || EngineError::NotFound("Cartão não encontrado".to_string());
        Ok(Self {
            id: Uuid::parse_str(&model.id).map_err(|_| not_found())?,
            user_id: model.user_id,
            name: model.name,
            brand: model.brand,
            last_four_digits: model.last_four_digits,
            credit_limit_minor: model.credit_limit_minor,
            closing_day: u8::try_from(model.closing_day).map_err(|_| not_found())?,
            due_day: u8::try_from(model.due_day).map_err(|_| not_found())?,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn card(closing_day: u8, due_day: u8) -> ResultEngine<CreditCard> {
        CreditCard::new(
            "alice".to_string(),
            "Nubank".to_string(),
            "Mastercard".to_string(),
            "4242".to_string(),
            500_000,
            closing_day,
            due_day,
            Utc.timestamp_opt(0, 0).unwrap(),
        )
    }

    #[test]
    fn new_card_validates_billing_days() {
        assert!(card(10, 17).is_ok());
        assert!(card(0, 17).is_err());
        assert!(card(32, 17).is_err());
        assert!(card(10, 0).is_err());
    }

    #[test]
    fn new_card_validates_last_four_digits() {
        let bad = CreditCard::new(
            "alice".to_string(),
            "Nubank".to_string(),
            "Mastercard".to_string(),
            "42".to_string(),
            0,
            10,
            17,
            Utc::now(),
        );
        assert!(bad.is_err());
    }
}
