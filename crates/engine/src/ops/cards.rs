//! Credit card operations.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{CreditCard, EngineError, ResultEngine, cards};

use super::{Engine, normalize_required_text};

/// Attributes for a new card.
#[derive(Clone, Debug)]
pub struct NewCard {
    pub name: String,
    pub brand: String,
    pub last_four_digits: String,
    pub credit_limit_minor: i64,
    pub closing_day: u8,
    pub due_day: u8,
}

/// Partial card update; unset fields keep their value.
#[derive(Clone, Debug, Default)]
pub struct CardPatch {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub last_four_digits: Option<String>,
    pub credit_limit_minor: Option<i64>,
    pub closing_day: Option<u8>,
    pub due_day: Option<u8>,
}

impl Engine {
    pub async fn create_card(
        &self,
        user_id: &str,
        new: NewCard,
        now: DateTime<Utc>,
    ) -> ResultEngine<CreditCard> {
        let card = CreditCard::new(
            user_id.to_string(),
            new.name,
            new.brand,
            new.last_four_digits,
            new.credit_limit_minor,
            new.closing_day,
            new.due_day,
            now,
        )?;

        cards::ActiveModel::from(&card).insert(&self.database).await?;
        Ok(card)
    }

    pub async fn list_cards(&self, user_id: &str) -> ResultEngine<Vec<CreditCard>> {
        let models = cards::Entity::find()
            .filter(cards::Column::UserId.eq(user_id))
            .order_by_asc(cards::Column::CreatedAt)
            .all(&self.database)
            .await?;

        models.into_iter().map(CreditCard::try_from).collect()
    }

    /// Returns a card owned by the caller, or `NotFound`.
    pub async fn card(&self, card_id: Uuid, user_id: &str) -> ResultEngine<CreditCard> {
        let model = cards::Entity::find_by_id(card_id.to_string())
            .filter(cards::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound("Cartão não encontrado".to_string()))?;

        CreditCard::try_from(model)
    }

    pub async fn update_card(
        &self,
        card_id: Uuid,
        user_id: &str,
        patch: CardPatch,
        now: DateTime<Utc>,
    ) -> ResultEngine<CreditCard> {
        let mut card = self.card(card_id, user_id).await?;

        if let Some(name) = patch.name {
            card.name = normalize_required_text(&name, "card name")?;
        }
        if let Some(brand) = patch.brand {
            card.brand = brand.trim().to_string();
        }
        if let Some(digits) = patch.last_four_digits {
            if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(EngineError::Validation(
                    "last_four_digits must be exactly 4 digits".to_string(),
                ));
            }
            card.last_four_digits = digits;
        }
        if let Some(limit) = patch.credit_limit_minor {
            if limit < 0 {
                return Err(EngineError::Validation(
                    "credit_limit must not be negative".to_string(),
                ));
            }
            card.credit_limit_minor = limit;
        }
        if let Some(closing_day) = patch.closing_day {
            if !(1..=31).contains(&closing_day) {
                return Err(EngineError::Validation(
                    "closing_day must be between 1 and 31".to_string(),
                ));
            }
            card.closing_day = closing_day;
        }
        if let Some(due_day) = patch.due_day {
            if !(1..=31).contains(&due_day) {
                return Err(EngineError::Validation(
                    "due_day must be between 1 and 31".to_string(),
                ));
            }
            card.due_day = due_day;
        }
        card.updated_at = now;

        cards::ActiveModel::from(&card).update(&self.database).await?;
        Ok(card)
    }

    /// Deletes a card; its installment rows go with it (FK cascade).
    pub async fn delete_card(&self, card_id: Uuid, user_id: &str) -> ResultEngine<()> {
        let card = self.card(card_id, user_id).await?;

        let model = cards::ActiveModel {
            id: ActiveValue::Set(card.id.to_string()),
            ..Default::default()
        };
        model.delete(&self.database).await?;
        Ok(())
    }
}
