//! Category operations.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{Category, CategoryKind, EngineError, ResultEngine, categories};

use super::{Engine, normalize_required_text};

/// Attributes for a new category.
#[derive(Clone, Debug)]
pub struct NewCategory {
    pub name: String,
    pub kind: CategoryKind,
    pub icon: Option<String>,
    pub color: Option<String>,
}

/// Partial category update. Double-`Option` fields distinguish "leave
/// unchanged" from "clear".
#[derive(Clone, Debug, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub kind: Option<CategoryKind>,
    pub icon: Option<Option<String>>,
    pub color: Option<Option<String>>,
}

impl Engine {
    pub async fn create_category(
        &self,
        user_id: &str,
        new: NewCategory,
        now: DateTime<Utc>,
    ) -> ResultEngine<Category> {
        let name = normalize_required_text(&new.name, "category name")?;

        let existing = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .filter(categories::Column::Name.eq(name.as_str()))
            .one(&self.database)
            .await?;
        if existing.is_some() {
            return Err(EngineError::Conflict(format!(
                "category \"{name}\" already exists"
            )));
        }

        let category = Category::new(
            user_id.to_string(),
            name,
            new.kind,
            new.icon,
            new.color,
            now,
        )?;

        categories::ActiveModel::from(&category).insert(&self.database).await?;
        Ok(category)
    }

    pub async fn list_categories(&self, user_id: &str) -> ResultEngine<Vec<Category>> {
        let models = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .order_by_asc(categories::Column::Name)
            .all(&self.database)
            .await?;

        models.into_iter().map(Category::try_from).collect()
    }

    /// Returns a category owned by the caller, or `NotFound`.
    pub async fn category(&self, category_id: Uuid, user_id: &str) -> ResultEngine<Category> {
        let model = categories::Entity::find_by_id(category_id.to_string())
            .filter(categories::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound("Categoria não encontrada".to_string()))?;

        Category::try_from(model)
    }

    pub async fn update_category(
        &self,
        category_id: Uuid,
        user_id: &str,
        patch: CategoryPatch,
    ) -> ResultEngine<Category> {
        let mut category = self.category(category_id, user_id).await?;

        if let Some(name) = patch.name {
            let name = normalize_required_text(&name, "category name")?;
            if name != category.name {
                let taken = categories::Entity::find()
                    .filter(categories::Column::UserId.eq(user_id))
                    .filter(categories::Column::Name.eq(name.as_str()))
                    .one(&self.database)
                    .await?;
                if taken.is_some() {
                    return Err(EngineError::Conflict(format!(
                        "category \"{name}\" already exists"
                    )));
                }
                category.name = name;
            }
        }
        if let Some(kind) = patch.kind {
            category.kind = kind;
        }
        if let Some(icon) = patch.icon {
            category.icon = icon;
        }
        if let Some(color) = patch.color {
            category.color = color;
        }

        categories::ActiveModel::from(&category).update(&self.database).await?;
        Ok(category)
    }

    pub async fn delete_category(&self, category_id: Uuid, user_id: &str) -> ResultEngine<()> {
        let category = self.category(category_id, user_id).await?;

        let model = categories::ActiveModel {
            id: ActiveValue::Set(category.id.to_string()),
            ..Default::default()
        };
        model.delete(&self.database).await?;
        Ok(())
    }
}
