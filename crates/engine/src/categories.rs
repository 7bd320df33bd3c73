//! Category registry per user.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Whether a category labels income or expenses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CategoryKind {
    Income,
    Expense,
}

impl CategoryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl TryFrom<&str> for CategoryKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::Validation(format!(
                "invalid category kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Category {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub kind: CategoryKind,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(
        user_id: String,
        name: String,
        kind: CategoryKind,
        icon: Option<String>,
        color: Option<String>,
        now: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(EngineError::Validation(
                "category name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            kind,
            icon,
            color,
            created_at: now,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub kind: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
    #[sea_orm(has_many = "super::recurring::Entity")]
    RecurringExpenses,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::recurring::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecurringExpenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Category> for ActiveModel {
    fn from(category: &Category) -> Self {
        Self {
            id: ActiveValue::Set(category.id.to_string()),
            user_id: ActiveValue::Set(category.user_id.clone()),
            name: ActiveValue::Set(category.name.clone()),
            kind: ActiveValue::Set(category.kind.as_str().to_string()),
            icon: ActiveValue::Set(category.icon.clone()),
            color: ActiveValue::Set(category.color.clone()),
            created_at: ActiveValue::Set(category.created_at),
        }
    }
}

impl TryFrom<Model> for Category {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("Categoria não encontrada".to_string()))?,
            user_id: model.user_id,
            name: model.name,
            kind: CategoryKind::try_from(model.kind.as_str())?,
            icon: model.icon,
            color: model.color,
            created_at: model.created_at,
        })
    }
}
