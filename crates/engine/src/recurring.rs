//! Recurring expense plans and occurrence projection.
//!
//! A plan is a pure description of a repeating charge; projecting its
//! occurrence dates never mutates it. The same projector serves both the
//! materialization of expense transactions at plan creation (no window) and
//! ad-hoc window queries ("which occurrences fall in this month").

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// How often a plan produces an occurrence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Frequency {
    Monthly,
    Yearly,
    /// Every `custom_interval_days` days.
    Custom,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Custom => "custom",
        }
    }
}

impl TryFrom<&str> for Frequency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "custom" => Ok(Self::Custom),
            other => Err(EngineError::Validation(format!(
                "invalid frequency: {other}"
            ))),
        }
    }
}

/// What kind of commitment the plan tracks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanKind {
    Financing,
    Loan,
    Subscription,
    Other,
}

impl PlanKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Financing => "financing",
            Self::Loan => "loan",
            Self::Subscription => "subscription",
            Self::Other => "other",
        }
    }
}

impl TryFrom<&str> for PlanKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "financing" => Ok(Self::Financing),
            "loan" => Ok(Self::Loan),
            "subscription" => Ok(Self::Subscription),
            "other" => Ok(Self::Other),
            other => Err(EngineError::Validation(format!(
                "invalid plan kind: {other}"
            ))),
        }
    }
}

/// A recurring expense plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecurringPlan {
    pub id: Uuid,
    pub user_id: String,
    pub description: String,
    pub amount_minor: i64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub frequency: Frequency,
    pub custom_interval_days: Option<u32>,
    /// 0 = unbounded.
    pub total_installments: u32,
    /// Occurrences already materialized; projection resumes past this prefix.
    pub current_installment: u32,
    pub kind: PlanKind,
    pub category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecurringPlan {
    /// Checks the plan's internal invariants.
    ///
    /// A custom-frequency plan without a positive interval is a configuration
    /// error caught here, before any projection runs.
    pub fn validate(&self) -> ResultEngine<()> {
        if self.amount_minor <= 0 {
            return Err(EngineError::Validation(
                "amount_minor must be > 0".to_string(),
            ));
        }
        if self.frequency == Frequency::Custom
            && self.custom_interval_days.is_none_or(|days| days == 0)
        {
            return Err(EngineError::Validation(
                "custom frequency requires custom_interval_days > 0".to_string(),
            ));
        }
        if let Some(end) = self.end_date
            && end < self.start_date
        {
            return Err(EngineError::Validation(
                "end_date must not precede start_date".to_string(),
            ));
        }
        Ok(())
    }
}

/// Inclusive date window restricting a projection.
#[derive(Clone, Copy, Debug)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// One frequency step.
///
/// Monthly and yearly steps clamp the day-of-month when the target month is
/// shorter (chrono `Months` semantics): `2025-01-31` + 1 month is
/// `2025-02-28`, `2024-02-29` + 1 year is `2025-02-28`. A custom step without
/// a positive interval returns the date unchanged, which the projection loop
/// treats as a stall and stops on.
fn advance(date: NaiveDate, frequency: Frequency, custom_interval_days: Option<u32>) -> Option<NaiveDate> {
    match frequency {
        Frequency::Monthly => date.checked_add_months(Months::new(1)),
        Frequency::Yearly => date.checked_add_months(Months::new(12)),
        Frequency::Custom => match custom_interval_days {
            Some(days) if days > 0 => date.checked_add_days(Days::new(u64::from(days))),
            _ => Some(date),
        },
    }
}

/// Projects the plan's occurrence dates, ascending.
///
/// The loop stops at the window's upper bound, the plan's end date, the
/// installment bound, or a stalled date advance, whichever comes first. An
/// occurrence is emitted only once the index passes the already-materialized
/// prefix (`current_installment`) and, when a window is given, the date falls
/// inside it. The index advances on every iteration, emitted or not.
#[must_use]
pub fn project(plan: &RecurringPlan, window: Option<DateWindow>) -> Vec<NaiveDate> {
    let mut occurrences = Vec::new();
    let mut date = plan.start_date;
    let mut index: u32 = 0;

    loop {
        if let Some(window) = window
            && date > window.to
        {
            break;
        }
        if let Some(end) = plan.end_date
            && date > end
        {
            break;
        }
        if plan.total_installments > 0 && index >= plan.total_installments {
            break;
        }

        let past_materialized = index >= plan.current_installment;
        let inside_window = window.is_none_or(|w| date >= w.from && date <= w.to);
        if past_materialized && inside_window {
            occurrences.push(date);
        }

        let Some(next) = advance(date, plan.frequency, plan.custom_interval_days) else {
            break;
        };
        if next == date {
            break;
        }
        date = next;
        index += 1;
    }

    occurrences
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recurring_expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub description: String,
    pub amount_minor: i64,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub frequency: String,
    pub custom_interval_days: Option<i32>,
    pub total_installments: i32,
    pub current_installment: i32,
    pub kind: String,
    pub category_id: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Categories,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&RecurringPlan> for ActiveModel {
    fn from(plan: &RecurringPlan) -> Self {
        Self {
            id: ActiveValue::Set(plan.id.to_string()),
            user_id: ActiveValue::Set(plan.user_id.clone()),
            description: ActiveValue::Set(plan.description.clone()),
            amount_minor: ActiveValue::Set(plan.amount_minor),
            start_date: ActiveValue::Set(plan.start_date),
            end_date: ActiveValue::Set(plan.end_date),
            frequency: ActiveValue::Set(plan.frequency.as_str().to_string()),
            custom_interval_days: ActiveValue::Set(
                plan.custom_interval_days.map(|days| days as i32),
            ),
            total_installments: ActiveValue::Set(plan.total_installments as i32),
            current_installment: ActiveValue::Set(plan.current_installment as i32),
            kind: ActiveValue::Set(plan.kind.as_str().to_string()),
            category_id: ActiveValue::Set(plan.category_id.map(|id| id.to_string())),
            created_at: ActiveValue::Set(plan.created_at),
            updated_at: ActiveValue::Set(plan.updated_at),
        }
    }
}

impl TryFrom<Model> for RecurringPlan {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("Recurring expense not found".to_string()))?,
            user_id: model.user_id,
            description: model.description,
            amount_minor: model.amount_minor,
            start_date: model.start_date,
            end_date: model.end_date,
            frequency: Frequency::try_from(model.frequency.as_str())?,
            custom_interval_days: model
                .custom_interval_days
                .and_then(|days| u32::try_from(days).ok()),
            total_installments: u32::try_from(model.total_installments).unwrap_or(0),
            current_installment: u32::try_from(model.current_installment).unwrap_or(0),
            kind: PlanKind::try_from(model.kind.as_str())?,
            category_id: model.category_id.and_then(|id| Uuid::parse_str(&id).ok()),
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn plan(frequency: Frequency, start: NaiveDate, total: u32) -> RecurringPlan {
        RecurringPlan {
            id: Uuid::new_v4(),
            user_id: "alice".to_string(),
            description: "Academia".to_string(),
            amount_minor: 9900,
            start_date: start,
            end_date: None,
            frequency,
            custom_interval_days: None,
            total_installments: total,
            current_installment: 0,
            kind: PlanKind::Subscription,
            category_id: None,
            created_at: Utc.timestamp_opt(0, 0).unwrap(),
            updated_at: Utc.timestamp_opt(0, 0).unwrap(),
        }
    }

    #[test]
    fn bounded_plan_emits_exactly_total_installments() {
        let plan = plan(Frequency::Monthly, date(2025, 1, 5), 12);
        let occurrences = project(&plan, None);

        assert_eq!(occurrences.len(), 12);
        assert_eq!(occurrences[0], date(2025, 1, 5));
        assert_eq!(occurrences[11], date(2025, 12, 5));
    }

    #[test]
    fn fully_materialized_plan_emits_nothing() {
        let mut plan = plan(Frequency::Monthly, date(2025, 1, 5), 12);
        plan.current_installment = 12;
        assert!(project(&plan, None).is_empty());
    }

    #[test]
    fn current_installment_skips_the_materialized_prefix() {
        let mut plan = plan(Frequency::Monthly, date(2025, 1, 5), 5);
        plan.current_installment = 2;
        let occurrences = project(&plan, None);

        assert_eq!(
            occurrences,
            [date(2025, 3, 5), date(2025, 4, 5), date(2025, 5, 5)]
        );
    }

    #[test]
    fn monthly_advance_clamps_short_months() {
        // chrono clamps the day when the target month is shorter; the day
        // does not recover in later months.
        let plan = plan(Frequency::Monthly, date(2025, 1, 31), 3);
        let occurrences = project(&plan, None);

        assert_eq!(
            occurrences,
            [date(2025, 1, 31), date(2025, 2, 28), date(2025, 3, 28)]
        );
    }

    #[test]
    fn yearly_advance_clamps_leap_day() {
        let plan = plan(Frequency::Yearly, date(2024, 2, 29), 2);
        let occurrences = project(&plan, None);

        assert_eq!(occurrences, [date(2024, 2, 29), date(2025, 2, 28)]);
    }

    #[test]
    fn custom_interval_advances_by_exact_days() {
        let mut plan = plan(Frequency::Custom, date(2025, 1, 1), 4);
        plan.custom_interval_days = Some(15);
        let occurrences = project(&plan, None);

        assert_eq!(
            occurrences,
            [
                date(2025, 1, 1),
                date(2025, 1, 16),
                date(2025, 1, 31),
                date(2025, 2, 15)
            ]
        );
    }

    #[test]
    fn stalled_custom_advance_stops_after_one_occurrence() {
        // An unvalidated custom plan without an interval must not loop
        // forever; the stall guard stops it.
        let plan = plan(Frequency::Custom, date(2025, 1, 1), 0);
        assert_eq!(project(&plan, None), [date(2025, 1, 1)]);
    }

    #[test]
    fn end_date_bounds_an_unbounded_plan() {
        let mut plan = plan(Frequency::Monthly, date(2025, 1, 10), 0);
        plan.end_date = Some(date(2025, 4, 15));
        let occurrences = project(&plan, None);

        assert_eq!(
            occurrences,
            [
                date(2025, 1, 10),
                date(2025, 2, 10),
                date(2025, 3, 10),
                date(2025, 4, 10)
            ]
        );
    }

    #[test]
    fn window_restricts_emission_without_shifting_indices() {
        let plan = plan(Frequency::Monthly, date(2025, 1, 5), 12);
        let window = DateWindow {
            from: date(2025, 3, 1),
            to: date(2025, 4, 30),
        };

        assert_eq!(
            project(&plan, Some(window)),
            [date(2025, 3, 5), date(2025, 4, 5)]
        );
    }

    #[test]
    fn projection_is_pure_and_repeatable() {
        let plan = plan(Frequency::Monthly, date(2025, 1, 5), 6);
        assert_eq!(project(&plan, None), project(&plan, None));
    }

    #[test]
    fn validate_rejects_custom_without_interval() {
        let mut custom = plan(Frequency::Custom, date(2025, 1, 1), 3);
        assert!(custom.validate().is_err());
        custom.custom_interval_days = Some(0);
        assert!(custom.validate().is_err());
        custom.custom_interval_days = Some(7);
        assert!(custom.validate().is_ok());
    }

    #[test]
    fn validate_rejects_inverted_date_range() {
        let mut monthly = plan(Frequency::Monthly, date(2025, 5, 1), 3);
        monthly.end_date = Some(date(2025, 4, 1));
        assert!(monthly.validate().is_err());
    }
}
