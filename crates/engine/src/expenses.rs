//! Committed expenses.
//!
//! Every expense lives in one table; the month it was filed under is kept in
//! its own column next to the date. The row id plays the role of the sheet
//! row and never shifts when other rows are removed.

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{ActiveValue, QueryOrder, QuerySelect, entity::prelude::*};

use crate::{
    CategoryRow, DateToken, DeleteRequest, Engine, EngineError, ExpenseBook, Month, MoneyCents,
    ResultEngine, categories, category_names,
};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub date: Date,
    pub month: String,
    pub description: String,
    pub amount_minor: i64,
    pub category: String,
    pub subcategory: String,
    pub details: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// A fully gathered expense, ready to be written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpenseRecord {
    pub date: NaiveDate,
    pub month: Month,
    pub description: String,
    pub value: MoneyCents,
    pub category: String,
    pub subcategory: String,
    pub details: Option<String>,
}

impl ExpenseRecord {
    /// Builds a record filed under the month of `date`.
    pub fn new(
        date: NaiveDate,
        category: impl Into<String>,
        subcategory: impl Into<String>,
        description: impl Into<String>,
        value: MoneyCents,
        details: Option<String>,
    ) -> Self {
        Self {
            date,
            month: Month::of(date),
            description: description.into(),
            value,
            category: category.into(),
            subcategory: subcategory.into(),
            details: details.filter(|d| !d.is_empty()),
        }
    }
}

/// An expense together with the row it is stored in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredExpense {
    pub row: i64,
    pub record: ExpenseRecord,
}

impl StoredExpense {
    /// The request a delete button carries for this row.
    pub fn delete_request(&self) -> DeleteRequest {
        DeleteRequest {
            row: self.row,
            date: DateToken::of_day(self.record.date),
            cost: self.record.value,
        }
    }
}

impl TryFrom<Model> for StoredExpense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let month = model.month.parse()?;
        Ok(Self {
            row: model.id,
            record: ExpenseRecord {
                date: model.date,
                month,
                description: model.description,
                value: MoneyCents::new(model.amount_minor),
                category: model.category,
                subcategory: model.subcategory,
                details: Some(model.details).filter(|d| !d.is_empty()),
            },
        })
    }
}

/// Total spent in one category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: MoneyCents,
}

/// The dashboard of a month: non-empty categories in definition order, then
/// any category that is no longer defined, and the grand total.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthlySummary {
    pub month: Month,
    pub rows: Vec<CategoryTotal>,
    pub total: MoneyCents,
}

impl MonthlySummary {
    fn build(month: Month, definitions: &[CategoryRow], expenses: &[Model]) -> Self {
        let mut order = category_names(definitions);
        for expense in expenses {
            if !order.iter().any(|name| *name == expense.category) {
                order.push(expense.category.clone());
            }
        }

        let mut total = MoneyCents::default();
        let mut rows = Vec::new();
        for category in order {
            let mut matching = expenses.iter().filter(|e| e.category == category).peekable();
            if matching.peek().is_none() {
                continue;
            }
            let spent = matching
                .map(|e| MoneyCents::new(e.amount_minor))
                .fold(MoneyCents::default(), |acc, v| acc + v);
            total += spent;
            rows.push(CategoryTotal {
                category,
                total: spent,
            });
        }

        Self { month, rows, total }
    }
}

impl Engine {
    fn month_rows(year: i32, month: Month) -> ResultEngine<Select<Entity>> {
        let (first, last) = month
            .bounds(year)
            .ok_or_else(|| EngineError::KeyNotFound(format!("{month} {year}")))?;
        Ok(Entity::find().filter(Column::Date.between(first, last)))
    }

    /// Every expense of a month, oldest row first.
    pub async fn month_expenses(&self, year: i32, month: Month) -> ResultEngine<Vec<StoredExpense>> {
        Self::month_rows(year, month)?
            .order_by_asc(Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(StoredExpense::try_from)
            .collect()
    }
}

#[async_trait]
impl ExpenseBook for Engine {
    async fn categories(&self) -> ResultEngine<Vec<CategoryRow>> {
        let rows = categories::Entity::find()
            .order_by_asc(categories::Column::Position)
            .order_by_asc(categories::Column::Id)
            .all(&self.database)
            .await?;
        Ok(rows.into_iter().map(CategoryRow::from).collect())
    }

    async fn record_expense(&self, record: &ExpenseRecord) -> ResultEngine<StoredExpense> {
        let model = ActiveModel {
            id: ActiveValue::NotSet,
            date: ActiveValue::Set(record.date),
            month: ActiveValue::Set(record.month.short_name().to_string()),
            description: ActiveValue::Set(record.description.clone()),
            amount_minor: ActiveValue::Set(record.value.cents()),
            category: ActiveValue::Set(record.category.clone()),
            subcategory: ActiveValue::Set(record.subcategory.clone()),
            details: ActiveValue::Set(record.details.clone().unwrap_or_default()),
        }
        .insert(&self.database)
        .await?;

        tracing::info!(
            "expense {} stored: {} {} on {}",
            model.id,
            record.category,
            record.value,
            record.date
        );
        StoredExpense::try_from(model)
    }

    async fn expense(&self, row: i64) -> ResultEngine<Option<StoredExpense>> {
        Entity::find_by_id(row)
            .one(&self.database)
            .await?
            .map(StoredExpense::try_from)
            .transpose()
    }

    async fn recent_expenses(
        &self,
        year: i32,
        month: Month,
        limit: u64,
    ) -> ResultEngine<Vec<StoredExpense>> {
        Self::month_rows(year, month)?
            .order_by_desc(Column::Id)
            .limit(limit)
            .all(&self.database)
            .await?
            .into_iter()
            .map(StoredExpense::try_from)
            .collect()
    }

    async fn latest_expenses(&self, limit: u64) -> ResultEngine<Vec<StoredExpense>> {
        Entity::find()
            .order_by_desc(Column::Id)
            .limit(limit)
            .all(&self.database)
            .await?
            .into_iter()
            .map(StoredExpense::try_from)
            .collect()
    }

    async fn monthly_summary(&self, year: i32, month: Month) -> ResultEngine<MonthlySummary> {
        let definitions = self.categories().await?;
        let expenses = Self::month_rows(year, month)?
            .order_by_asc(Column::Id)
            .all(&self.database)
            .await?;
        Ok(MonthlySummary::build(month, &definitions, &expenses))
    }

    async fn delete_matching(&self, request: &DeleteRequest) -> ResultEngine<bool> {
        let Some(row) = Entity::find_by_id(request.row).one(&self.database).await? else {
            tracing::debug!("delete of row {} skipped: row not found", request.row);
            return Ok(false);
        };

        if Some(row.date) != request.date.utc_date() || row.amount_minor != request.cost.cents() {
            tracing::debug!("delete of row {} skipped: row changed", request.row);
            return Ok(false);
        }

        let res = Entity::delete_by_id(row.id).exec(&self.database).await?;
        Ok(res.rows_affected == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(id: i64, category: &str, cents: i64) -> Model {
        Model {
            id,
            date: NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
            month: "Mar".to_string(),
            description: "Item".to_string(),
            amount_minor: cents,
            category: category.to_string(),
            subcategory: String::new(),
            details: String::new(),
        }
    }

    #[test]
    fn summary_follows_definition_order_and_skips_empty_categories() {
        let definitions = vec![
            CategoryRow::new("Food", "Groceries"),
            CategoryRow::new("Home", "Rent"),
            CategoryRow::new("Transport", "Fuel"),
        ];
        let expenses = vec![
            model(1, "Transport", 4_000),
            model(2, "Food", 1_250),
            model(3, "Food", 250),
            model(4, "Gifts", 1_000),
        ];

        let summary = MonthlySummary::build(Month::Mar, &definitions, &expenses);
        let names: Vec<_> = summary.rows.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(names, vec!["Food", "Transport", "Gifts"]);
        assert_eq!(summary.rows[0].total, MoneyCents::new(1_500));
        assert_eq!(summary.total, MoneyCents::new(6_500));
    }

    #[test]
    fn empty_details_read_back_as_none() {
        let stored = StoredExpense::try_from(model(7, "Food", 100)).unwrap();
        assert_eq!(stored.row, 7);
        assert_eq!(stored.record.details, None);
        assert_eq!(stored.record.month, Month::Mar);
    }

    #[test]
    fn delete_request_identifies_row_date_and_cost() {
        let stored = StoredExpense::try_from(model(3, "Food", 350)).unwrap();
        let req = stored.delete_request();
        assert_eq!(req.row, 3);
        assert_eq!(req.cost, MoneyCents::new(350));
        assert_eq!(req.date.utc_date(), NaiveDate::from_ymd_opt(2024, 3, 11));
    }
}
