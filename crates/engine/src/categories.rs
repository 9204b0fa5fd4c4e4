//! Category definitions.
//!
//! The table mirrors the category sheet: rows are read top to bottom, a row
//! with a category opens a new block and the following rows with a blank
//! category belong to it.

use sea_orm::{ActiveValue, QueryOrder, QuerySelect, entity::prelude::*};

use crate::{Engine, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub position: i64,
    pub category: String,
    pub subcategory: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// One row of the category sheet. Either cell may be blank.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryRow {
    pub category: String,
    pub subcategory: String,
}

impl CategoryRow {
    pub fn new(category: impl Into<String>, subcategory: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            subcategory: subcategory.into(),
        }
    }
}

impl From<Model> for CategoryRow {
    fn from(model: Model) -> Self {
        Self {
            category: model.category,
            subcategory: model.subcategory,
        }
    }
}

/// Non-blank categories in sheet order, each listed once.
pub fn category_names(rows: &[CategoryRow]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for row in rows {
        let name = row.category.trim();
        if name.is_empty() || names.iter().any(|n| n == name) {
            continue;
        }
        names.push(name.to_string());
    }
    names
}

/// Subcategories listed under `category`: the rows from its header row up to
/// the next non-blank category.
pub fn subcategories_of(rows: &[CategoryRow], category: &str) -> Vec<String> {
    let mut current = "";
    let mut subcategories = Vec::new();
    for row in rows {
        let name = row.category.trim();
        if !name.is_empty() {
            current = name;
        }
        let subcategory = row.subcategory.trim();
        if current == category && !subcategory.is_empty() {
            subcategories.push(subcategory.to_string());
        }
    }
    subcategories
}

impl Engine {
    /// Appends a row at the bottom of the category sheet. A blank `category`
    /// adds `subcategory` to the block above it.
    pub async fn add_category_row(&self, category: &str, subcategory: &str) -> ResultEngine<()> {
        let last = Entity::find()
            .order_by_desc(Column::Position)
            .limit(1)
            .one(&self.database)
            .await?;
        let position = last.map_or(0, |row| row.position + 1);

        ActiveModel {
            id: ActiveValue::NotSet,
            position: ActiveValue::Set(position),
            category: ActiveValue::Set(category.trim().to_string()),
            subcategory: ActiveValue::Set(subcategory.trim().to_string()),
        }
        .insert(&self.database)
        .await?;
        Ok(())
    }
}
