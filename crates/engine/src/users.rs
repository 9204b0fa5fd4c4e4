//! Authorized users table (the allow-list).

use async_trait::async_trait;
use sea_orm::{ActiveValue, QueryOrder, entity::prelude::*};

use crate::{Engine, ResultEngine, UserDirectory};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "authorized_users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub telegram_id: i64,
    pub label: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[async_trait]
impl UserDirectory for Engine {
    async fn is_authorized(&self, telegram_id: i64) -> ResultEngine<bool> {
        Ok(Entity::find_by_id(telegram_id)
            .one(&self.database)
            .await?
            .is_some())
    }
}

impl Engine {
    /// Adds `telegram_id` to the allow-list, replacing its label if the user
    /// is already there.
    pub async fn authorize_user(&self, telegram_id: i64, label: Option<String>) -> ResultEngine<()> {
        let model = ActiveModel {
            telegram_id: ActiveValue::Set(telegram_id),
            label: ActiveValue::Set(label),
        };
        if Entity::find_by_id(telegram_id)
            .one(&self.database)
            .await?
            .is_some()
        {
            model.update(&self.database).await?;
        } else {
            model.insert(&self.database).await?;
        }
        tracing::info!("user {telegram_id} authorized");
        Ok(())
    }

    /// Removes `telegram_id` from the allow-list. Returns whether it was there.
    pub async fn revoke_user(&self, telegram_id: i64) -> ResultEngine<bool> {
        let res = Entity::delete_by_id(telegram_id)
            .exec(&self.database)
            .await?;
        Ok(res.rows_affected > 0)
    }

    pub async fn authorized_users(&self) -> ResultEngine<Vec<Model>> {
        Ok(Entity::find()
            .order_by_asc(Column::TelegramId)
            .all(&self.database)
            .await?)
    }
}
