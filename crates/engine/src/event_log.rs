//! Event log table.
//!
//! One row per delivery, holding the classified [`Event`] as JSON. Rows are
//! ordered by their autoincrement id.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveValue, PaginatorTrait, QueryOrder, QuerySelect, entity::prelude::*};

use crate::{Engine, EngineError, Event, EventLog, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "event_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub chat_id: i64,
    pub payload: String,
    pub logged_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<&Model> for Event {
    type Error = EngineError;

    fn try_from(model: &Model) -> Result<Self, Self::Error> {
        serde_json::from_str(&model.payload)
            .map_err(|err| EngineError::MalformedEvent(format!("log row {}: {err}", model.id)))
    }
}

#[async_trait]
impl EventLog for Engine {
    async fn append(&self, chat_id: i64, event: &Event) -> ResultEngine<()> {
        let payload = serde_json::to_string(event)
            .map_err(|err| EngineError::MalformedEvent(err.to_string()))?;
        ActiveModel {
            id: ActiveValue::NotSet,
            chat_id: ActiveValue::Set(chat_id),
            payload: ActiveValue::Set(payload),
            logged_at: ActiveValue::Set(Utc::now()),
        }
        .insert(&self.database)
        .await?;
        Ok(())
    }

    async fn tail(&self, chat_id: i64, k: usize) -> ResultEngine<Vec<Event>> {
        let rows = Entity::find()
            .filter(Column::ChatId.eq(chat_id))
            .order_by_desc(Column::Id)
            .limit(k as u64)
            .all(&self.database)
            .await?;

        rows.iter().rev().map(Event::try_from).collect()
    }

    async fn clear(&self, chat_id: i64) -> ResultEngine<()> {
        let res = Entity::delete_many()
            .filter(Column::ChatId.eq(chat_id))
            .exec(&self.database)
            .await?;
        tracing::debug!("cleared {} log entries for chat {chat_id}", res.rows_affected);
        Ok(())
    }

    async fn len(&self, chat_id: i64) -> ResultEngine<u64> {
        Ok(Entity::find()
            .filter(Column::ChatId.eq(chat_id))
            .count(&self.database)
            .await?)
    }
}
