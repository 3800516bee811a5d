use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, PaginatorTrait, Set};
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;

/// One row per user: the serialized state and the time of the last write.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "states")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub user_id: String,
    #[sea_orm(column_type = "Text")]
    pub state_json: String,
    #[sea_orm(column_type = "Text")]
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub async fn find(db: &DatabaseConnection, user_id: &str) -> Result<Option<Model>, StoreError> {
    Ok(Entity::find_by_id(user_id.to_string()).one(db).await?)
}

/// Serialized state for `user_id`, or `None` when nothing was written yet.
pub async fn get(db: &DatabaseConnection, user_id: &str) -> Result<Option<String>, StoreError> {
    Ok(find(db, user_id).await?.map(|m| m.state_json))
}

/// Insert or replace the record for `user_id` in a single statement.
pub async fn put(
    db: &DatabaseConnection,
    user_id: &str,
    state_json: &str,
    updated_at: &str,
) -> Result<(), StoreError> {
    let am = ActiveModel {
        user_id: Set(user_id.to_string()),
        state_json: Set(state_json.to_string()),
        updated_at: Set(updated_at.to_string()),
    };
    // 单条 upsert 语句，避免先读后写的竞态
    Entity::insert(am)
        .on_conflict(
            OnConflict::column(Column::UserId)
                .update_columns([Column::StateJson, Column::UpdatedAt])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}

pub async fn count(db: &DatabaseConnection) -> Result<u64, StoreError> {
    Ok(Entity::find().count(db).await?)
}
