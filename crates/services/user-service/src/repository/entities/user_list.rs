//! Per-user list entity, keyed by owner and name.

use sea_orm::entity::prelude::*;

use domain::UserList;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_lists")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub owner_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,
    pub todo_count: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for UserList {
    fn from(model: Model) -> Self {
        UserList {
            name: model.name,
            todo_count: u32::try_from(model.todo_count).unwrap_or_default(),
        }
    }
}
