//! Bookstore entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stores")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "String(StringLen::N(200))")]
    pub name: String,

    #[sea_orm(column_type = "String(StringLen::N(100))")]
    pub city: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::book_store::Entity")]
    BookStores,
}

impl Related<super::book_store::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BookStores.def()
    }
}

impl Related<super::book::Entity> for Entity {
    fn to() -> RelationDef {
        super::book_store::Relation::Book.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::book_store::Relation::Store.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
