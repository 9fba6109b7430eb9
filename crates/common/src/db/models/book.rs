//! Book entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "String(StringLen::N(200))")]
    pub title: String,

    #[sea_orm(column_type = "String(StringLen::N(100))")]
    pub author: String,

    pub published_date: Date,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub publisher_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::publisher::Entity",
        from = "Column::PublisherId",
        to = "super::publisher::Column::Id",
        on_delete = "Cascade"
    )]
    Publisher,

    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,

    #[sea_orm(has_many = "super::book_store::Entity")]
    BookStores,
}

impl Related<super::publisher::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Publisher.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::book_store::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BookStores.def()
    }
}

/// Stores are reached through the `book_stores` junction
impl Related<super::store::Entity> for Entity {
    fn to() -> RelationDef {
        super::book_store::Relation::Store.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::book_store::Relation::Book.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
