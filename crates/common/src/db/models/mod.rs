//! SeaORM entity models
//!
//! Database entities for the article demo, the library and the shop

pub mod article;
pub mod publisher;
pub mod store;
pub mod book;
pub mod book_store;
pub mod review;
pub mod user;
pub mod category;
pub mod product;
pub mod product_review;
pub mod order;
pub mod order_item;
pub mod cart;
pub mod cart_item;

pub use article::{
    Entity as ArticleEntity,
    Model as Article,
    ActiveModel as ArticleActiveModel,
    Column as ArticleColumn,
};

pub use publisher::{
    Entity as PublisherEntity,
    Model as Publisher,
    ActiveModel as PublisherActiveModel,
    Column as PublisherColumn,
};

pub use store::{
    Entity as StoreEntity,
    Model as Store,
    ActiveModel as StoreActiveModel,
    Column as StoreColumn,
};

pub use book::{
    Entity as BookEntity,
    Model as Book,
    ActiveModel as BookActiveModel,
    Column as BookColumn,
};

pub use book_store::{
    Entity as BookStoreEntity,
    Model as BookStore,
    ActiveModel as BookStoreActiveModel,
    Column as BookStoreColumn,
};

pub use review::{
    Entity as ReviewEntity,
    Model as Review,
    ActiveModel as ReviewActiveModel,
    Column as ReviewColumn,
};

pub use user::{
    Entity as UserEntity,
    Model as User,
    ActiveModel as UserActiveModel,
    Column as UserColumn,
};

pub use category::{
    Entity as CategoryEntity,
    Model as Category,
    ActiveModel as CategoryActiveModel,
    Column as CategoryColumn,
};

pub use product::{
    Entity as ProductEntity,
    Model as Product,
    ActiveModel as ProductActiveModel,
    Column as ProductColumn,
};

pub use product_review::{
    Entity as ProductReviewEntity,
    Model as ProductReview,
    ActiveModel as ProductReviewActiveModel,
    Column as ProductReviewColumn,
};

pub use order::{
    Entity as OrderEntity,
    Model as Order,
    ActiveModel as OrderActiveModel,
    Column as OrderColumn,
    OrderStatus,
};

pub use order_item::{
    Entity as OrderItemEntity,
    Model as OrderItem,
    ActiveModel as OrderItemActiveModel,
    Column as OrderItemColumn,
};

pub use cart::{
    Entity as CartEntity,
    Model as Cart,
    ActiveModel as CartActiveModel,
    Column as CartColumn,
};

pub use cart_item::{
    Entity as CartItemEntity,
    Model as CartItem,
    ActiveModel as CartItemActiveModel,
    Column as CartItemColumn,
};
