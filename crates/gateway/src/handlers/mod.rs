//! API handlers module

pub mod health;
pub mod articles;
pub mod auth;
pub mod books;
pub mod publishers;
pub mod stores;
pub mod reviews;
pub mod categories;
pub mod products;
pub mod cart;
pub mod orders;
