//! Shared data models.

mod item;

pub use item::Item;
