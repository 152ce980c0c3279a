//! The item tree that parsing builds and merges into.

mod item;

pub use item::Item;
