//! Product catalog domain module (event-sourced).
//!
//! Base products that custom orders are built on, with their list price.

pub mod product;

pub use product::{
    ArchiveProduct, ChangeListPrice, CreateProduct, ListPriceChanged, Product, ProductArchived,
    ProductCommand, ProductCreated, ProductEvent, ProductId,
};
