//! Data models for catalog records.

mod product;

pub use product::{LinkRef, ProductDocument, Record, SpecMap};
