//! gsmacquire - phone catalog specification acquisition.
//!
//! Crawls a manufacturer catalog, extracts each product's specification
//! tables into a flat key/value map, and stores one record per product.

pub mod cli;
pub mod config;
pub mod models;
pub mod repository;
pub mod schema;
pub mod scrapers;
