//! Diesel ORM models for database tables.

use diesel::prelude::*;

use crate::schema;

/// Product row from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::products)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProductRecord {
    pub id: i32,
    pub manufacturer: String,
    pub model: String,
    pub url: String,
    /// JSON object of specification key to value.
    pub specifications: String,
    pub scraped_at: String,
}

/// New product row for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::products)]
pub struct NewProduct<'a> {
    pub manufacturer: &'a str,
    pub model: &'a str,
    pub url: &'a str,
    pub specifications: &'a str,
    pub scraped_at: &'a str,
}
