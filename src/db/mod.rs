//! Database module: models, schema and the actor owning the SQLite pool.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `actor.rs`: `DbActor`, the single writer every statement goes through

pub mod actor;
pub mod models;
pub mod schema;

pub use models::{DbConfigEntry, DbTemplate, Template};
pub use schema::SQLITE_INIT;

pub use actor::{DbActorHandle, RenameTemplate, spawn};
