//! SQLite persistence for expense records.
//!
//! # Architecture
//! Four tables make up the schema:
//! - **expenses**: the root of the ownership hierarchy.
//! - **expense_parts**: line items, each owned by exactly one expense. Deleting
//!   an expense deletes its parts.
//! - **tags**: free-form labels, independent of any expense.
//! - **expense_part_tags**: the many-to-many link between parts and tags,
//!   removed together with either side.
//!
//! Constraint enforcement (foreign keys, uniqueness, cascades) is left to the
//! storage engine; violations surface as [`ErrorKind::Constraint`](error::ErrorKind::Constraint).
//! Nested read models are assembled with one query per level inside a single
//! transaction.

mod db;
pub mod error;
pub mod handle;
mod models;
mod projection;
mod repo;

pub use crate::db::Database;
pub use crate::repo::Repository;
pub use okane_model as model;
