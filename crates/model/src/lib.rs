//! Domain types for expense records.
//!
//! An [`Expense`] is the root of the ownership hierarchy: it owns any number of
//! [`ExpensePart`]s (line items), and each part may carry any number of free-form
//! [`Tag`]s through an [`ExpensePartAndTagAssociation`]. The composite
//! [`ExpensePartWithTags`] and [`ExpenseWithPartsAndTags`] projections are
//! read-only views assembled by the store; they are never persisted directly.
//!
//! Identities are optional on the way in: `None` asks the storage engine to
//! generate one. Anything read back from the store always carries `Some` id.

mod association;
mod expense;
mod part;
mod relation;
mod tag;

pub use self::association::ExpensePartAndTagAssociation;
pub use self::expense::{Expense, ExpenseId};
pub use self::part::{ExpensePart, ExpensePartId};
pub use self::relation::{ExpensePartWithTags, ExpenseWithPartsAndTags};
pub use self::tag::{Tag, TagId};
