mod association;
mod expense;
mod part;
mod tag;

pub(crate) use self::association::{AssociationRow, TaggedRow};
pub(crate) use self::expense::ExpenseRow;
pub(crate) use self::part::ExpensePartRow;
pub(crate) use self::tag::TagRow;
