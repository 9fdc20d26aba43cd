use crate::{Expense, ExpensePart, Tag};
use std::collections::HashSet;

/// An [`ExpensePart`] together with every [`Tag`] associated with it.
///
/// Tags have set semantics: no duplicates, no meaningful order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExpensePartWithTags {
    pub part: ExpensePart,
    pub tags: HashSet<Tag>,
}
impl ExpensePartWithTags {
    pub fn new(part: ExpensePart, tags: impl IntoIterator<Item = Tag>) -> Self {
        Self {
            part,
            tags: tags.into_iter().collect(),
        }
    }

    /// Returns `true` if a tag with exactly this name is attached.
    pub fn has_tag(&self, name: impl AsRef<str>) -> bool {
        self.tags.iter().any(|tag| tag.name == name.as_ref())
    }
}

/// An [`Expense`] with all of its parts, each carrying its tags.
///
/// An expense with no parts has an empty `parts` list.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExpenseWithPartsAndTags {
    pub expense: Expense,
    pub parts: Vec<ExpensePartWithTags>,
}
impl ExpenseWithPartsAndTags {
    pub fn new(expense: Expense, parts: Vec<ExpensePartWithTags>) -> Self {
        Self { expense, parts }
    }

    /// Sum of the amounts of every part.
    ///
    /// This does not have to equal [`Expense::total_amount`]; nothing enforces
    /// that the parts cover the whole receipt.
    pub fn parts_total(&self) -> f64 {
        self.parts.iter().map(|p| p.part.amount).sum()
    }
}
