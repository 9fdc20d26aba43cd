use crate::ExpenseId;
use derive_more::{Display, From};

/// Identity of an [`ExpensePart`].
#[derive(Debug, Display, From, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(transparent))]
pub struct ExpensePartId(pub i64);

/// A line item of an [`Expense`](crate::Expense).
///
/// Owned exclusively by its parent expense: removing the expense (or changing
/// its id) removes (or re-points) every part.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExpensePart {
    pub id: Option<ExpensePartId>,
    pub expense_id: ExpenseId,
    pub amount: f64,
    pub description: String,
}
impl ExpensePart {
    pub fn new(expense_id: impl Into<ExpenseId>, amount: f64, description: impl Into<String>) -> Self {
        Self {
            id: None,
            expense_id: expense_id.into(),
            amount,
            description: description.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<ExpensePartId>) -> Self {
        self.id = Some(id.into());
        self
    }
}
