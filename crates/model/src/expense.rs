use derive_more::{Display, From};
use time::UtcDateTime;

/// Identity of an [`Expense`], assigned monotonically by the store.
#[derive(Debug, Display, From, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(transparent))]
pub struct ExpenseId(pub i64);

/// A single purchase, e.g. one receipt from one shop.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Expense {
    /// `None` until the expense has been persisted (or a caller picks one).
    pub id: Option<ExpenseId>,
    /// When the purchase happened. Persisted with millisecond precision.
    pub date: UtcDateTime,
    pub total_amount: f64,
    pub shop_name: String,
    pub notes: String,
}
impl Expense {
    /// A new, not-yet-persisted expense with empty notes.
    pub fn new(date: UtcDateTime, total_amount: f64, shop_name: impl Into<String>) -> Self {
        Self {
            id: None,
            date,
            total_amount,
            shop_name: shop_name.into(),
            notes: String::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<ExpenseId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn test_new_expense_has_no_id_and_empty_notes() {
        let expense = Expense::new(date!(2024-01-09).midnight().as_utc(), 1.0, "Susureti");
        assert_eq!(expense.id, None);
        assert_eq!(expense.notes, "");
        assert_eq!(expense.shop_name, "Susureti");
    }

    #[test]
    fn test_builder_methods() {
        let expense = Expense::new(date!(2024-01-09).midnight().as_utc(), 1.0, "Susureti")
            .with_id(ExpenseId(7))
            .with_notes("bought on sale");
        assert_eq!(expense.id, Some(ExpenseId(7)));
        assert_eq!(expense.notes, "bought on sale");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_id_serializes_transparently() {
        assert_eq!(serde_json::to_string(&ExpenseId(42)).unwrap(), "42");
    }
}
