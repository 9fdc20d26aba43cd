use crate::{ExpensePartId, TagId};

/// Links one [`ExpensePart`](crate::ExpensePart) to one [`Tag`](crate::Tag).
///
/// The pair is the identity: a part can carry a given tag at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExpensePartAndTagAssociation {
    pub expense_part_id: ExpensePartId,
    pub tag_id: TagId,
}
impl ExpensePartAndTagAssociation {
    pub fn new(expense_part_id: impl Into<ExpensePartId>, tag_id: impl Into<TagId>) -> Self {
        Self {
            expense_part_id: expense_part_id.into(),
            tag_id: tag_id.into(),
        }
    }
}
