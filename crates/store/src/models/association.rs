use crate::models::TagRow;
use okane_model::{ExpensePartAndTagAssociation, ExpensePartId};

#[derive(sqlx::FromRow)]
pub(crate) struct AssociationRow {
    pub(crate) expense_part_id: i64,
    pub(crate) tag_id: i64,
}
impl From<&ExpensePartAndTagAssociation> for AssociationRow {
    fn from(association: &ExpensePartAndTagAssociation) -> Self {
        Self {
            expense_part_id: association.expense_part_id.0,
            tag_id: association.tag_id.0,
        }
    }
}

/// A tag reached through the association table, keyed by the part it hangs off.
#[derive(sqlx::FromRow)]
pub(crate) struct TaggedRow {
    pub(crate) expense_part_id: i64,
    #[sqlx(flatten)]
    pub(crate) tag: TagRow,
}
impl TaggedRow {
    pub(crate) fn part_id(&self) -> ExpensePartId {
        ExpensePartId(self.expense_part_id)
    }
}
