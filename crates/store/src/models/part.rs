use okane_model::{ExpenseId, ExpensePart, ExpensePartId};

#[derive(sqlx::FromRow)]
pub(crate) struct ExpensePartRow {
    pub(crate) id: Option<i64>,
    pub(crate) expense_id: i64,
    pub(crate) amount: f64,
    pub(crate) description: String,
}
impl From<&ExpensePart> for ExpensePartRow {
    fn from(part: &ExpensePart) -> Self {
        Self {
            id: part.id.map(|id| id.0),
            expense_id: part.expense_id.0,
            amount: part.amount,
            description: part.description.clone(),
        }
    }
}
impl From<ExpensePartRow> for ExpensePart {
    fn from(row: ExpensePartRow) -> Self {
        Self {
            id: row.id.map(ExpensePartId),
            expense_id: ExpenseId(row.expense_id),
            amount: row.amount,
            description: row.description,
        }
    }
}
