use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use okane_model::{Expense, ExpenseId};
use time::UtcDateTime;

const NANOS_PER_MILLI: i128 = 1_000_000;

/// Dates are persisted as epoch milliseconds; anything finer is truncated.
pub(crate) fn to_epoch_millis(date: UtcDateTime) -> Result<i64, Error> {
    i64::try_from(date.unix_timestamp_nanos().div_euclid(NANOS_PER_MILLI)).or_raise(|| ErrorKind::InvalidData("date"))
}

pub(crate) fn from_epoch_millis(millis: i64) -> Result<UtcDateTime, Error> {
    UtcDateTime::from_unix_timestamp_nanos(i128::from(millis) * NANOS_PER_MILLI)
        .or_raise(|| ErrorKind::InvalidData("date"))
}

#[derive(sqlx::FromRow)]
pub(crate) struct ExpenseRow {
    pub(crate) id: Option<i64>,
    pub(crate) date: i64,
    pub(crate) total_amount: f64,
    pub(crate) shop_name: String,
    pub(crate) notes: String,
}
impl TryFrom<&Expense> for ExpenseRow {
    type Error = Error;
    fn try_from(expense: &Expense) -> Result<Self, Self::Error> {
        Ok(Self {
            id: expense.id.map(|id| id.0),
            date: to_epoch_millis(expense.date)?,
            total_amount: expense.total_amount,
            shop_name: expense.shop_name.clone(),
            notes: expense.notes.clone(),
        })
    }
}
impl TryFrom<ExpenseRow> for Expense {
    type Error = Error;
    fn try_from(row: ExpenseRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.map(ExpenseId),
            date: from_epoch_millis(row.date)?,
            total_amount: row.total_amount,
            shop_name: row.shop_name,
            notes: row.notes,
        })
    }
}
