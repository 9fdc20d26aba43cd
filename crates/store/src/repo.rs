//! Repository for expenses, their parts, tags, and the tag associations.
//!
//! The four tables are tightly coupled: a part cannot exist without its
//! expense, and an association cannot exist without both its part and its tag.
//! The storage engine enforces all of that; this module only translates calls
//! into parameterized statements and maps the rows back.

use crate::Database;
use crate::error::{Result, SqlxResultExt};
use crate::models::{AssociationRow, ExpenseRow, ExpensePartRow, TagRow};
use crate::projection;
use okane_model::{
    Expense, ExpenseId, ExpensePart, ExpensePartAndTagAssociation, ExpensePartId, ExpensePartWithTags,
    ExpenseWithPartsAndTags, Tag, TagId,
};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::instrument;

/// Repository for managing expense records in the database.
///
/// # Relationships
///
/// - An expense owns any number of parts; deleting an expense deletes its
///   parts, and changing its id re-points them
/// - A part carries any number of tags through associations; an association
///   pair exists at most once
/// - Deleting a part or a tag deletes the associations referencing it, but
///   never the tag or part on the other side
///
/// Caller-supplied ids are inserted as given (and rejected on collision);
/// otherwise ids are generated monotonically and never reused.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn insert_expense_row<'e>(executor: impl SqliteExecutor<'e>, row: ExpenseRow) -> Result<ExpenseId> {
        let result = sqlx::query(include_str!("../queries/insert_expense.sql"))
            .bind(row.id)
            .bind(row.date)
            .bind(row.total_amount)
            .bind(row.shop_name)
            .bind(row.notes)
            .execute(executor)
            .await
            .or_raise_db()?;
        Ok(ExpenseId(result.last_insert_rowid()))
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// Insert a single expense, returning its (possibly generated) id.
    ///
    /// Returns [`ErrorKind::Constraint`](crate::error::ErrorKind::Constraint)
    /// if the id is already taken.
    #[instrument(skip(self, expense), fields(id = ?expense.id))]
    pub async fn insert_expense(&self, expense: &Expense) -> Result<ExpenseId> {
        let row = ExpenseRow::try_from(expense)?;
        Self::insert_expense_row(&self.pool, row).await
    }

    /// Insert several expenses atomically, returning their ids in input order.
    ///
    /// All-or-nothing: if any row is rejected (e.g. two rows share an id),
    /// the transaction is rolled back and none of them are persisted.
    #[instrument(skip_all, fields(count = expenses.len()))]
    pub async fn insert_expenses(&self, expenses: &[Expense]) -> Result<Vec<ExpenseId>> {
        let rows = expenses.iter().map(ExpenseRow::try_from).collect::<Result<Vec<_>>>()?;
        let mut tx = self.pool.begin().await.or_raise_db()?;
        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            // Dropping `tx` on the error path rolls everything back.
            ids.push(Self::insert_expense_row(&mut *tx, row).await?);
        }
        tx.commit().await.or_raise_db()?;
        Ok(ids)
    }

    /// Insert a part, returning its (possibly generated) id.
    ///
    /// Returns [`ErrorKind::Constraint`](crate::error::ErrorKind::Constraint)
    /// if the referenced expense does not exist or the id is already taken.
    #[instrument(skip(self, part), fields(id = ?part.id, expense_id = %part.expense_id))]
    pub async fn insert_expense_part(&self, part: &ExpensePart) -> Result<ExpensePartId> {
        let row = ExpensePartRow::from(part);
        let result = sqlx::query(include_str!("../queries/insert_expense_part.sql"))
            .bind(row.id)
            .bind(row.expense_id)
            .bind(row.amount)
            .bind(row.description)
            .execute(&self.pool)
            .await
            .or_raise_db()?;
        Ok(ExpensePartId(result.last_insert_rowid()))
    }

    /// Insert a tag, returning its (possibly generated) id.
    #[instrument(skip(self, tag), fields(id = ?tag.id))]
    pub async fn insert_tag(&self, tag: &Tag) -> Result<TagId> {
        let row = TagRow::from(tag);
        let result = sqlx::query(include_str!("../queries/insert_tag.sql"))
            .bind(row.id)
            .bind(row.name)
            .execute(&self.pool)
            .await
            .or_raise_db()?;
        Ok(TagId(result.last_insert_rowid()))
    }

    /// Attach a tag to a part.
    ///
    /// Returns [`ErrorKind::Constraint`](crate::error::ErrorKind::Constraint)
    /// if either side does not exist, or the pair is already associated.
    #[instrument(skip_all, fields(expense_part_id = %association.expense_part_id, tag_id = %association.tag_id))]
    pub async fn insert_association(&self, association: &ExpensePartAndTagAssociation) -> Result<()> {
        let row = AssociationRow::from(association);
        sqlx::query(include_str!("../queries/insert_association.sql"))
            .bind(row.expense_part_id)
            .bind(row.tag_id)
            .execute(&self.pool)
            .await
            .or_raise_db()?;
        Ok(())
    }

    // =========================================================================
    // Get/Fetch
    // =========================================================================

    /// All expenses, in no particular order.
    #[instrument(skip(self))]
    pub async fn get_expenses(&self) -> Result<Vec<Expense>> {
        let rows: Vec<ExpenseRow> = sqlx::query_as(include_str!("../queries/list_expenses.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise_db()?;
        rows.into_iter().map(Expense::try_from).collect()
    }

    /// All tags, in no particular order.
    #[instrument(skip(self))]
    pub async fn get_tags(&self) -> Result<Vec<Tag>> {
        let rows: Vec<TagRow> = sqlx::query_as(include_str!("../queries/list_tags.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise_db()?;
        Ok(rows.into_iter().map(Tag::from).collect())
    }

    /// Every expense with all of its parts, each part with all of its tags.
    ///
    /// Runs in a single transaction so the result reflects one point in time.
    #[instrument(skip(self))]
    pub async fn get_expenses_with_parts_and_tags(&self) -> Result<Vec<ExpenseWithPartsAndTags>> {
        let mut tx = self.pool.begin().await.or_raise_db()?;
        let rows: Vec<ExpenseRow> = sqlx::query_as(include_str!("../queries/list_expenses.sql"))
            .fetch_all(&mut *tx)
            .await
            .or_raise_db()?;
        let expenses = rows.into_iter().map(Expense::try_from).collect::<Result<Vec<_>>>()?;
        let results = projection::with_parts_and_tags(&mut tx, expenses).await?;
        tx.commit().await.or_raise_db()?;
        tracing::debug!(expenses = results.len(), "assembled expenses with parts and tags");
        Ok(results)
    }

    /// A single part with its tags, or `None` if no part has that id.
    ///
    /// A part that exists but has no tags is returned with an empty tag set.
    #[instrument(skip(self))]
    pub async fn get_expense_part(&self, id: ExpensePartId) -> Result<Option<ExpensePartWithTags>> {
        let mut tx = self.pool.begin().await.or_raise_db()?;
        let row: Option<ExpensePartRow> = sqlx::query_as(include_str!("../queries/get_expense_part.sql"))
            .bind(id.0)
            .fetch_optional(&mut *tx)
            .await
            .or_raise_db()?;
        let Some(row) = row else {
            tx.commit().await.or_raise_db()?;
            return Ok(None);
        };
        let result = projection::with_tags(&mut tx, vec![ExpensePart::from(row)]).await?.pop();
        tx.commit().await.or_raise_db()?;
        Ok(result)
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Change the id of an expense. Its parts follow along.
    ///
    /// Returns `true` if the expense was found, `false` otherwise. Returns
    /// [`ErrorKind::Constraint`](crate::error::ErrorKind::Constraint) if the
    /// new id is already taken.
    #[instrument(skip(self))]
    pub async fn change_expense_id(&self, from: ExpenseId, to: ExpenseId) -> Result<bool> {
        let result = sqlx::query(include_str!("../queries/change_expense_id.sql"))
            .bind(to.0)
            .bind(from.0)
            .execute(&self.pool)
            .await
            .or_raise_db()?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Delete an expense along with all of its parts and their associations.
    ///
    /// Returns `true` if the expense was deleted, `false` if it was not found.
    #[instrument(skip(self))]
    pub async fn delete_expense(&self, id: ExpenseId) -> Result<bool> {
        let result = sqlx::query(include_str!("../queries/delete_expense.sql"))
            .bind(id.0)
            .execute(&self.pool)
            .await
            .or_raise_db()?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a part along with its associations. Tags are kept.
    ///
    /// Returns `true` if the part was deleted, `false` if it was not found.
    #[instrument(skip(self))]
    pub async fn delete_expense_part(&self, id: ExpensePartId) -> Result<bool> {
        let result = sqlx::query(include_str!("../queries/delete_expense_part.sql"))
            .bind(id.0)
            .execute(&self.pool)
            .await
            .or_raise_db()?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a tag, detaching it from every part.
    ///
    /// Returns `true` if the tag was deleted, `false` if it was not found.
    #[instrument(skip(self))]
    pub async fn delete_tag(&self, id: TagId) -> Result<bool> {
        let result = sqlx::query(include_str!("../queries/delete_tag.sql"))
            .bind(id.0)
            .execute(&self.pool)
            .await
            .or_raise_db()?;
        Ok(result.rows_affected() > 0)
    }

    /// Detach a tag from a part.
    ///
    /// Returns `true` if the pair was associated, `false` otherwise.
    #[instrument(skip(self))]
    pub async fn delete_association(&self, association: &ExpensePartAndTagAssociation) -> Result<bool> {
        let row = AssociationRow::from(association);
        let result = sqlx::query(include_str!("../queries/delete_association.sql"))
            .bind(row.expense_part_id)
            .bind(row.tag_id)
            .execute(&self.pool)
            .await
            .or_raise_db()?;
        Ok(result.rows_affected() > 0)
    }
}
