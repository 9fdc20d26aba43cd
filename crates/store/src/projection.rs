//! Assembly of the nested read models.
//!
//! Each level of nesting costs exactly one query, no matter how many parents
//! are requested: the parent ids are bound as a single JSON array and expanded
//! by SQLite's `json_each`. Child rows are then grouped by parent id in memory.
//!
//! Callers pass the connection of an open transaction, so every query sees the
//! same snapshot and an expense is never returned with only some of its parts
//! or tags.

use crate::error::{ErrorKind, Result, SqlxResultExt};
use crate::models::{ExpensePartRow, TaggedRow};
use exn::{OptionExt, ResultExt};
use okane_model::{Expense, ExpenseId, ExpensePart, ExpensePartId, ExpensePartWithTags, ExpenseWithPartsAndTags, Tag};
use sqlx::SqliteConnection;
use std::collections::{HashMap, HashSet};

fn id_list(ids: impl IntoIterator<Item = i64>) -> Result<String> {
    let ids = ids.into_iter().collect::<Vec<_>>();
    serde_json::to_string(&ids).or_raise(|| ErrorKind::InvalidData("id list"))
}

fn persisted_part_id(part: &ExpensePart) -> Result<ExpensePartId> {
    part.id.ok_or_raise(|| ErrorKind::InvalidData("expense part id"))
}

fn persisted_expense_id(expense: &Expense) -> Result<ExpenseId> {
    expense.id.ok_or_raise(|| ErrorKind::InvalidData("expense id"))
}

/// Attach tags to each part. Parts without tags get an empty set.
pub(crate) async fn with_tags(conn: &mut SqliteConnection, parts: Vec<ExpensePart>) -> Result<Vec<ExpensePartWithTags>> {
    if parts.is_empty() {
        return Ok(Vec::new());
    }
    let ids = parts.iter().map(persisted_part_id).collect::<Result<Vec<_>>>()?;
    let rows: Vec<TaggedRow> = sqlx::query_as(include_str!("../queries/list_tags_for_parts.sql"))
        .bind(id_list(ids.iter().map(|id| id.0))?)
        .fetch_all(&mut *conn)
        .await
        .or_raise_db()?;
    let mut tags = group_tags_by_part(rows);
    Ok(parts
        .into_iter()
        .zip(ids)
        .map(|(part, id)| ExpensePartWithTags {
            part,
            tags: tags.remove(&id).unwrap_or_default(),
        })
        .collect())
}

/// Attach parts (each with its tags) to each expense. Parts keep id order;
/// expenses without parts get an empty list.
pub(crate) async fn with_parts_and_tags(
    conn: &mut SqliteConnection,
    expenses: Vec<Expense>,
) -> Result<Vec<ExpenseWithPartsAndTags>> {
    if expenses.is_empty() {
        return Ok(Vec::new());
    }
    let ids = expenses.iter().map(persisted_expense_id).collect::<Result<Vec<_>>>()?;
    let rows: Vec<ExpensePartRow> = sqlx::query_as(include_str!("../queries/list_parts_for_expenses.sql"))
        .bind(id_list(ids.iter().map(|id| id.0))?)
        .fetch_all(&mut *conn)
        .await
        .or_raise_db()?;
    let parts = rows.into_iter().map(ExpensePart::from).collect::<Vec<_>>();
    let parts = with_tags(conn, parts).await?;
    let mut parts = group_parts_by_expense(parts);
    Ok(expenses
        .into_iter()
        .zip(ids)
        .map(|(expense, id)| ExpenseWithPartsAndTags {
            expense,
            parts: parts.remove(&id).unwrap_or_default(),
        })
        .collect())
}

fn group_tags_by_part(rows: Vec<TaggedRow>) -> HashMap<ExpensePartId, HashSet<Tag>> {
    let mut map: HashMap<ExpensePartId, HashSet<Tag>> = HashMap::new();
    for row in rows {
        map.entry(row.part_id()).or_default().insert(Tag::from(row.tag));
    }
    map
}

fn group_parts_by_expense(parts: Vec<ExpensePartWithTags>) -> HashMap<ExpenseId, Vec<ExpensePartWithTags>> {
    let mut map: HashMap<ExpenseId, Vec<ExpensePartWithTags>> = HashMap::new();
    for part in parts {
        map.entry(part.part.expense_id).or_default().push(part);
    }
    map
}
