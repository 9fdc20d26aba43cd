use okane_model::{Tag, TagId};

#[derive(sqlx::FromRow)]
pub(crate) struct TagRow {
    pub(crate) id: Option<i64>,
    pub(crate) name: String,
}
impl From<&Tag> for TagRow {
    fn from(tag: &Tag) -> Self {
        Self {
            id: tag.id.map(|id| id.0),
            name: tag.name.clone(),
        }
    }
}
impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Self {
            id: row.id.map(TagId),
            name: row.name,
        }
    }
}
