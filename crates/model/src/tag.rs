use derive_more::{Display, From};

/// Identity of a [`Tag`].
#[derive(Debug, Display, From, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(transparent))]
pub struct TagId(pub i64);

/// A free-form label (e.g. "Pet", "Hobby") that can be attached to any number
/// of expense parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tag {
    pub id: Option<TagId>,
    pub name: String,
}
impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self { id: None, name: name.into() }
    }

    pub fn with_id(mut self, id: impl Into<TagId>) -> Self {
        self.id = Some(id.into());
        self
    }
}
