use crate::value::{MediaItemId, PerformerId};

#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    pub id: MediaItemId,
    pub title: String,
    pub owner_id: PerformerId,
    pub play_count: i64,
}

impl MediaItem {
    /// A freshly published item has never been played.
    pub fn new(id: MediaItemId, title: impl Into<String>, owner_id: PerformerId) -> Self {
        Self {
            id,
            title: title.into(),
            owner_id,
            play_count: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MediaItemFilter {
    pub ids: Vec<MediaItemId>,
    pub title: Option<String>,
    pub from_id: Option<MediaItemId>,
}
