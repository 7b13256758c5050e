use crate::value::PerformerId;

#[derive(Debug, Clone, PartialEq)]
pub struct Performer {
    pub id: PerformerId,
    pub name: String,
}

impl Performer {
    pub fn new(id: PerformerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Optional predicates for listing performers. Empty fields are ignored.
#[derive(Debug, Clone, Default)]
pub struct PerformerFilter {
    pub ids: Vec<PerformerId>,
    pub name: Option<String>,
    /// Only performers whose id is strictly greater than this cursor.
    pub from_id: Option<PerformerId>,
}
