use crate::value::{PerformerId, PlayPeriod};

/// Running total of plays for one performer in one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyPlays {
    pub owner_id: PerformerId,
    pub period: PlayPeriod,
    pub total_plays: i64,
}
