use crate::error::DomainError;
use chrono::{DateTime, Datelike, Utc};
use std::fmt::{self, Display};
use std::str::FromStr;

// Helper macro to define entity ID newtypes and common trait impls
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(i64);

        impl $name {
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|_| DomainError::InvalidId(s.to_string()))
            }
        }
    };
}

define_id!(PerformerId);
define_id!(MediaItemId);

/// Calendar month a play is accounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayPeriod {
    month: u8,
    year: u32,
}

impl PlayPeriod {
    pub const MAX_YEAR: u32 = 9999;

    pub fn new(month: u32, year: u32) -> Result<Self, DomainError> {
        if !(1..=12).contains(&month) || year == 0 || year > Self::MAX_YEAR {
            return Err(DomainError::InvalidPeriod { month, year });
        }
        Ok(Self {
            month: month as u8,
            year,
        })
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self {
            month: at.month() as u8,
            year: at.year().clamp(1, Self::MAX_YEAR as i32) as u32,
        }
    }

    pub fn current() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn year(&self) -> u32 {
        self.year
    }
}

impl Display for PlayPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Identifies one recorded play: which item, whose aggregate, which month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayKey {
    pub media_item_id: MediaItemId,
    pub performer_id: PerformerId,
    pub period: PlayPeriod,
}

impl PlayKey {
    pub fn new(media_item_id: MediaItemId, performer_id: PerformerId, period: PlayPeriod) -> Self {
        Self {
            media_item_id,
            performer_id,
            period,
        }
    }
}
