use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("invalid play period: month {month}, year {year}")]
    InvalidPeriod { month: u32, year: u32 },
    #[error("invalid identifier: {0}")]
    InvalidId(String),
    #[error("id generation failed: {0}")]
    IdGeneration(String),
}
