pub mod error;
pub mod id;
pub mod media_item;
pub mod monthly_plays;
pub mod performer;
pub mod value;

pub use error::DomainError;
