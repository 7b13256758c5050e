pub mod media_item;
pub mod monthly_plays;
pub mod performer;
