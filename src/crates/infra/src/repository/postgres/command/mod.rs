pub mod media_item;
pub mod performer;
pub mod play;
