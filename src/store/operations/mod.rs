pub mod items;
pub mod reviews;
