pub mod exercise;
pub mod import;
pub mod workout;
