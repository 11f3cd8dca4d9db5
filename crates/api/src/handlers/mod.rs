pub mod catalog;
pub mod draw;
