pub mod catalog;
pub mod job;
pub mod page;
pub mod status;
