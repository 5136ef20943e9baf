pub mod listing;
pub mod mortgage;
pub mod returns;
