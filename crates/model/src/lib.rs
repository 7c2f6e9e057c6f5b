pub mod core;
pub mod pagination;
pub mod period;
pub mod records;
