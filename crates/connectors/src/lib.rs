pub mod adapter;
pub mod error;
pub mod extract;
pub mod sql;
