pub mod config;
pub mod data_type;
pub mod source;
