pub mod filter;
pub mod template;
