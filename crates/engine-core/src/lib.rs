pub mod activation;
pub mod retry;
