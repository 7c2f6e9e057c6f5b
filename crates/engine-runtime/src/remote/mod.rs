pub mod client;
pub mod delivery;
pub mod period;
