pub mod hazard;
pub mod search;
pub mod weather;
