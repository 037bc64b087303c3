pub mod client;
pub mod dataset;
