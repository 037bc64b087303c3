pub mod elia;
pub mod hf;
pub mod prod_db;
pub mod renewables;
pub mod series_store;
