pub mod merge;
pub mod series;
