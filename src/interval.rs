pub mod date_tz;
pub mod window;
