pub mod forecast_file;
