pub mod date_range;
pub mod platform;
pub mod record;
pub mod request_params;
