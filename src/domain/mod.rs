pub mod opening_hours;
pub mod organization;
