pub mod group_service;
pub mod jwt_service;
pub mod opening_hours_service;
pub mod organization_service;
pub mod user_service;
