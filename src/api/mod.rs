pub mod auth;
pub mod deserializers;
pub mod health;
pub mod openapi;
pub mod organization;
