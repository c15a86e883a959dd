pub mod api;
pub mod constants;
pub mod domain;
pub mod handler;
pub mod repository;
pub mod services;
pub mod views;

#[cfg(test)]
pub mod test_support;

pub use repository::*;
pub use services::*;
