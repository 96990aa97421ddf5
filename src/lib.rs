//! snaplink: a URL shortener with owner-scoped mappings and click accounting.

pub mod auth;
pub mod error;
pub mod generator;
pub mod handler;
pub mod model;
pub mod route;
pub mod service;
pub mod store;
