pub mod auth;
pub mod generation;
pub mod integration;
pub mod project;
