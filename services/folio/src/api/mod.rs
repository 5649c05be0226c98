//! Portfolio HTTP API module.
//!
//! # Purpose
//! Exposes the route handler modules, grouped by the resource they serve.
pub mod admin;
pub mod discord;
pub mod error;
pub mod openapi;
pub mod projects;
pub mod system;
pub mod types;
pub mod visits;
