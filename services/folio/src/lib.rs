//! Portfolio data service library crate.
//!
//! # Purpose
//! Serves a portfolio front-end with project data scraped from the upstream
//! art-hosting site through a headless browser, memoized in disk-backed JSON
//! caches and kept fresh by a background refresher. Also relays contact-form
//! messages and records page loads.
//!
//! # Notes
//! The binary and the integration tests share this crate; `main` only reads
//! configuration and wires the concrete browser, relay and visit log.
pub mod api;
pub mod app;
pub mod config;
pub mod model;
pub mod observability;
pub mod relay;
pub mod resolver;
pub mod scheduler;
pub mod scrape;
pub mod store;
pub mod visits;
