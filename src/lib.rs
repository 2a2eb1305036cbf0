//! Face swap relay
//!
//! Accepts face swap and generate-then-swap requests, runs them in the
//! background against an external vision service and an image generation
//! API, and reports each result to a webhook callback.

pub mod app_state;
pub mod config;
pub mod models;
pub mod routes;
pub mod services;
