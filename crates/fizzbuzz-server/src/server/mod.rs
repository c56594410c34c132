//! Server building blocks: configuration, telemetry, routing and handlers.

pub mod config;
pub mod routes;
pub mod service;
pub mod telemetry;
