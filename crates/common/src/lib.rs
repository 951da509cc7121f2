//! Common utilities and configuration shared across Fedgate crates.
//!
//! This crate contains the base building blocks for the gateway, including:
//! - **Configuration**: Strongly typed gateway configuration (`config`).
//! - **Telemetry**: Observability setup (`telemetry`).
pub mod config;
pub mod telemetry;
