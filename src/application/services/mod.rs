//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (NodeStore) but are themselves
//! concrete structs, not traits.

mod config;

pub use config::ConfigService;
