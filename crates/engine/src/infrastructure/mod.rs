//! Infrastructure - ports, adapters, and ambient services.

pub mod clock;
pub mod config;
pub mod persistence;
pub mod ports;
