//! Shared building blocks of the inventory housekeeping tools.
//!
//! - `config`: figment-based configuration with retention rules
//! - `paths`: layout of the inventory stores below a site root
//! - `hosts`: host name enumeration and rule pattern matching
//! - `cli`: arguments and helpers shared by binaries

pub mod cli;
pub mod config;
pub mod hosts;
pub mod paths;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{Configuration, ConfigError};
pub use paths::{InventoryPaths, TreePath};
