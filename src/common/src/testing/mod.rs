//! Test utilities for inventory housekeeping.
//!
//! This module is only available when the `testing` feature is enabled or during tests:
//!
//! ```toml
//! [dev-dependencies]
//! common = { path = "../common", features = ["testing"] }
//! ```

mod config_builder;
mod site;

pub use config_builder::TestConfigBuilder;
pub use site::TestSite;
