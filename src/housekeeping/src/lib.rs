//! Retention housekeeping for inventory history data.
//!
//! A pass scans the inventory stores of a site, pairs each host's archived
//! trees with their delta caches, applies the host's retention policy and
//! deletes what expired. Data of hosts that no longer exist is removed once it
//! is older than the abandoned file age.
//!
//! ```no_run
//! use common::Configuration;
//!
//! let config = Configuration::load()?;
//! let hosts = common::hosts::collect_host_names(&config.hosts);
//! let report = housekeeping::run(&config, &hosts, chrono::Utc::now().timestamp())?;
//! report.log();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod classifier;
pub mod error;
pub mod fs;
pub mod history;
pub mod orchestrator;
pub mod report;
pub mod retention;

pub use error::{HousekeepingError, Result};
pub use orchestrator::{Deleter, Housekeeping, run};
pub use report::HousekeepingReport;
