//! Retention rules for inventory history files.
//!
//! - `unit`: the things a policy evaluates (single files and archive bundles)
//! - `policy`: age, count and combined cutoffs
//!
//! ## Usage
//!
//! ```
//! use housekeeping::retention::{RetentionPolicy, RetentionUnit, TimestampedFile};
//! use common::config::PolicyParameters;
//!
//! let policy = RetentionPolicy::from(&PolicyParameters::NumberOfHistoryEntries(1));
//! let units: Vec<RetentionUnit> = [10, 20, 30]
//!     .into_iter()
//!     .map(|ts| TimestampedFile::new(format!("{ts}.json"), ts).into())
//!     .collect();
//!
//! let removable = policy.compute_removable_units(30, &units);
//! assert_eq!(removable.len(), 2);
//! ```

pub mod policy;
pub mod unit;

pub use policy::{CountCutoff, FileAge, RetentionPolicy};
pub use unit::{ArchiveBundle, RetentionUnit, TimestampedFile};
