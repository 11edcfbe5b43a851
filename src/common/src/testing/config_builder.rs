//! Test configuration builder for creating test setups quickly.

use std::path::Path;

use crate::config::{
    CombinedParameters, Configuration, HostRule, HostSourceConfig, PolicyParameters, Strategy,
};

/// Builder for creating test configurations.
///
/// # Example
///
/// ```rust,ignore
/// use common::testing::TestConfigBuilder;
///
/// let config = TestConfigBuilder::new()
///     .with_omd_root(temp.path())
///     .with_default(Strategy::And, 3600, 10)
///     .with_rule(&["~web.*"], PolicyParameters::FileAge(60))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct TestConfigBuilder {
    config: Configuration,
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestConfigBuilder {
    /// Defaults without a default policy and without hosts.
    pub fn new() -> Self {
        Self {
            config: Configuration::default(),
        }
    }

    pub fn with_omd_root(mut self, omd_root: &Path) -> Self {
        self.config.omd_root = omd_root.to_path_buf();
        self
    }

    /// Set the combined default policy.
    pub fn with_default(
        mut self,
        strategy: Strategy,
        file_age: i64,
        number_of_history_entries: usize,
    ) -> Self {
        self.config.inventory_housekeeping.default = Some(CombinedParameters {
            strategy,
            file_age,
            number_of_history_entries,
        });
        self
    }

    pub fn without_default(mut self) -> Self {
        self.config.inventory_housekeeping.default = None;
        self
    }

    /// Append a per-host rule.
    pub fn with_rule(mut self, match_patterns: &[&str], parameters: PolicyParameters) -> Self {
        self.config.inventory_housekeeping.for_hosts.push(HostRule {
            match_patterns: match_patterns.iter().map(|p| p.to_string()).collect(),
            parameters,
        });
        self
    }

    pub fn with_abandoned_file_age(mut self, seconds: i64) -> Self {
        self.config.inventory_housekeeping.abandoned_file_age = seconds;
        self
    }

    pub fn with_hosts(mut self, names: &[&str]) -> Self {
        self.config.hosts = HostSourceConfig::Static {
            names: names.iter().map(|n| n.to_string()).collect(),
        };
        self
    }

    pub fn with_dry_run(mut self) -> Self {
        self.config.dry_run = true;
        self
    }

    pub fn build(self) -> Configuration {
        self.config
    }
}
