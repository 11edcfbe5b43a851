//! Host name enumeration and rule matching.

use std::collections::HashSet;
use std::process::Command;

use regex::Regex;

use crate::config::{ConfigError, HostSourceConfig};

#[derive(Debug, Clone)]
enum Pattern {
    Explicit(String),
    Regex(Regex),
}

/// Compiled `match_patterns` of a host rule.
///
/// A pattern starting with `~` is a regular expression matched against the
/// beginning of the host name, every other pattern must equal the host name.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    patterns: Vec<Pattern>,
}

impl HostMatcher {
    pub fn new(match_patterns: &[String]) -> Result<Self, ConfigError> {
        let patterns = match_patterns
            .iter()
            .map(|raw| match raw.strip_prefix('~') {
                Some(expr) => Regex::new(&format!("^(?:{expr})"))
                    .map(Pattern::Regex)
                    .map_err(|source| ConfigError::InvalidHostPattern {
                        pattern: raw.clone(),
                        source,
                    }),
                None => Ok(Pattern::Explicit(raw.clone())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    pub fn matches(&self, host_name: &str) -> bool {
        self.patterns.iter().any(|pattern| match pattern {
            Pattern::Explicit(name) => name == host_name,
            Pattern::Regex(regex) => regex.is_match(host_name),
        })
    }
}

/// Collect the currently known host names.
///
/// Failing to read the list is not fatal: the problem is logged and an empty
/// list returned, so only abandoned data gets cleaned up.
pub fn collect_host_names(source: &HostSourceConfig) -> Vec<String> {
    let names = match source {
        HostSourceConfig::Static { names } => names.clone(),
        HostSourceConfig::File { path } => match std::fs::read_to_string(path) {
            Ok(content) => parse_host_list(&content),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to read host list, continuing without hosts"
                );
                Vec::new()
            }
        },
        HostSourceConfig::Command { program, args } => {
            match Command::new(program).args(args).output() {
                Ok(output) if output.status.success() => {
                    parse_host_list(&String::from_utf8_lossy(&output.stdout))
                }
                Ok(output) => {
                    tracing::warn!(
                        program = %program,
                        status = %output.status,
                        stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                        "Host listing command failed, continuing without hosts"
                    );
                    Vec::new()
                }
                Err(e) => {
                    tracing::warn!(
                        program = %program,
                        error = %e,
                        "Failed to run host listing command, continuing without hosts"
                    );
                    Vec::new()
                }
            }
        }
    };

    dedup(names)
}

fn parse_host_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

fn dedup(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| !name.is_empty() && seen.insert(name.clone()))
        .collect()
}
