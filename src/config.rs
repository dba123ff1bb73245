//! Analysis settings: a TOML file, then command-line overrides.
//!
//! ```toml
//! home = "3:12"
//! enemy = "6:7"
//! unique_window = 5
//! fallback_home = "1:1"
//! noise_patterns = ["(?i)^monarch"]
//! ```

use std::fs;
use std::path::Path;

use news_types::KingdomKey;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{NewsError, Result};
use crate::kingdom::default_home;

pub const DEFAULT_UNIQUE_WINDOW: f64 = 5.0;
/// Shown next to the configured window when no others are asked for.
pub const ALTERNATE_UNIQUE_WINDOW: f64 = 10.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Home kingdom; inferred from the news when absent
    pub home: Option<KingdomKey>,
    /// Counterpart kingdom; inferred when absent
    pub enemy: Option<KingdomKey>,
    /// Game days between hits that still count as one unique attack
    pub unique_window: f64,
    pub fallback_home: KingdomKey,
    /// Extra regexes for ledger names that are not real provinces
    pub noise_patterns: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            home: None,
            enemy: None,
            unique_window: DEFAULT_UNIQUE_WINDOW,
            fallback_home: default_home(),
            noise_patterns: Vec::new(),
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub home: Option<KingdomKey>,
    pub enemy: Option<KingdomKey>,
    pub unique_window: Option<f64>,
}

impl AnalysisConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AnalysisConfig = toml::from_str(&contents).map_err(|source| NewsError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(?path, "loaded config");
        Ok(config)
    }

    /// File config when a path is given, defaults otherwise, with
    /// overrides applied on top.
    pub fn resolve(path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        config.apply(overrides);
        config.noise_regexes()?;
        Ok(config)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if overrides.home.is_some() {
            self.home = overrides.home;
        }
        if overrides.enemy.is_some() {
            self.enemy = overrides.enemy;
        }
        if let Some(window) = overrides.unique_window {
            self.unique_window = window;
        }
    }

    /// Windows for a side-by-side uniques comparison: the configured
    /// window first, then `extra` without repeats. With no `extra`,
    /// [`ALTERNATE_UNIQUE_WINDOW`] is added.
    pub fn compare_windows(&self, extra: &[f64]) -> Vec<f64> {
        let extra = if extra.is_empty() {
            &[ALTERNATE_UNIQUE_WINDOW][..]
        } else {
            extra
        };
        let mut windows = vec![self.unique_window];
        for &w in extra {
            if !windows.contains(&w) {
                windows.push(w);
            }
        }
        windows
    }

    pub fn noise_regexes(&self) -> Result<Vec<Regex>> {
        self.noise_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|source| NewsError::Pattern {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect()
    }
}

/// clap value parser for `N:M` arguments.
pub fn parse_kingdom_arg(s: &str) -> Result<KingdomKey> {
    KingdomKey::parse(s).ok_or_else(|| NewsError::InvalidKingdom(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = AnalysisConfig::default();
        assert_eq!(c.unique_window, 5.0);
        assert_eq!(c.fallback_home.as_str(), "1:1");
        assert!(c.home.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let c: AnalysisConfig = toml::from_str("home = \"3:12\"\nunique_window = 10").unwrap();
        assert_eq!(c.home, KingdomKey::parse("3:12"));
        assert_eq!(c.unique_window, 10.0);
        assert_eq!(c.fallback_home.as_str(), "1:1");
        assert!(c.noise_patterns.is_empty());
    }

    #[test]
    fn test_bad_kingdom_in_toml_is_rejected() {
        assert!(toml::from_str::<AnalysisConfig>("home = \"nope\"").is_err());
    }

    #[test]
    fn test_overrides_win() {
        let mut c: AnalysisConfig = toml::from_str("home = \"3:12\"\nenemy = \"6:7\"").unwrap();
        c.apply(Overrides {
            home: KingdomKey::parse("9:9"),
            enemy: None,
            unique_window: Some(10.0),
        });
        assert_eq!(c.home, KingdomKey::parse("9:9"));
        assert_eq!(c.enemy, KingdomKey::parse("6:7"));
        assert_eq!(c.unique_window, 10.0);
    }

    #[test]
    fn test_compare_windows_lead_with_configured_window() {
        let mut c = AnalysisConfig::default();
        assert_eq!(c.compare_windows(&[]), vec![5.0, 10.0]);
        c.apply(Overrides {
            unique_window: Some(7.0),
            ..Overrides::default()
        });
        assert_eq!(c.compare_windows(&[]), vec![7.0, 10.0]);
        assert_eq!(c.compare_windows(&[3.0, 7.0, 3.0]), vec![7.0, 3.0]);

        c.unique_window = 10.0;
        assert_eq!(c.compare_windows(&[]), vec![10.0]);
    }

    #[test]
    fn test_invalid_noise_pattern_is_an_error() {
        let c = AnalysisConfig {
            noise_patterns: vec!["(".into()],
            ..AnalysisConfig::default()
        };
        assert!(matches!(c.noise_regexes(), Err(NewsError::Pattern { .. })));
    }

    #[test]
    fn test_parse_kingdom_arg() {
        assert!(parse_kingdom_arg("3:12").is_ok());
        assert!(matches!(parse_kingdom_arg("3-12"), Err(NewsError::InvalidKingdom(_))));
    }
}
