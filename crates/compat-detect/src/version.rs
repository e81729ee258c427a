//! Framework versions and version ranges

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declared version of the persistence framework
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FrameworkVersion {
    /// Major component
    pub major: u32,
    /// Minor component
    pub minor: u32,
    /// Patch component
    pub patch: u32,
}

impl FrameworkVersion {
    /// Create version from components
    #[inline]
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for FrameworkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Errors parsing a version string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionParseError {
    /// Empty input
    #[error("empty version string")]
    Empty,

    /// A component did not start with a digit
    #[error("invalid version component '{component}' in '{input}'")]
    InvalidComponent {
        /// Offending component
        component: String,
        /// Full input
        input: String,
    },

    /// More than major.minor.patch
    #[error("too many version components in '{0}'")]
    TooManyComponents(String),
}

impl FromStr for FrameworkVersion {
    type Err = VersionParseError;

    /// Parse `major[.minor[.patch]]`
    ///
    /// Missing components default to 0. Only the leading digits of each
    /// component are read, so pre-release tags such as `1.5a1` parse as
    /// `1.5.0`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err(VersionParseError::Empty);
        }

        let mut parts = [0u32; 3];
        for (i, component) in input.split('.').enumerate() {
            if i >= parts.len() {
                return Err(VersionParseError::TooManyComponents(input.to_string()));
            }
            let digits: String = component.chars().take_while(char::is_ascii_digit).collect();
            parts[i] = digits
                .parse()
                .map_err(|_| VersionParseError::InvalidComponent {
                    component: component.to_string(),
                    input: input.to_string(),
                })?;
        }

        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

/// Half-open version range: `min` inclusive, `max` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VersionRange {
    /// Lowest matching version
    pub min: Option<FrameworkVersion>,
    /// First version no longer matching
    pub max: Option<FrameworkVersion>,
}

impl VersionRange {
    /// Every version below `max`
    #[inline]
    #[must_use]
    pub const fn below(max: FrameworkVersion) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    /// Every version from `min` upwards
    #[inline]
    #[must_use]
    pub const fn at_least(min: FrameworkVersion) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// Versions in `[min, max)`
    #[inline]
    #[must_use]
    pub const fn between(min: FrameworkVersion, max: FrameworkVersion) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Check whether `version` falls inside the range
    #[must_use]
    pub fn contains(&self, version: FrameworkVersion) -> bool {
        self.min.map_or(true, |min| version >= min) && self.max.map_or(true, |max| version < max)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(min), Some(max)) => write!(f, ">={min}, <{max}"),
            (Some(min), None) => write!(f, ">={min}"),
            (None, Some(max)) => write!(f, "<{max}"),
            (None, None) => write!(f, "*"),
        }
    }
}
